use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use kost_domain::error::DomainError;
use kost_domain::order::{confirmation_award, Order, OrderDetails, OrderStatus, StatusChange};
use kost_domain::repository::OrderRepository;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    kost_id: Uuid,
    duration: String,
    total_price: i64,
    status: String,
    payment_proof: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            kost_id: self.kost_id,
            duration: self.duration.parse().map_err(DomainError::storage)?,
            total_price: self.total_price,
            status: self.status.parse().map_err(DomainError::storage)?,
            payment_proof: self.payment_proof,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, kost_id, duration, total_price, status, \
                            payment_proof, created_at, updated_at FROM orders";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_with_debit(
        &self,
        order: &Order,
        used_points: i64,
    ) -> Result<Order, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        if used_points > 0 {
            // Read-modify-write under the row lock so a concurrent booking
            // for the same user cannot overdraw the balance.
            let balance: i64 =
                sqlx::query("SELECT points FROM users WHERE id = $1 FOR UPDATE")
                    .bind(order.user_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(DomainError::storage)?
                    .ok_or_else(|| DomainError::NotFound(format!("user {}", order.user_id)))?
                    .get("points");

            if used_points > balance {
                return Err(DomainError::InsufficientPoints {
                    requested: used_points,
                    available: balance,
                });
            }

            sqlx::query("UPDATE users SET points = points - $1, updated_at = NOW() WHERE id = $2")
                .bind(used_points)
                .bind(order.user_id)
                .execute(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        }

        sqlx::query(
            "INSERT INTO orders (id, user_id, kost_id, duration, total_price, status, \
             payment_proof, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.kost_id)
        .bind(order.duration.to_string())
        .bind(order.total_price)
        .bind(order.status.to_string())
        .bind(&order.payment_proof)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DomainError::storage)?;

        tx.commit().await.map_err(DomainError::storage)?;
        Ok(order.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn list_with_details(
        &self,
        owner: Option<Uuid>,
    ) -> Result<Vec<OrderDetails>, DomainError> {
        let base = "SELECT o.id, o.user_id, o.kost_id, o.duration, o.total_price, o.status, \
                    o.payment_proof, o.created_at, o.updated_at, u.username, k.name AS kost_name \
                    FROM orders o \
                    JOIN users u ON u.id = o.user_id \
                    JOIN kosts k ON k.id = o.kost_id";

        let rows = match owner {
            Some(user_id) => {
                sqlx::query(&format!(
                    "{base} WHERE o.user_id = $1 ORDER BY o.created_at DESC"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{base} ORDER BY o.created_at DESC"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DomainError::storage)?;

        rows.into_iter()
            .map(|row| {
                let order = OrderRow {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    kost_id: row.get("kost_id"),
                    duration: row.get("duration"),
                    total_price: row.get("total_price"),
                    status: row.get("status"),
                    payment_proof: row.get("payment_proof"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
                .into_order()?;
                Ok(OrderDetails {
                    order,
                    username: row.get("username"),
                    kost_name: row.get("kost_name"),
                })
            })
            .collect()
    }

    async fn set_payment_proof(&self, id: Uuid, path: &str) -> Result<Order, DomainError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET payment_proof = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING id, user_id, kost_id, duration, total_price, status, payment_proof, \
             created_at, updated_at",
        )
        .bind(path)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or_else(|| DomainError::NotFound(format!("order {id}")))?;

        row.into_order()
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<StatusChange, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        // Lock the order row so the previous status read and the credit
        // cannot race with a concurrent transition.
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound(format!("order {id}")))?;

        let previous: OrderStatus = row.status.parse().map_err(DomainError::storage)?;

        let updated = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING id, user_id, kost_id, duration, total_price, status, payment_proof, \
             created_at, updated_at",
        )
        .bind(status.to_string())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DomainError::storage)?;
        let order = updated.into_order()?;

        // The credit fires only on entry into `confirmed`; direct
        // re-confirmation never re-awards.
        let points_awarded =
            if status == OrderStatus::Confirmed && previous != OrderStatus::Confirmed {
                let award = confirmation_award(order.total_price);
                sqlx::query(
                    "UPDATE users SET points = points + $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(award)
                .bind(order.user_id)
                .execute(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
                Some(award)
            } else {
                None
            };

        tx.commit().await.map_err(DomainError::storage)?;

        Ok(StatusChange {
            order,
            points_awarded,
        })
    }

    async fn has_confirmed(&self, user_id: Uuid, kost_id: Uuid) -> Result<bool, DomainError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = $1 AND kost_id = $2 \
             AND status = 'confirmed') AS found",
        )
        .bind(user_id)
        .bind(kost_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.get("found"))
    }
}
