use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::order::{BookingTerm, Order, OrderDetails, OrderStatus, StatusChange};
use crate::repository::{OrderRepository, UserRepository};
use crate::user::Caller;

/// A booking request as submitted by the caller. `used_points` is the
/// optional redemption against the loyalty balance.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub kost_id: Uuid,
    pub duration: BookingTerm,
    pub total_price: i64,
    #[serde(default)]
    pub used_points: i64,
}

/// Owns the booking lifecycle and the points transfers attached to it.
///
/// Debit-on-create and credit-on-confirm are the only two operations
/// that touch a balance; each is a single transaction in the backing
/// repository so a crash between the two writes cannot leave a stale
/// balance behind.
pub struct Ledger {
    users: Arc<dyn UserRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl Ledger {
    pub fn new(users: Arc<dyn UserRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { users, orders }
    }

    /// Create a `pending` order, debiting any redeemed points from the
    /// caller's balance in the same transaction.
    pub async fn create_booking(
        &self,
        caller: &Caller,
        req: CreateBookingRequest,
    ) -> Result<Order, DomainError> {
        if req.total_price <= 0 {
            return Err(DomainError::Validation(
                "total_price must be positive".into(),
            ));
        }
        if req.used_points < 0 {
            return Err(DomainError::Validation(
                "used_points must not be negative".into(),
            ));
        }

        let user = self
            .users
            .find(caller.user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", caller.user_id)))?;

        if req.used_points > user.points {
            return Err(DomainError::InsufficientPoints {
                requested: req.used_points,
                available: user.points,
            });
        }

        let order = Order::new(caller.user_id, req.kost_id, req.duration, req.total_price);
        let created = self.orders.create_with_debit(&order, req.used_points).await?;

        info!(
            order_id = %created.id,
            user_id = %caller.user_id,
            used_points = req.used_points,
            "booking created"
        );
        Ok(created)
    }

    /// A user's own orders, or every order for an admin, each enriched
    /// with the owner's username and the kost's name.
    pub async fn list_bookings(&self, caller: &Caller) -> Result<Vec<OrderDetails>, DomainError> {
        let owner = if caller.is_admin() {
            None
        } else {
            Some(caller.user_id)
        };
        self.orders.list_with_details(owner).await
    }

    /// Store an uploaded payment-proof reference on an order the caller
    /// owns. Re-invocation overwrites the previous reference.
    pub async fn attach_payment_proof(
        &self,
        caller: &Caller,
        order_id: Uuid,
        proof_path: &str,
    ) -> Result<Order, DomainError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("order {order_id}")))?;

        if order.user_id != caller.user_id {
            return Err(DomainError::Forbidden(
                "payment proof can only be attached to your own orders".into(),
            ));
        }

        self.orders.set_payment_proof(order_id, proof_path).await
    }

    /// Administrative status transition. Entering `confirmed` credits
    /// `floor(total_price * 0.10)` to the owner, exactly once per
    /// transition into that state.
    pub async fn update_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<StatusChange, DomainError> {
        if !caller.is_admin() {
            return Err(DomainError::Forbidden(
                "only admins can change order status".into(),
            ));
        }

        let change = self.orders.set_status(order_id, status).await?;
        if let Some(points) = change.points_awarded {
            info!(order_id = %order_id, points_awarded = points, "order confirmed");
        }
        Ok(change)
    }

    /// The caller's current points balance.
    pub async fn points_balance(&self, caller: &Caller) -> Result<i64, DomainError> {
        let user = self
            .users
            .find(caller.user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", caller.user_id)))?;
        Ok(user.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryKostRepository, InMemoryOrderRepository, InMemoryUserRepository};
    use crate::repository::{KostRepository, UserRepository};
    use crate::user::{Role, User};

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        kosts: Arc<InMemoryKostRepository>,
        ledger: Ledger,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let kosts = Arc::new(InMemoryKostRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new(users.clone(), kosts.clone()));
        let ledger = Ledger::new(users.clone(), orders);
        Fixture {
            users,
            kosts,
            ledger,
        }
    }

    async fn seed_user(fx: &Fixture, points: i64, role: Role) -> Caller {
        let mut user = User::new(
            format!("user-{}", Uuid::new_v4()),
            format!("{}@example.com", Uuid::new_v4()),
            "hash".into(),
            role,
        );
        user.points = points;
        let created = fx.users.create(&user).await.unwrap();
        Caller {
            user_id: created.id,
            role,
        }
    }

    async fn seed_kost(fx: &Fixture) -> Uuid {
        let kost = crate::memory::tests_support::sample_kost("Bandung", "Putri", 750_000);
        fx.kosts.create(&kost).await.unwrap().id
    }

    fn booking(kost_id: Uuid, total_price: i64, used_points: i64) -> CreateBookingRequest {
        CreateBookingRequest {
            kost_id,
            duration: BookingTerm::OneMonth,
            total_price,
            used_points,
        }
    }

    #[tokio::test]
    async fn test_booking_with_excess_points_fails_and_keeps_balance() {
        let fx = fixture();
        let caller = seed_user(&fx, 100, Role::User).await;
        let kost_id = seed_kost(&fx).await;

        let err = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 500_000, 200))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientPoints {
                requested: 200,
                available: 100,
            }
        ));
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_booking_debits_points_and_starts_pending() {
        let fx = fixture();
        let caller = seed_user(&fx, 500, Role::User).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 750_000, 200))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_confirm_awards_ten_percent() {
        let fx = fixture();
        let caller = seed_user(&fx, 500, Role::User).await;
        let admin = seed_user(&fx, 0, Role::Admin).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 1_000_000, 200))
            .await
            .unwrap();
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 300);

        let change = fx
            .ledger
            .update_status(&admin, order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(change.points_awarded, Some(100_000));
        assert_eq!(change.order.status, OrderStatus::Confirmed);
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 100_300);
    }

    #[tokio::test]
    async fn test_non_confirm_transition_leaves_points_alone() {
        let fx = fixture();
        let caller = seed_user(&fx, 0, Role::User).await;
        let admin = seed_user(&fx, 0, Role::Admin).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 1_000_000, 0))
            .await
            .unwrap();
        let change = fx
            .ledger
            .update_status(&admin, order.id, OrderStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(change.points_awarded, None);
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconfirmation_does_not_reaward() {
        let fx = fixture();
        let caller = seed_user(&fx, 0, Role::User).await;
        let admin = seed_user(&fx, 0, Role::Admin).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 1_000_000, 0))
            .await
            .unwrap();

        let first = fx
            .ledger
            .update_status(&admin, order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(first.points_awarded, Some(100_000));

        let second = fx
            .ledger
            .update_status(&admin, order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(second.points_awarded, None);
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 100_000);

        // Bouncing through another status and back re-arms the credit.
        fx.ledger
            .update_status(&admin, order.id, OrderStatus::Pending)
            .await
            .unwrap();
        let third = fx
            .ledger
            .update_status(&admin, order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(third.points_awarded, Some(100_000));
        assert_eq!(fx.ledger.points_balance(&caller).await.unwrap(), 200_000);
    }

    #[tokio::test]
    async fn test_status_update_requires_admin() {
        let fx = fixture();
        let caller = seed_user(&fx, 0, Role::User).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&caller, booking(kost_id, 1_000_000, 0))
            .await
            .unwrap();
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
        ] {
            let err = fx
                .ledger
                .update_status(&caller, order.id, status)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn test_payment_proof_ownership_and_overwrite() {
        let fx = fixture();
        let owner = seed_user(&fx, 0, Role::User).await;
        let stranger = seed_user(&fx, 0, Role::User).await;
        let kost_id = seed_kost(&fx).await;

        let order = fx
            .ledger
            .create_booking(&owner, booking(kost_id, 750_000, 0))
            .await
            .unwrap();

        let err = fx
            .ledger
            .attach_payment_proof(&stranger, order.id, "uploads/proof-1.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let updated = fx
            .ledger
            .attach_payment_proof(&owner, order.id, "uploads/proof-1.jpg")
            .await
            .unwrap();
        assert_eq!(updated.payment_proof.as_deref(), Some("uploads/proof-1.jpg"));

        let overwritten = fx
            .ledger
            .attach_payment_proof(&owner, order.id, "uploads/proof-2.jpg")
            .await
            .unwrap();
        assert_eq!(
            overwritten.payment_proof.as_deref(),
            Some("uploads/proof-2.jpg")
        );
    }

    #[tokio::test]
    async fn test_list_bookings_scopes_by_role() {
        let fx = fixture();
        let alice = seed_user(&fx, 0, Role::User).await;
        let bob = seed_user(&fx, 0, Role::User).await;
        let admin = seed_user(&fx, 0, Role::Admin).await;
        let kost_id = seed_kost(&fx).await;

        fx.ledger
            .create_booking(&alice, booking(kost_id, 750_000, 0))
            .await
            .unwrap();
        fx.ledger
            .create_booking(&bob, booking(kost_id, 750_000, 0))
            .await
            .unwrap();

        let mine = fx.ledger.list_bookings(&alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order.user_id, alice.user_id);
        assert_eq!(mine[0].kost_name, "Kost Mawar");

        let all = fx.ledger.list_bookings(&admin).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_points_balance_for_missing_user_is_not_found() {
        let fx = fixture();
        let ghost = Caller {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        let err = fx.ledger.points_balance(&ghost).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
