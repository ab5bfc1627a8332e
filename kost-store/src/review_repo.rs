use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kost_domain::error::DomainError;
use kost_domain::repository::ReviewRepository;
use kost_domain::review::Review;

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    kost_id: Uuid,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            user_id: row.user_id,
            kost_id: row.kost_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review, DomainError> {
        sqlx::query(
            "INSERT INTO reviews (id, user_id, kost_id, rating, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.kost_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(review.clone())
    }

    async fn list_for_kost(&self, kost_id: Uuid) -> Result<Vec<Review>, DomainError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, kost_id, rating, comment, created_at FROM reviews \
             WHERE kost_id = $1 ORDER BY created_at DESC",
        )
        .bind(kost_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
