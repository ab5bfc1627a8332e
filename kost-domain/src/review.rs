use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::repository::{OrderRepository, ReviewRepository};
use crate::user::Caller;

/// A rating plus optional comment, linked to exactly one user and one
/// kost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kost_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: Uuid, kost_id: Uuid, rating: i32, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kost_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Gates review creation on a confirmed order for the (caller, kost)
/// pair. Pure existence check plus insert, no state transition.
pub struct ReviewGate {
    orders: Arc<dyn OrderRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewGate {
    pub fn new(orders: Arc<dyn OrderRepository>, reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { orders, reviews }
    }

    pub async fn create_review(
        &self,
        caller: &Caller,
        kost_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        if !self.orders.has_confirmed(caller.user_id, kost_id).await? {
            return Err(DomainError::Forbidden(
                "reviews require a confirmed order for this kost".into(),
            ));
        }

        let review = Review::new(caller.user_id, kost_id, rating, comment);
        self.reviews.create(&review).await
    }

    pub async fn list_for_kost(&self, kost_id: Uuid) -> Result<Vec<Review>, DomainError> {
        self.reviews.list_for_kost(kost_id).await
    }
}
