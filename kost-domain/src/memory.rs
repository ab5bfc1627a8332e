//! In-memory repository implementations backed by `HashMap`s.
//!
//! These back the domain and api test suites and double as a storage
//! layer for local experimentation without Postgres. The compound
//! operations hold the map locks for their whole duration, mirroring
//! the transaction boundaries of the Postgres repositories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DomainError;
use crate::listing::{Kost, SearchFilters, Suggestions};
use crate::order::{confirmation_award, Order, OrderDetails, OrderStatus, StatusChange};
use crate::repository::{KostRepository, OrderRepository, ReviewRepository, UserRepository};
use crate::review::Review;
use crate::user::{Role, User};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DomainError::Validation(
                "username or email already taken".into(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_login(
        &self,
        username: &str,
        role: Role,
    ) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username && u.role == role)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != id && (u.username == username || u.email == email))
        {
            return Err(DomainError::Validation(
                "username or email already taken".into(),
            ));
        }
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))?;
        user.username = username.to_string();
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryKostRepository {
    kosts: RwLock<HashMap<Uuid, Kost>>,
}

impl InMemoryKostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KostRepository for InMemoryKostRepository {
    async fn create(&self, kost: &Kost) -> Result<Kost, DomainError> {
        self.kosts.write().await.insert(kost.id, kost.clone());
        Ok(kost.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Kost>, DomainError> {
        Ok(self.kosts.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Kost>, DomainError> {
        let mut all: Vec<Kost> = self.kosts.read().await.values().cloned().collect();
        all.sort_by_key(|k| k.created_at);
        Ok(all)
    }

    async fn update(&self, id: Uuid, kost: &Kost) -> Result<Kost, DomainError> {
        let mut kosts = self.kosts.write().await;
        let existing = kosts
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("kost {id}")))?;
        let mut updated = kost.clone();
        updated.id = id;
        // Photos are attached at creation time and survive field updates.
        updated.photo_main = existing.photo_main.clone();
        updated.photo_outside = existing.photo_outside.clone();
        updated.photo_inside = existing.photo_inside.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.kosts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("kost {id}")))
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Kost>, DomainError> {
        let mut hits: Vec<Kost> = self
            .kosts
            .read()
            .await
            .values()
            .filter(|k| filters.matches(k))
            .cloned()
            .collect();
        hits.sort_by_key(|k| k.created_at);
        Ok(hits)
    }

    async fn suggestions(&self) -> Result<Suggestions, DomainError> {
        let kosts = self.kosts.read().await;
        let mut suggestions = Suggestions::default();
        for kost in kosts.values() {
            if !suggestions.cities.contains(&kost.city) {
                suggestions.cities.push(kost.city.clone());
            }
            if !suggestions.categories.contains(&kost.category) {
                suggestions.categories.push(kost.category.clone());
            }
            if !suggestions.monthly_prices.contains(&kost.price_per_month) {
                suggestions.monthly_prices.push(kost.price_per_month);
            }
        }
        suggestions.cities.sort();
        suggestions.categories.sort();
        suggestions.monthly_prices.sort_unstable();
        Ok(suggestions)
    }
}

pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    users: Arc<InMemoryUserRepository>,
    kosts: Arc<InMemoryKostRepository>,
}

impl InMemoryOrderRepository {
    pub fn new(users: Arc<InMemoryUserRepository>, kosts: Arc<InMemoryKostRepository>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            users,
            kosts,
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_with_debit(
        &self,
        order: &Order,
        used_points: i64,
    ) -> Result<Order, DomainError> {
        // Lock both maps for the whole debit-then-insert sequence.
        let mut users = self.users.users.write().await;
        let mut orders = self.orders.write().await;

        let user = users
            .get_mut(&order.user_id)
            .ok_or_else(|| DomainError::NotFound(format!("user {}", order.user_id)))?;
        if used_points > user.points {
            return Err(DomainError::InsufficientPoints {
                requested: used_points,
                available: user.points,
            });
        }
        if used_points > 0 {
            user.points -= used_points;
            user.updated_at = Utc::now();
        }

        orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_with_details(
        &self,
        owner: Option<Uuid>,
    ) -> Result<Vec<OrderDetails>, DomainError> {
        // Same lock order as the compound mutations: users before orders.
        let users = self.users.users.read().await;
        let orders = self.orders.read().await;
        let kosts = self.kosts.kosts.read().await;

        let mut details: Vec<OrderDetails> = orders
            .values()
            .filter(|o| owner.map_or(true, |id| o.user_id == id))
            .map(|o| OrderDetails {
                order: o.clone(),
                username: users
                    .get(&o.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                kost_name: kosts
                    .get(&o.kost_id)
                    .map(|k| k.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        details.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(details)
    }

    async fn set_payment_proof(&self, id: Uuid, path: &str) -> Result<Order, DomainError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("order {id}")))?;
        order.payment_proof = Some(path.to_string());
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<StatusChange, DomainError> {
        // Both writes under both locks, matching the Postgres transaction.
        let mut users = self.users.users.write().await;
        let mut orders = self.orders.write().await;

        let order = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("order {id}")))?;

        let previous = order.status;
        order.status = status;
        order.updated_at = Utc::now();

        let points_awarded = if status == OrderStatus::Confirmed && previous != OrderStatus::Confirmed
        {
            let award = confirmation_award(order.total_price);
            let user = users
                .get_mut(&order.user_id)
                .ok_or_else(|| DomainError::NotFound(format!("user {}", order.user_id)))?;
            user.points += award;
            user.updated_at = Utc::now();
            Some(award)
        } else {
            None
        };

        Ok(StatusChange {
            order: order.clone(),
            points_awarded,
        })
    }

    async fn has_confirmed(&self, user_id: Uuid, kost_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.orders.read().await.values().any(|o| {
            o.user_id == user_id && o.kost_id == kost_id && o.status == OrderStatus::Confirmed
        }))
    }
}

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review, DomainError> {
        self.reviews.write().await.push(review.clone());
        Ok(review.clone())
    }

    async fn list_for_kost(&self, kost_id: Uuid) -> Result<Vec<Review>, DomainError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.kost_id == kost_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub fn sample_kost(city: &str, category: &str, price: i64) -> Kost {
        let now = Utc::now();
        Kost {
            id: Uuid::new_v4(),
            name: "Kost Mawar".into(),
            room_size: "3x4".into(),
            total_rooms: 10,
            available_rooms: 4,
            price_per_month: price,
            price_per_three_months: price * 3,
            price_per_six_months: price * 6,
            price_per_year: price * 12,
            address: "Jl. Mawar 1".into(),
            city: city.into(),
            province: "Jawa Barat".into(),
            room_facilities: vec!["AC".into()],
            shared_facilities: vec!["Dapur".into()],
            rules: vec!["No smoking".into()],
            category: category.into(),
            photo_main: None,
            photo_outside: None,
            photo_inside: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("budi".into(), "budi@example.com".into(), "h".into(), Role::User);
        repo.create(&user).await.unwrap();

        let dup = User::new("budi".into(), "other@example.com".into(), "h".into(), Role::User);
        assert!(matches!(
            repo.create(&dup).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_profile_update_rejects_taken_username() {
        let repo = InMemoryUserRepository::new();
        let budi = User::new("budi".into(), "budi@example.com".into(), "h".into(), Role::User);
        let sari = User::new("sari".into(), "sari@example.com".into(), "h".into(), Role::User);
        repo.create(&budi).await.unwrap();
        repo.create(&sari).await.unwrap();

        let err = repo
            .update_profile(sari.id, "budi", "sari@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // Keeping your own username is not a collision.
        let updated = repo
            .update_profile(sari.id, "sari", "sari-baru@example.com")
            .await
            .unwrap();
        assert_eq!(updated.email, "sari-baru@example.com");
    }

    #[tokio::test]
    async fn test_set_status_returns_the_stored_order() {
        let users = Arc::new(InMemoryUserRepository::new());
        let kosts = Arc::new(InMemoryKostRepository::new());
        let orders = InMemoryOrderRepository::new(users.clone(), kosts.clone());

        let user = users
            .create(&User::new(
                "budi".into(),
                "budi@example.com".into(),
                "h".into(),
                Role::User,
            ))
            .await
            .unwrap();
        let order = Order::new(
            user.id,
            Uuid::new_v4(),
            crate::order::BookingTerm::OneMonth,
            750_000,
        );
        orders.create_with_debit(&order, 0).await.unwrap();

        let change = orders
            .set_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        let stored = orders.find(order.id).await.unwrap().unwrap();
        assert_eq!(change.order.status, stored.status);
        assert_eq!(change.order.updated_at, stored.updated_at);
    }

    // Bookings and listings take the same locks; mixed concurrent calls
    // must all complete.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_and_listings_make_progress() {
        let users = Arc::new(InMemoryUserRepository::new());
        let kosts = Arc::new(InMemoryKostRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new(users.clone(), kosts.clone()));

        let user = users
            .create(&User::new(
                "budi".into(),
                "budi@example.com".into(),
                "h".into(),
                Role::User,
            ))
            .await
            .unwrap();
        let kost = kosts
            .create(&tests_support::sample_kost("Bandung", "Putri", 750_000))
            .await
            .unwrap();

        let work = async {
            let mut handles = Vec::new();
            for _ in 0..100 {
                let orders_a = orders.clone();
                let order = Order::new(
                    user.id,
                    kost.id,
                    crate::order::BookingTerm::OneMonth,
                    750_000,
                );
                handles.push(tokio::spawn(async move {
                    orders_a.create_with_debit(&order, 0).await.unwrap();
                }));

                let orders_b = orders.clone();
                handles.push(tokio::spawn(async move {
                    orders_b.list_with_details(None).await.unwrap();
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
        };

        tokio::time::timeout(std::time::Duration::from_secs(10), work)
            .await
            .expect("concurrent booking and listing calls deadlocked");
    }

    #[tokio::test]
    async fn test_suggestions_deduplicate() {
        let repo = InMemoryKostRepository::new();
        repo.create(&tests_support::sample_kost("Bandung", "Putri", 500_000))
            .await
            .unwrap();
        repo.create(&tests_support::sample_kost("Bandung", "Putra", 500_000))
            .await
            .unwrap();

        let suggestions = repo.suggestions().await.unwrap();
        assert_eq!(suggestions.cities, vec!["Bandung".to_string()]);
        assert_eq!(suggestions.categories.len(), 2);
        assert_eq!(suggestions.monthly_prices, vec![500_000]);
    }
}
