use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::listing::{Kost, SearchFilters, Suggestions};
use crate::order::{Order, OrderDetails, OrderStatus, StatusChange};
use crate::review::Review;
use crate::user::{Role, User};

/// Repository trait for account records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Lookup used by login: the original keyed on (username, role).
    async fn find_by_login(&self, username: &str, role: Role)
        -> Result<Option<User>, DomainError>;

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<User, DomainError>;
}

/// Repository trait for kost listings.
#[async_trait]
pub trait KostRepository: Send + Sync {
    async fn create(&self, kost: &Kost) -> Result<Kost, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<Kost>, DomainError>;

    async fn list(&self) -> Result<Vec<Kost>, DomainError>;

    async fn update(&self, id: Uuid, kost: &Kost) -> Result<Kost, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Kost>, DomainError>;

    async fn suggestions(&self) -> Result<Suggestions, DomainError>;
}

/// Repository trait for orders and the points transfers tied to them.
///
/// The two compound mutations are single methods so an implementation can
/// wrap each in one atomic transaction: a crash between the points write
/// and the order write must not be observable.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order and debit `used_points` from its owner in one
    /// transaction. Fails with `InsufficientPoints` when the debit would
    /// take the balance negative, judged against the balance at the
    /// moment of the write.
    async fn create_with_debit(&self, order: &Order, used_points: i64)
        -> Result<Order, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Orders joined with the owner's username and the kost's name.
    /// `owner` of `None` means all orders (the administrative view).
    async fn list_with_details(&self, owner: Option<Uuid>)
        -> Result<Vec<OrderDetails>, DomainError>;

    /// Overwrites any previously attached proof reference.
    async fn set_payment_proof(&self, id: Uuid, path: &str) -> Result<Order, DomainError>;

    /// Set the status and, iff the order enters `Confirmed` from a
    /// different status, credit `confirmation_award(total_price)` to the
    /// owner in the same transaction. Re-confirming is a status no-op and
    /// never re-awards.
    async fn set_status(&self, id: Uuid, status: OrderStatus)
        -> Result<StatusChange, DomainError>;

    /// Whether a confirmed order exists for the exact (user, kost) pair.
    async fn has_confirmed(&self, user_id: Uuid, kost_id: Uuid) -> Result<bool, DomainError>;
}

/// Repository trait for reviews.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: &Review) -> Result<Review, DomainError>;

    async fn list_for_kost(&self, kost_id: Uuid) -> Result<Vec<Review>, DomainError>;
}
