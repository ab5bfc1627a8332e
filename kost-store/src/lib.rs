//! Postgres persistence for the kost marketplace: connection pool,
//! migrations, layered configuration, and one repository per aggregate.

pub mod app_config;
pub mod database;
pub mod listing_repo;
pub mod order_repo;
pub mod review_repo;
pub mod user_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use listing_repo::PgKostRepository;
pub use order_repo::PgOrderRepository;
pub use review_repo::PgReviewRepository;
pub use user_repo::PgUserRepository;
