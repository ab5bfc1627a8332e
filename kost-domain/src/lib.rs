//! Domain model for the kost rental marketplace: accounts, listings,
//! the order ledger with its loyalty-points policy, and reviews.

pub mod error;
pub mod ledger;
pub mod listing;
pub mod memory;
pub mod order;
pub mod repository;
pub mod review;
pub mod user;

pub use error::DomainError;
pub use ledger::{CreateBookingRequest, Ledger};
pub use review::ReviewGate;
