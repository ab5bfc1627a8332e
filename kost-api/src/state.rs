use std::path::PathBuf;
use std::sync::Arc;

use kost_domain::repository::{KostRepository, UserRepository};
use kost_domain::{Ledger, ReviewGate};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub kosts: Arc<dyn KostRepository>,
    pub ledger: Arc<Ledger>,
    pub reviews: Arc<ReviewGate>,
    pub auth: AuthConfig,
    pub uploads_dir: PathBuf,
}
