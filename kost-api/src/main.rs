use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use kost_api::{app, state::{AppState, AuthConfig}};
use kost_domain::{Ledger, ReviewGate};
use kost_store::{PgKostRepository, PgOrderRepository, PgReviewRepository, PgUserRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kost_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = kost_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting kost API on port {}", config.server.port);

    let db = kost_store::DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let users = Arc::new(PgUserRepository::new(db.pool.clone()));
    let kosts = Arc::new(PgKostRepository::new(db.pool.clone()));
    let orders = Arc::new(PgOrderRepository::new(db.pool.clone()));
    let reviews = Arc::new(PgReviewRepository::new(db.pool.clone()));

    let app_state = AppState {
        users: users.clone(),
        kosts,
        ledger: Arc::new(Ledger::new(users, orders.clone())),
        reviews: Arc::new(ReviewGate::new(orders, reviews)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        uploads_dir: PathBuf::from(&config.uploads.dir),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
