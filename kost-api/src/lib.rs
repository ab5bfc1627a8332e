use axum::{extract::DefaultBodyLimit, http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod listings;
pub mod middleware;
pub mod orders;
pub mod profile;
pub mod reviews;
pub mod search;
pub mod state;
pub mod uploads;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .merge(auth::routes())
        .merge(listings::public_routes())
        .merge(search::routes())
        .merge(reviews::public_routes());

    let protected = Router::new()
        .merge(listings::admin_routes())
        .merge(orders::routes())
        .merge(profile::routes())
        .merge(reviews::protected_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        // Room for the largest accepted file plus multipart framing, so
        // the size check in `save_upload` is the effective cap.
        .layer(DefaultBodyLimit::max(uploads::MAX_FILE_SIZE + 64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
