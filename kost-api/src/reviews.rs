use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use kost_domain::review::Review;
use kost_domain::user::Caller;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    rating: i32,
    comment: Option<String>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/kosts/{id}/reviews", get(list_reviews))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/kosts/{id}/reviews", post(create_review))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(kost_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state
        .reviews
        .create_review(&caller, kost_id, req.rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(kost_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.reviews.list_for_kost(kost_id).await?))
}
