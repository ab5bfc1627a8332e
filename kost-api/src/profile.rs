use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use kost_domain::user::{Caller, User};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    username: String,
    email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/users/profile", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .find(caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("user {}", caller.user_id)))?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    if req.username.is_empty() || req.email.is_empty() {
        return Err(AppError::ValidationError(
            "username and email are required".into(),
        ));
    }
    let user = state
        .users
        .update_profile(caller.user_id, &req.username, &req.email)
        .await?;
    Ok(Json(user))
}
