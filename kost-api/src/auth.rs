use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::info;

use kost_domain::user::{Role, User};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register/user", post(register_user))
        .route("/api/auth/register/admin", post(register_admin))
        .route("/api/auth/login", post(login))
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    register(&state, req, Role::User).await
}

async fn register_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    register(&state, req, Role::Admin).await
}

async fn register(
    state: &AppState,
    req: RegisterRequest,
    role: Role,
) -> Result<(StatusCode, Json<User>), AppError> {
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::ValidationError(
            "username, email and password are required".into(),
        ));
    }

    let hash = User::hash_password(&req.password)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {e}")))?;
    let user = User::new(req.username, req.email, hash, role);
    let created = state.users.create(&user).await?;

    info!(user_id = %created.id, role = %role, "account registered");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_login(&req.username, req.role)
        .await?
        .ok_or_else(|| AppError::ValidationError("Invalid username or password".into()))?;

    let password_valid = user
        .verify_password(&req.password)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !password_valid {
        return Err(AppError::ValidationError(
            "Invalid username or password".into(),
        ));
    }

    let claims = crate::middleware::auth::Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {e}")))?;

    Ok(Json(AuthResponse { token }))
}
