use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use kost_domain::order::{Order, OrderDetails, OrderStatus, StatusChange};
use kost_domain::user::Caller;
use kost_domain::CreateBookingRequest;

use crate::error::AppError;
use crate::state::AppState;
use crate::uploads::save_upload;

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/{order_id}/upload-proof", post(upload_proof))
        .route("/api/orders/{order_id}", put(update_status))
        .route("/api/user/points", get(points_balance))
}

async fn create_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.ledger.create_booking(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<OrderDetails>>, AppError> {
    let orders = state.ledger.list_bookings(&caller).await?;
    Ok(Json(orders))
}

async fn upload_proof(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(order_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Order>, AppError> {
    let mut stored: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("payment_proof") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("payment_proof").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {e}")))?;
        stored = Some(save_upload(&state.uploads_dir, "payment_proof", &original_name, &data).await?);
    }

    let proof_path = stored.ok_or_else(|| {
        AppError::ValidationError("missing payment_proof file field".into())
    })?;

    let order = state
        .ledger
        .attach_payment_proof(&caller, order_id, &proof_path)
        .await?;
    Ok(Json(order))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChange>, AppError> {
    let change = state
        .ledger
        .update_status(&caller, order_id, req.status)
        .await?;
    Ok(Json(change))
}

async fn points_balance(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<serde_json::Value>, AppError> {
    let points = state.ledger.points_balance(&caller).await?;
    Ok(Json(json!({ "points": points })))
}
