use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use kost_domain::listing::Kost;
use kost_domain::user::Caller;

use crate::error::AppError;
use crate::state::AppState;
use crate::uploads::save_upload;

/// Multipart file fields accepted on listing creation.
const PHOTO_FIELDS: &[&str] = &["photo_main", "photo_outside", "photo_inside"];

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/kosts", get(list_kosts))
        .route("/api/kosts/{id}", get(get_kost))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/kosts", post(create_kost))
        .route("/api/kosts/{id}", put(update_kost))
        .route("/api/kosts/{id}", delete(delete_kost))
}

async fn list_kosts(State(state): State<AppState>) -> Result<Json<Vec<Kost>>, AppError> {
    Ok(Json(state.kosts.list().await?))
}

async fn get_kost(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Kost>, AppError> {
    let kost = state
        .kosts
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("kost {id}")))?;
    Ok(Json(kost))
}

fn require_admin(caller: &Caller) -> Result<(), AppError> {
    if !caller.is_admin() {
        return Err(AppError::AuthorizationError(
            "Access denied, only admin can perform this action".into(),
        ));
    }
    Ok(())
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> Result<&'a str, AppError> {
    match fields.get(key).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::ValidationError(format!(
            "missing required field: {key}"
        ))),
    }
}

fn required_i64(fields: &HashMap<String, String>, key: &str) -> Result<i64, AppError> {
    required(fields, key)?
        .parse()
        .map_err(|_| AppError::ValidationError(format!("field {key} must be an integer")))
}

fn required_i32(fields: &HashMap<String, String>, key: &str) -> Result<i32, AppError> {
    required(fields, key)?
        .parse()
        .map_err(|_| AppError::ValidationError(format!("field {key} must be an integer")))
}

/// Facility and rule lists arrive as JSON-encoded string arrays within
/// the multipart form.
fn required_list(fields: &HashMap<String, String>, key: &str) -> Result<Vec<String>, AppError> {
    serde_json::from_str(required(fields, key)?)
        .map_err(|_| AppError::ValidationError(format!("field {key} must be a JSON string array")))
}

async fn create_kost(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Kost>), AppError> {
    require_admin(&caller)?;

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut photos: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if PHOTO_FIELDS.contains(&name.as_str()) {
            let original_name = field.file_name().unwrap_or("photo").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {e}")))?;
            let path = save_upload(&state.uploads_dir, &name, &original_name, &data).await?;
            photos.insert(name, path);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::ValidationError(format!("Invalid field {name}: {e}")))?;
            fields.insert(name, value);
        }
    }

    let now = Utc::now();
    let kost = Kost {
        id: Uuid::new_v4(),
        name: required(&fields, "name")?.to_string(),
        room_size: required(&fields, "room_size")?.to_string(),
        total_rooms: required_i32(&fields, "total_rooms")?,
        available_rooms: required_i32(&fields, "available_rooms")?,
        price_per_month: required_i64(&fields, "price_per_month")?,
        price_per_three_months: required_i64(&fields, "price_per_three_months")?,
        price_per_six_months: required_i64(&fields, "price_per_six_months")?,
        price_per_year: required_i64(&fields, "price_per_year")?,
        address: required(&fields, "address")?.to_string(),
        city: required(&fields, "city")?.to_string(),
        province: required(&fields, "province")?.to_string(),
        room_facilities: required_list(&fields, "room_facilities")?,
        shared_facilities: required_list(&fields, "shared_facilities")?,
        rules: required_list(&fields, "rules")?,
        category: required(&fields, "category")?.to_string(),
        photo_main: photos.remove("photo_main"),
        photo_outside: photos.remove("photo_outside"),
        photo_inside: photos.remove("photo_inside"),
        created_at: now,
        updated_at: now,
    };

    let created = state.kosts.create(&kost).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct UpdateKostRequest {
    name: String,
    room_size: String,
    total_rooms: i32,
    available_rooms: i32,
    price_per_month: i64,
    price_per_three_months: i64,
    price_per_six_months: i64,
    price_per_year: i64,
    address: String,
    city: String,
    province: String,
    room_facilities: Vec<String>,
    shared_facilities: Vec<String>,
    rules: Vec<String>,
    category: String,
}

async fn update_kost(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateKostRequest>,
) -> Result<Json<Kost>, AppError> {
    require_admin(&caller)?;

    for (key, value) in [
        ("name", &req.name),
        ("room_size", &req.room_size),
        ("address", &req.address),
        ("city", &req.city),
        ("province", &req.province),
        ("category", &req.category),
    ] {
        if value.is_empty() {
            return Err(AppError::ValidationError(format!(
                "missing required field: {key}"
            )));
        }
    }

    let now = Utc::now();
    let kost = Kost {
        id,
        name: req.name,
        room_size: req.room_size,
        total_rooms: req.total_rooms,
        available_rooms: req.available_rooms,
        price_per_month: req.price_per_month,
        price_per_three_months: req.price_per_three_months,
        price_per_six_months: req.price_per_six_months,
        price_per_year: req.price_per_year,
        address: req.address,
        city: req.city,
        province: req.province,
        room_facilities: req.room_facilities,
        shared_facilities: req.shared_facilities,
        rules: req.rules,
        category: req.category,
        // Photos are attached at creation time; updates leave them as-is.
        photo_main: None,
        photo_outside: None,
        photo_inside: None,
        created_at: now,
        updated_at: now,
    };

    let updated = state.kosts.update(id, &kost).await?;
    Ok(Json(updated))
}

async fn delete_kost(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&caller)?;
    state.kosts.delete(id).await?;
    Ok(Json(json!({ "message": "Kost deleted" })))
}
