use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use kost_domain::listing::{Kost, SearchFilters, Suggestions};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search_kosts))
        .route("/api/suggestions", get(suggestions))
}

async fn search_kosts(
    State(state): State<AppState>,
    Query(filters): Query<SearchFilters>,
) -> Result<Json<Vec<Kost>>, AppError> {
    Ok(Json(state.kosts.search(&filters).await?))
}

async fn suggestions(State(state): State<AppState>) -> Result<Json<Suggestions>, AppError> {
    Ok(Json(state.kosts.suggestions().await?))
}
