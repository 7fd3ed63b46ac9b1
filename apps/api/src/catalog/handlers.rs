use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogResult;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<CatalogResult>,
}

/// POST /api/v1/catalog/search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let keyword = req.keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("keyword must not be empty".to_string()));
    }

    let results = state
        .catalog
        .search(keyword)
        .await
        .map_err(|e| AppError::Catalog(e.to_string()))?;

    Ok(Json(SearchResponse { results }))
}
