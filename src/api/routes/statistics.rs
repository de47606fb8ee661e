use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::models::Statistics;

pub async fn get_categories(State(state): State<AppState>) -> Json<Value> {
    let repo = state.repo.read().await;
    Json(json!({ "categories": repo.categories() }))
}

pub async fn get_statistics(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.repo.read().await.statistics())
}
