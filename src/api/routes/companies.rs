use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::errors::ApiResult;
use crate::api::models::parse_body;
use crate::api::AppState;
use crate::errors::KycError;
use crate::models::{Company, CompanyId, CompanyPatch, NewCompany};

fn company_not_found(id: CompanyId) -> KycError {
    KycError::NotFound(format!("Company {} not found", id))
}

pub async fn list_companies(State(state): State<AppState>) -> Json<Value> {
    let repo = state.repo.read().await;
    Json(json!({ "total": repo.companies().len(), "companies": repo.companies() }))
}

pub async fn create_company(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let new: NewCompany = parse_body(&body)?;
    let company = state.repo.write().await.add_company(new)?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> ApiResult<Json<Company>> {
    state
        .repo
        .read()
        .await
        .get_company(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| company_not_found(id))
}

pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    body: Bytes,
) -> ApiResult<Json<Company>> {
    let patch: CompanyPatch = parse_body(&body)?;
    state
        .repo
        .write()
        .await
        .update_company(id, patch)?
        .map(Json)
        .ok_or_else(|| company_not_found(id))
}

pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> ApiResult<Json<Value>> {
    if state.repo.write().await.delete_company(id)? {
        Ok(Json(json!({"deleted": true})))
    } else {
        Err(company_not_found(id))
    }
}
