use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::errors::ApiResult;
use crate::api::models::{parse_body, IssueQuery};
use crate::api::AppState;
use crate::errors::KycError;
use crate::models::{Issue, IssueAction, IssueId, IssuePatch, NewIssue};

fn issue_not_found(id: IssueId) -> KycError {
    KycError::NotFound(format!("Issue {} not found", id))
}

pub async fn list_issues(
    State(state): State<AppState>,
    Query(query): Query<IssueQuery>,
) -> ApiResult<Json<Value>> {
    let category = query.category()?;
    let issue_state = query.state()?;

    let repo = state.repo.read().await;
    let issues: Vec<Issue> = repo
        .issues()?
        .into_iter()
        .filter(|i| category.map_or(true, |c| i.category == c))
        .filter(|i| query.company.map_or(true, |c| i.company_id == c))
        .filter(|i| issue_state.map_or(true, |s| i.state == s))
        .collect();

    Ok(Json(json!({ "total": issues.len(), "issues": issues })))
}

pub async fn create_issue(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let new: NewIssue = parse_body(&body)?;
    let issue = state.repo.write().await.add_issue(new)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<IssueId>,
) -> ApiResult<Json<Issue>> {
    state
        .repo
        .read()
        .await
        .get_issue(id)?
        .map(Json)
        .ok_or_else(|| issue_not_found(id))
}

pub async fn update_issue(
    State(state): State<AppState>,
    Path(id): Path<IssueId>,
    body: Bytes,
) -> ApiResult<Json<Issue>> {
    let patch: IssuePatch = parse_body(&body)?;
    state
        .repo
        .write()
        .await
        .update_issue(id, patch)?
        .map(Json)
        .ok_or_else(|| issue_not_found(id))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    Path(id): Path<IssueId>,
) -> ApiResult<Json<Value>> {
    if state.repo.write().await.delete_issue(id)? {
        Ok(Json(json!({"deleted": true})))
    } else {
        Err(issue_not_found(id))
    }
}

pub async fn apply_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(IssueId, String)>,
) -> ApiResult<Json<Issue>> {
    let action: IssueAction = action.parse().map_err(KycError::Validation)?;
    state
        .repo
        .write()
        .await
        .apply_action(id, action)?
        .map(Json)
        .ok_or_else(|| issue_not_found(id))
}
