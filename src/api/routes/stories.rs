use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::errors::ApiResult;
use crate::api::models::StoryQuery;
use crate::api::AppState;
use crate::errors::KycError;
use crate::models::{CorroborationSupport, IssueCategory, Story};

fn story_not_found(id: u32) -> KycError {
    KycError::NotFound(format!("Story {} not found", id))
}

pub async fn list_stories(
    State(state): State<AppState>,
    Query(query): Query<StoryQuery>,
) -> ApiResult<Json<Value>> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<IssueCategory>)
        .transpose()
        .map_err(KycError::Validation)?;

    let repo = state.repo.read().await;
    let stories: Vec<&Story> = match category {
        Some(c) => repo.stories_by_category(c),
        None => repo.stories().iter().collect(),
    };
    Ok(Json(json!({ "total": stories.len(), "stories": stories })))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Story>> {
    state
        .repo
        .read()
        .await
        .get_story(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| story_not_found(id))
}

pub async fn get_story_issues(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Value>> {
    let repo = state.repo.read().await;
    if repo.get_story(id).is_none() {
        return Err(story_not_found(id));
    }
    let issues = repo.issues_for_story(id)?;
    Ok(Json(json!({ "total": issues.len(), "issues": issues })))
}

pub async fn get_story_support(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<CorroborationSupport>> {
    let repo = state.repo.read().await;
    if repo.get_story(id).is_none() {
        return Err(story_not_found(id));
    }
    Ok(Json(repo.corroboration_support(id)))
}
