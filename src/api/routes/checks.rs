use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::errors::ApiResult;
use crate::api::models::CheckRun;
use crate::api::{AppState, CheckHandle};
use crate::check::CheckProcess;
use crate::errors::KycError;

pub async fn start_check(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    let check_id = uuid::Uuid::new_v4().to_string();
    let cancel_token = CancellationToken::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let process = CheckProcess::new(state.step_delay)
        .with_cancel_token(cancel_token.clone())
        .with_event_channel(event_tx);

    evict_finished(&state).await;

    let run = Arc::new(RwLock::new(CheckRun::new(&check_id)));
    state.checks.insert(
        check_id.clone(),
        Arc::new(CheckHandle {
            run: Arc::clone(&run),
            cancel_token,
        }),
    );

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            run.write().await.apply(&event);
        }
    });

    let id = check_id.clone();
    tokio::spawn(async move {
        match process.run().await {
            Ok(result) => info!(check_id = %id, warnings = result.warnings(), "Check run finished"),
            Err(e) => warn!(check_id = %id, error = %e, "Check run ended early"),
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": check_id,
            "status": "running",
        })),
    ))
}

/// Drop the oldest finished runs beyond the retention limit. Running checks
/// are never evicted.
async fn evict_finished(state: &AppState) {
    let handles: Vec<(String, Arc<CheckHandle>)> = state
        .checks
        .iter()
        .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
        .collect();

    let mut finished = Vec::new();
    for (id, handle) in handles {
        if let Some(finished_at) = handle.run.read().await.finished_at {
            finished.push((finished_at, id));
        }
    }
    if finished.len() <= state.check_retention {
        return;
    }

    finished.sort();
    let excess = finished.len() - state.check_retention;
    for (_, id) in finished.into_iter().take(excess) {
        state.checks.remove(&id);
        debug!(check_id = %id, "Evicted finished check run");
    }
}

pub async fn get_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CheckRun>> {
    let handle = state
        .checks
        .get(&id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| KycError::NotFound(format!("Check {} not found", id)))?;
    let run = handle.run.read().await.clone();
    Ok(Json(run))
}

pub async fn stop_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let handle = state
        .checks
        .get(&id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| KycError::NotFound(format!("Check {} not found", id)))?;

    if handle.run.read().await.is_finished() {
        return Err(KycError::Conflict(format!("Check {} already finished", id)));
    }
    handle.cancel_token.cancel();
    Ok(Json(json!({"stopped": true})))
}
