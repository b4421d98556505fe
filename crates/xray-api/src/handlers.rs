//! API Handlers
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use xray_core::{ExecutionSnapshot, ExecutionStatus, XRAY_VERSION};
use xray_store::StoreError;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub status: Option<String>,
}

pub async fn save_execution(
    State(state): State<AppState>,
    body: Result<Json<ExecutionSnapshot>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(snapshot) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let execution_id = snapshot.execution_id.clone();
    let stored_id = state
        .store
        .save(snapshot)
        .await
        .map_err(|e| record_failure(&state, e))?;

    state.metrics.executions_saved.inc();
    info!(%stored_id, %execution_id, "execution stored");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "storedId": stored_id.to_string(),
            "executionId": execution_id,
        })),
    ))
}

pub async fn list_executions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ExecutionSnapshot>>, ApiError> {
    let limit = state.config.clamp_limit(params.limit);
    let executions = match params.status.as_deref() {
        Some(raw) => {
            let status = raw.parse::<ExecutionStatus>().map_err(ApiError::BadRequest)?;
            state.store.list_by_status(status, limit).await
        }
        None => state.store.list(limit).await,
    }
    .map_err(|e| record_failure(&state, e))?;

    Ok(Json(executions))
}

pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionSnapshot>, ApiError> {
    let snapshot = state
        .store
        .get(&id)
        .await
        .map_err(|e| record_failure(&state, e))?;
    Ok(Json(snapshot))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.count().await {
        Ok(executions) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "version": XRAY_VERSION, "executions": executions })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "version": XRAY_VERSION, "error": e.to_string() })),
        ),
    }
}

pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.encode() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn record_failure(state: &AppState, error: StoreError) -> ApiError {
    let kind = match &error {
        StoreError::DuplicateExecution(_) => "duplicate",
        StoreError::StoredIdConflict(_) => "stored_id_conflict",
        StoreError::NotFound(_) => "not_found",
        StoreError::InvalidId(_) => "invalid_id",
        StoreError::Unavailable(_) => "unavailable",
    };
    state.metrics.store_errors.with_label_values(&[kind]).inc();
    warn!(kind, error = %error, "store operation failed");
    ApiError::Store(error)
}
