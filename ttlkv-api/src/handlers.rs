//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use ttlkv_core::{parse_duration, TtlkvError};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /get?key=...
pub async fn get_value(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<GetQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or(TtlkvError::EmptyKey)?;

    match state.cache.get(&key) {
        Some(value) => {
            debug!(key = %key, "Cache hit");
            Ok(Json(value))
        }
        None => {
            debug!(key = %key, "Cache miss");
            Err(ApiError::not_found("Key not found or expired"))
        }
    }
}

/// POST /set
pub async fn set_value(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SetResponse>)> {
    let Json(req) = payload?;
    if req.key.is_empty() {
        return Err(TtlkvError::EmptyKey.into());
    }

    let ttl = parse_duration(&req.expiration)?;
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

    state.cache.set(req.key.clone(), req.value, ttl);
    info!(key = %req.key, ttl_ms, "Stored key");

    Ok((
        StatusCode::CREATED,
        Json(SetResponse {
            key: req.key,
            expiration: req.expiration,
            ttl_ms,
        }),
    ))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.uptime_seconds(),
        started_at: state.started_at,
    })
}
