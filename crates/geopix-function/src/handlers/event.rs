//! Storage notification handler.
//!
//! Notifications arrive as CloudEvents. In binary mode the body is the storage object and the
//! event attributes travel in `ce-*` headers; in structured mode the body is an envelope with
//! `specversion` and the object under `data`. Both are accepted.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use geopix_core::{AppError, StorageObject};
use geopix_processing::{process_upload, PhotoServices, PipelineSettings, ProcessOutcome};
use serde_json::Value;
use std::sync::Arc;

const CLOUD_EVENT_HEADERS: [&str; 4] = ["ce-id", "ce-type", "ce-source", "ce-subject"];

/// Extract the storage object from a notification body
pub(crate) fn parse_notification(body: &[u8]) -> Result<StorageObject, AppError> {
    let value: Value = serde_json::from_slice(body)?;
    let payload = match value {
        Value::Object(mut envelope) if envelope.contains_key("specversion") => envelope
            .remove("data")
            .ok_or_else(|| AppError::InvalidInput("CloudEvent envelope has no data".to_string()))?,
        other => other,
    };
    Ok(serde_json::from_value(payload)?)
}

fn log_event_attributes(headers: &HeaderMap) {
    for name in CLOUD_EVENT_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            tracing::info!(attribute = name, value, "CloudEvent attribute");
        }
    }
}

/// Run the pipeline for one storage notification.
pub async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProcessOutcome>, HttpAppError> {
    log_event_attributes(&headers);

    process_notification(&state, &body)
        .await
        .map(Json)
        .map_err(|err| err.for_config(&state.config))
}

async fn process_notification(
    state: &AppState,
    body: &[u8],
) -> Result<ProcessOutcome, HttpAppError> {
    let object = parse_notification(body)?;
    tracing::info!(
        revision = state.config.revision().unwrap_or("unknown"),
        bucket = %object.bucket,
        name = %object.name,
        generation = object.generation,
        content_type = object.content_type().unwrap_or("none"),
        "Storage notification received"
    );

    let services = PhotoServices::for_event(&state.config, &object, state.catalog.clone()).await?;
    let settings = PipelineSettings::from_config(&state.config);

    Ok(process_upload(&services, &settings, &object).await?)
}
