use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use promptlog_lib::{normalize_limit, LogEntry, LogFilter, LogPage, NewLogEntry, StoreError};
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;

// ── Health ───────────────────────────────────────────────────

pub async fn handle_health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── POST /logs ───────────────────────────────────────────────

pub async fn handle_create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let new = parse_create_body(&body)?;
    let entry = state.store.create(new)?;
    info!(id = %entry.id, engine = ?entry.engine, "log entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

// ── GET /logs?engine=&tag=&limit= ────────────────────────────

pub async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<LogPage>, ApiError> {
    let filter = LogFilter {
        engine: query.get("engine").cloned(),
        tag: query.get("tag").cloned(),
    };
    let limit = normalize_limit(query.get("limit").map(String::as_str));
    Ok(Json(state.store.list(&filter, limit)?))
}

// ── GET /logs/{id} ───────────────────────────────────────────

pub async fn handle_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LogEntry>, ApiError> {
    Ok(Json(state.store.get(&id)?))
}

// ── DELETE /logs/{id} ────────────────────────────────────────

pub async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.store.delete(&id)?;
    info!(id = %removed.id, "log entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ── Body parsing ─────────────────────────────────────────────

/// Translate a create request body into a [`NewLogEntry`].
///
/// `prompt` and `response` must be strings that are non-empty after trimming.
/// `engine` is kept only when it is a non-empty string. `tags` keeps the
/// string elements of an array and is empty for anything else. An empty body
/// is treated as `{}`.
pub fn parse_create_body(body: &[u8]) -> Result<NewLogEntry, ApiError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?
    };

    let prompt = required_text(&value, "prompt")?;
    let response = required_text(&value, "response")?;

    let engine = value
        .get("engine")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string);

    let tags = match value.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(NewLogEntry {
        prompt,
        response,
        engine,
        tags,
    })
}

fn required_text(value: &Value, field: &'static str) -> Result<String, ApiError> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(StoreError::Validation { field }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_error(body: &str) -> Option<&'static str> {
        match parse_create_body(body.as_bytes()) {
            Err(ApiError::Store(StoreError::Validation { field })) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn parses_full_body() {
        let new = parse_create_body(
            br#"{"prompt":"Hello world","response":"Hi there","engine":"gpt-4","tags":["test"]}"#,
        )
        .unwrap();
        assert_eq!(
            new,
            NewLogEntry::new("Hello world", "Hi there")
                .engine("gpt-4")
                .tags(["test"])
        );
    }

    #[test]
    fn names_the_offending_field() {
        assert_eq!(field_error(r#"{"response":"Hi"}"#), Some("prompt"));
        assert_eq!(field_error(r#"{"prompt":"Hello"}"#), Some("response"));
        assert_eq!(field_error(r#"{"prompt":"  ","response":"r"}"#), Some("prompt"));
        assert_eq!(field_error(r#"{"prompt":42,"response":"r"}"#), Some("prompt"));
        assert_eq!(field_error(r#"{"prompt":"p","response":null}"#), Some("response"));
        assert_eq!(field_error(""), Some("prompt"));
        assert_eq!(field_error("[1, 2]"), Some("prompt"));
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        assert!(matches!(
            parse_create_body(b"{ nope"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn normalizes_engine_and_tags() {
        let new = parse_create_body(br#"{"prompt":"p","response":"r","engine":"","tags":"x"}"#)
            .unwrap();
        assert_eq!(new.engine, None);
        assert!(new.tags.is_empty());

        let new = parse_create_body(
            br#"{"prompt":"p","response":"r","engine":7,"tags":["a",1,null,"b"]}"#,
        )
        .unwrap();
        assert_eq!(new.engine, None);
        assert_eq!(new.tags, vec!["a".to_string(), "b".to_string()]);
    }
}
