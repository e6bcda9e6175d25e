//! Mapping of HTTP outcomes onto [`ApiError`].
//!
//! Bodies follow Django REST Framework conventions: `{"detail": "..."}`,
//! `{"non_field_errors": [...]}`, per-field `{"field": ["msg"]}` maps (possibly
//! nested for list fields) or a bare list of messages.

use serde_json::Value;

use tradetrack_core::{ApiError, FieldErrors};

const NON_FIELD_KEYS: [&str; 2] = ["detail", "non_field_errors"];

/// Classify a non-success response. `resource` names what was requested
/// (used for 404s).
pub fn classify_response(status: u16, body: &str, resource: &str) -> ApiError {
    let json: Option<Value> = serde_json::from_str(body).ok();

    match status {
        401 | 403 => {
            let detail = json.as_ref().and_then(detail_of).unwrap_or_else(|| {
                if status == 401 {
                    "Authentication credentials were not provided.".to_string()
                } else {
                    "You do not have permission to perform this action.".to_string()
                }
            });
            ApiError::unauthorized(status, detail)
        }
        400 | 422 => {
            let mut fields = FieldErrors::new();
            if let Some(Value::Object(map)) = &json {
                for (key, value) in map {
                    if !NON_FIELD_KEYS.contains(&key.as_str()) {
                        collect_field_errors(key, value, &mut fields);
                    }
                }
            }
            let detail = json
                .as_ref()
                .and_then(detail_of)
                .unwrap_or_else(|| "The server rejected the request.".to_string());
            ApiError::validation(detail, fields)
        }
        404 => ApiError::not_found(resource),
        _ => {
            let snippet: String = body.chars().take(200).collect();
            ApiError::transient(format!("unexpected status {status}: {snippet}"))
        }
    }
}

/// Failure to reach the server or to read its answer.
pub fn from_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::transient(format!("request timed out: {err}"))
    } else if err.is_decode() {
        ApiError::transient(format!("malformed response: {err}"))
    } else {
        ApiError::transient(format!("network error: {err}"))
    }
}

/// A 2xx body that did not match the expected shape.
pub fn malformed(resource: &str, err: serde_json::Error) -> ApiError {
    ApiError::transient(format!("malformed {resource} response: {err}"))
}

fn detail_of(json: &Value) -> Option<String> {
    match json {
        Value::Object(map) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return Some(detail.clone());
            }
            map.get("non_field_errors")
                .map(messages_of)
                .filter(|m| !m.is_empty())
                .map(|m| m.join(" "))
        }
        Value::Array(_) => Some(messages_of(json).join(" ")).filter(|m| !m.is_empty()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_field_errors(path: &str, value: &Value, out: &mut FieldErrors) {
    match value {
        Value::String(msg) => out.entry(path.to_string()).or_default().push(msg.clone()),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                match item {
                    Value::String(msg) => {
                        out.entry(path.to_string()).or_default().push(msg.clone())
                    }
                    Value::Object(_) | Value::Array(_) => {
                        collect_field_errors(&format!("{path}[{idx}]"), item, out)
                    }
                    _ => {}
                }
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                collect_field_errors(&format!("{path}.{key}"), nested, out);
            }
        }
        _ => {}
    }
}
