use std::time::Instant;

use chrono::{SubsecRound, Utc};
use serde_json::Value;

use crate::client::{Request, Transport};
use crate::types::{OperationResult, OperationType, TRANSPORT_FAILURE};

/// Maximum characters kept from an error body or transport error.
pub const MAX_ERROR_CHARS: usize = 100;

/// A finished call: the record plus the identifier later phases may need.
#[derive(Debug, Clone)]
pub struct Execution {
    pub result: OperationResult,
    pub id: Option<String>,
}

/// Perform one timed call and classify its outcome.
///
/// Failures are returned as unsuccessful records, never as errors. On an
/// accepted status the identifier is read from the response body, then from
/// the `id` the request itself sent; when neither has one, a placeholder is
/// synthesized so dependent steps can proceed.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &Request,
    operation_type: OperationType,
    operation_number: usize,
) -> Execution {
    let start = Instant::now();
    let outcome = transport.send(request);
    let duration_ms = elapsed_ms(start);

    let (success, status_code, id, error_message) = match outcome {
        Ok(response) if operation_type.accepts(response.status) => {
            let id = extract_id(&response.body)
                .or_else(|| sent_id(request))
                .unwrap_or_else(|| placeholder_id(operation_type, operation_number));
            (true, i32::from(response.status), Some(id), String::new())
        }
        Ok(response) => {
            let body = response.body.trim();
            let message = if body.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                truncate_chars(body, MAX_ERROR_CHARS)
            };
            (false, i32::from(response.status), None, message)
        }
        Err(err) => (
            false,
            TRANSPORT_FAILURE,
            None,
            truncate_chars(&err.to_string(), MAX_ERROR_CHARS),
        ),
    };

    tracing::debug!(
        operation = %operation_type,
        number = operation_number,
        method = %request.method,
        path = %request.path,
        status = status_code,
        duration_ms,
        "call finished"
    );
    if !success {
        tracing::info!(
            operation = %operation_type,
            number = operation_number,
            status = status_code,
            error = %error_message,
            "operation failed"
        );
    }

    Execution {
        result: OperationResult {
            operation_type,
            operation_number,
            duration_ms,
            success,
            status_code,
            post_id: id.clone(),
            error_message,
            // Millisecond precision, the resolution the CSV keeps.
            timestamp: Utc::now().trunc_subsecs(3),
        },
        id,
    }
}

/// Milliseconds since `start` on the monotonic clock.
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Read an identifier from a response body: `id`, `postId` or `_id` of an
/// object (string, number, or `{"$oid": ...}`), or a bare string/number.
pub fn extract_id(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match &value {
        Value::Object(map) => ["id", "postId", "_id"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(id_value),
        other => id_value(other),
    }
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(id_value),
        _ => None,
    }
}

/// The `id` a request body carried, for servers that store client ids and
/// answer without echoing them.
fn sent_id(request: &Request) -> Option<String> {
    request.body.as_ref()?.get("id").and_then(id_value)
}

pub fn placeholder_id(operation_type: OperationType, operation_number: usize) -> String {
    let prefix = match operation_type {
        OperationType::InsertComment => "comment",
        OperationType::InsertReaction => "reaction",
        OperationType::Sync => "sync",
        _ => "post",
    };
    format!("{}_{}_{}", prefix, operation_number, Utc::now().timestamp())
}

/// Keep at most `max` characters, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte, _)) => s[..byte].to_string(),
        None => s.to_string(),
    }
}
