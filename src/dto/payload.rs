//! Request bodies accepted by the resource endpoints.

use serde_json::{Map, Value};

use crate::error::ServiceError;

/// Loosely-typed record payload.
///
/// Recognised fields are picked out by the [`Record`](crate::dao::models::Record)
/// shape; everything else is ignored.
pub type RecordPayload = Map<String, Value>;

/// Decode a raw request body.
///
/// An empty body or a JSON `null` means "no payload". Anything other than a
/// JSON object is rejected.
pub fn parse_payload(body: &[u8]) -> Result<Option<RecordPayload>, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ServiceError::InvalidInput(format!("body is not valid JSON: {err}")))?;

    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(ServiceError::InvalidInput(format!(
            "body must be a JSON object, got `{other}`"
        ))),
    }
}
