//! Utility functions for request decoding

use serde_json::{Map, Value};
use steeple_core::ValidationError;

/// Field name reported when the request body itself is unusable.
pub const BODY_FIELD: &str = "body";

/// Decode a request body into a JSON object.
///
/// An empty body is an empty object, so a bare POST browses with defaults.
///
/// # Errors
/// - `ValidationError` - Body is not valid JSON or not a JSON object
pub fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::invalid_type(BODY_FIELD, "a JSON object")),
        Err(e) => Err(ValidationError::invalid_value(
            BODY_FIELD,
            format!("malformed JSON ({e})"),
        )),
    }
}
