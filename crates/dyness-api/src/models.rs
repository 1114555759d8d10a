// Response types for the Dyness open API
//
// Every endpoint wraps its payload in the `{ code, info, data }`
// envelope. `code` arrives as a string on some endpoints and a bare
// number on others, so it is kept as a raw `Value` and compared in
// stringified form. `data` stays loosely typed because its shape is
// device- and endpoint-specific.

use serde::Deserialize;
use serde_json::Value;

/// Application-level status codes that count as success.
///
/// A transport-successful HTTP response is NOT an application success
/// unless its `code` stringifies to one of these.
pub const SUCCESS_CODES: [&str; 2] = ["0", "200"];

/// Standard Dyness API response envelope.
///
/// ```json
/// { "code": "0", "info": "success", "data": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// The status code in canonical string form.
    ///
    /// `"200"` (string) and `200` (number) compare equal; anything
    /// non-scalar falls back to its JSON rendering.
    pub fn code_str(&self) -> String {
        match &self.code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the code is in the success allow-list.
    pub fn is_success(&self) -> bool {
        let code = self.code_str();
        SUCCESS_CODES.contains(&code.as_str())
    }

    /// The error message, if any (`info` field).
    pub fn message(&self) -> &str {
        self.info.as_deref().unwrap_or("")
    }
}

/// One telemetry point from `/v1/device/realTime/data`.
///
/// Point IDs are vendor-defined keys ("600", "1200", ..., plus a few
/// alphabetic ones like "SUB"); values are usually string-encoded
/// numbers but kept raw here.
#[derive(Debug, Clone, Deserialize)]
pub struct PointRecord {
    #[serde(rename = "pointId")]
    pub point_id: String,
    #[serde(rename = "pointValue", default)]
    pub point_value: Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn code_comparison_is_string_based() {
        let numeric: Envelope = serde_json::from_str(r#"{"code": 200, "data": {}}"#).unwrap();
        let string: Envelope = serde_json::from_str(r#"{"code": "200", "data": {}}"#).unwrap();
        let zero: Envelope = serde_json::from_str(r#"{"code": "0", "data": {}}"#).unwrap();

        assert!(numeric.is_success());
        assert!(string.is_success());
        assert!(zero.is_success());
    }

    #[test]
    fn non_allowlisted_code_is_failure() {
        let env: Envelope =
            serde_json::from_str(r#"{"code": "1", "info": "invalid signature"}"#).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.code_str(), "1");
        assert_eq!(env.message(), "invalid signature");
    }

    #[test]
    fn missing_fields_default() {
        let env: Envelope = serde_json::from_str("{}").unwrap();
        assert!(!env.is_success());
        assert!(env.data.is_null());
        assert_eq!(env.message(), "");
    }
}
