use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use capture_platform::{CaptureError, CapturedScreenArea, ScreenRegion};

/// Default method channel name
pub const CHANNEL_NAME: &str = "flutter_screen_capture";

/// The only method the plugin implements
pub const CAPTURE_SCREEN_AREA: &str = "captureScreenArea";

/// Error code for malformed requests and rejected dimensions
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("arguments must be a map, got {0}")]
    NotAMap(&'static str),
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),
    #[error("argument `{key}` must be an integer, got {found}")]
    NotAnInteger { key: &'static str, found: String },
    #[error("argument `{key}` out of range: {value}")]
    OutOfRange { key: &'static str, value: i64 },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A call arriving on the method channel. Arguments stay untyped until the
/// handler for `method` extracts them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    /// Target channel; None addresses the plugin's own channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            channel: None,
            method: method.into(),
            arguments,
        }
    }

    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn capture_screen_area(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(
            CAPTURE_SCREEN_AREA,
            serde_json::json!({ "x": x, "y": y, "width": width, "height": height }),
        )
    }

    /// Parse one JSON-encoded call
    pub fn parse(data: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Typed `captureScreenArea` arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureScreenAreaRequest {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CaptureScreenAreaRequest {
    pub fn from_arguments(args: &Value) -> Result<Self, ProtocolError> {
        let map = args.as_object().ok_or(ProtocolError::NotAMap(value_kind(args)))?;

        let int = |key: &'static str| -> Result<i32, ProtocolError> {
            let value = map.get(key).ok_or(ProtocolError::MissingArgument(key))?;
            let n = value.as_i64().ok_or_else(|| ProtocolError::NotAnInteger {
                key,
                found: value.to_string(),
            })?;
            i32::try_from(n).map_err(|_| ProtocolError::OutOfRange { key, value: n })
        };

        Ok(Self {
            x: int("x")?,
            y: int("y")?,
            width: int("width")?,
            height: int("height")?,
        })
    }

    pub fn region(&self) -> Result<ScreenRegion, CaptureError> {
        ScreenRegion::new(self.x, self.y, self.width, self.height)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Reply to a method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success { result: Value },
    Error { code: String, message: String },
    /// The method name is unknown; not a failure of the call itself
    NotImplemented,
}

impl MethodResponse {
    /// Success reply carrying the five-field capture map
    pub fn captured(area: &CapturedScreenArea) -> Self {
        match serde_json::to_value(area) {
            Ok(result) => Self::Success { result },
            Err(e) => Self::error("CAPTURE_FAILED", format!("encode result: {}", e)),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Encode as a single JSON line
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<CaptureError> for MethodResponse {
    fn from(err: CaptureError) -> Self {
        Self::error(err.code(), err.to_string())
    }
}

impl From<ProtocolError> for MethodResponse {
    fn from(err: ProtocolError) -> Self {
        Self::error(INVALID_ARGUMENT, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_arguments() {
        let args = json!({ "x": -1920, "y": 10, "width": 640, "height": 480 });
        let req = CaptureScreenAreaRequest::from_arguments(&args).unwrap();
        assert_eq!(
            req,
            CaptureScreenAreaRequest {
                x: -1920,
                y: 10,
                width: 640,
                height: 480,
            }
        );
        let region = req.region().unwrap();
        assert_eq!(region.width, 640);
        assert_eq!(region.x, -1920);
    }

    #[test]
    fn test_request_missing_key() {
        let args = json!({ "x": 0, "y": 0, "width": 10 });
        let err = CaptureScreenAreaRequest::from_arguments(&args).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingArgument("height")));
    }

    #[test]
    fn test_request_non_integer() {
        let args = json!({ "x": "0", "y": 0, "width": 10, "height": 10 });
        let err = CaptureScreenAreaRequest::from_arguments(&args).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnInteger { key: "x", .. }));

        let args = json!({ "x": 0, "y": 0.5, "width": 10, "height": 10 });
        let err = CaptureScreenAreaRequest::from_arguments(&args).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnInteger { key: "y", .. }));
    }

    #[test]
    fn test_request_out_of_i32_range() {
        let args = json!({ "x": 0, "y": 0, "width": 4_294_967_296u64, "height": 10 });
        let err = CaptureScreenAreaRequest::from_arguments(&args).unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfRange { key: "width", .. }));
    }

    #[test]
    fn test_request_not_a_map() {
        let err = CaptureScreenAreaRequest::from_arguments(&json!([1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAMap("list")));

        let err = CaptureScreenAreaRequest::from_arguments(&Value::Null).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAMap("null")));
    }

    #[test]
    fn test_zero_size_request_is_invalid_region() {
        let args = json!({ "x": 0, "y": 0, "width": 0, "height": 10 });
        let req = CaptureScreenAreaRequest::from_arguments(&args).unwrap();
        let err = req.region().unwrap_err();
        assert_eq!(err.code(), INVALID_ARGUMENT);
    }

    #[test]
    fn test_parse_call_without_arguments() {
        let call = MethodCall::parse(r#"{"method": "foo"}"#).unwrap();
        assert_eq!(call.method, "foo");
        assert!(call.arguments.is_null());
    }

    #[test]
    fn test_parse_call_with_channel() {
        let call = MethodCall::parse(
            r#"{"channel": "other", "method": "captureScreenArea", "arguments": {}}"#,
        )
        .unwrap();
        assert_eq!(call.channel.as_deref(), Some("other"));
        assert!(MethodCall::parse(r#"{"method": "foo"}"#).unwrap().channel.is_none());
    }

    #[test]
    fn test_parse_call_bad_json() {
        assert!(matches!(
            MethodCall::parse("{method"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_captured_response_fields() {
        let region = ScreenRegion::new(0, 0, 1, 1).unwrap();
        let area = CapturedScreenArea::from_buffer(&region, vec![9, 8, 7, 0]).unwrap();

        let resp = MethodResponse::captured(&area);
        let MethodResponse::Success { result } = resp else {
            panic!("expected success");
        };
        assert_eq!(
            result,
            json!({
                "buffer": [9, 8, 7, 0],
                "width": 1,
                "height": 1,
                "bitsPerPixel": 32,
                "bytesPerPixel": 4,
            })
        );
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(
            MethodResponse::NotImplemented.to_json().unwrap(),
            r#"{"status":"notImplemented"}"#
        );

        let err: MethodResponse = CaptureError::failed("BitBlt", "denied").into();
        assert_eq!(
            err.to_json().unwrap(),
            r#"{"status":"error","code":"CAPTURE_FAILED","message":"capture failed at BitBlt: denied"}"#
        );
    }

    #[test]
    fn test_protocol_error_maps_to_invalid_argument() {
        let resp: MethodResponse = ProtocolError::MissingArgument("x").into();
        assert_eq!(
            resp,
            MethodResponse::error(INVALID_ARGUMENT, "missing argument `x`")
        );
    }
}
