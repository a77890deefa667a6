//! Request and Response envelope types.
//!
//! Defines the message format for command requests sent to the editor and
//! the responses it returns.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Request
// ============================================================================

/// A command request from the bridge to the editor.
///
/// # Format
///
/// ```json
/// {
///   "type": "add_cube",
///   "params": { "name": "Cube", "position": {"x": 0, "y": 0, "z": 0} }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Tag identifying the requested editor operation.
    #[serde(rename = "type")]
    pub command_type: String,

    /// Operation parameters (possibly empty).
    pub params: Map<String, Value>,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(command_type: impl Into<String>, params: Option<Map<String, Value>>) -> Self {
        Self {
            command_type: command_type.into(),
            params: params.unwrap_or_default(),
        }
    }

    /// Encodes the request into its newline-terminated wire form.
    ///
    /// Non-ASCII characters are emitted literally (serde_json default), so
    /// the encoded size is predictable for the oversized-request check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response envelope from the editor.
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "status": "success",
///   "result": { ... }
/// }
/// ```
///
/// Error:
/// ```json
/// {
///   "status": "error",
///   "error": "error description",
///   "message": "alternate description"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Response status.
    pub status: Status,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error description (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Alternate error description (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Decodes a response envelope from accumulated reply bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] with a truncated payload preview if the
    /// bytes are not valid UTF-8 or not a valid envelope.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            Error::decode(
                format!("reply is not valid UTF-8: {e}"),
                &String::from_utf8_lossy(bytes),
            )
        })?;

        serde_json::from_str(text)
            .map_err(|e| Error::decode(format!("invalid response envelope: {e}"), text))
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Extracts the result payload, surfacing editor-reported errors.
    ///
    /// A success envelope with no `result` field yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] carrying the editor's message verbatim if
    /// the envelope status is `error`. The `error` field is preferred over
    /// `message`.
    pub fn into_result(self) -> Result<Value> {
        match self.status {
            Status::Success => Ok(self.result.unwrap_or_else(|| Value::Object(Map::new()))),
            Status::Error => {
                let message = self
                    .error
                    .or(self.message)
                    .unwrap_or_else(|| "unknown editor error".to_string());
                Err(Error::remote(message))
            }
        }
    }

    /// Gets a string value from the result without consuming the envelope.
    ///
    /// Used on replies whose payload is inspected before (or instead of)
    /// being handed to the caller, such as the ping acknowledgement.
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// Status
// ============================================================================

/// Response status discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================
