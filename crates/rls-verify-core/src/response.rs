// crates/rls-verify-core/src/response.rs
// ============================================================================
// Module: REST Responses
// Description: Raw status/body pairs and open-row decoding helpers.
// Purpose: Let assertions inspect non-2xx statuses before any decoding.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! REST calls return a [`RestResponse`] without interpreting the status.
//! Rows are decoded on demand into open JSON objects ([`Row`]); callers pick
//! the fields they need through [`RowExt`] instead of a fixed schema.

use serde_json::Map;
use serde_json::Value;

use crate::error::ProbeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of body characters carried into failure details.
pub const BODY_SNIPPET_CHARS: usize = 200;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One decoded row: an open mapping from column name to JSON value.
pub type Row = Map<String, Value>;

/// Undecoded HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl RestResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns at most [`BODY_SNIPPET_CHARS`] characters of the body.
    #[must_use]
    pub fn snippet(&self) -> String {
        self.body.chars().take(BODY_SNIPPET_CHARS).collect()
    }

    /// Decodes the body as a JSON array of objects.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Decode`] when the body is not an array of objects.
    pub fn rows(&self, target: &str) -> Result<Vec<Row>, ProbeError> {
        let value: Value = serde_json::from_str(&self.body).map_err(|err| ProbeError::Decode {
            target: target.to_string(),
            message: err.to_string(),
        })?;
        let Value::Array(items) = value else {
            return Err(ProbeError::Decode {
                target: target.to_string(),
                message: "expected a JSON array".to_string(),
            });
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(ProbeError::Decode {
                    target: target.to_string(),
                    message: format!("expected object rows, found {other}"),
                }),
            })
            .collect()
    }

    /// Returns the `id` of the first returned row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Decode`] when the body is not an array of objects.
    pub fn first_row_id(&self, target: &str) -> Result<Option<String>, ProbeError> {
        Ok(self.rows(target)?.first().and_then(|row| row.field_text("id")))
    }
}

// ============================================================================
// SECTION: Row Accessors
// ============================================================================

/// Typed accessors over an open [`Row`].
pub trait RowExt {
    /// Returns a string field, or `None` when missing or not a string.
    fn str_field(&self, field: &str) -> Option<&str>;

    /// Returns a scalar field rendered as text (strings unquoted).
    fn field_text(&self, field: &str) -> Option<String>;
}

impl RowExt for Row {
    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn field_text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
