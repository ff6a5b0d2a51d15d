//! Gateway error taxonomy and its stable numeric codes.
//!
//! Every failure that crosses the dispatcher boundary is a [`GatewayError`].
//! Transport, validation and lookup failures are re-classified here, so the
//! code a caller sees depends only on the condition, never on the call path.

use crate::tool_registry::ports::TransportError;
use crate::validation::{FieldError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown package identifier.
    PackageNotFound,
    /// Unknown tool within a known package.
    ToolNotFound,
    /// Arguments rejected by the tool's input schema.
    ArgValidationFailed,
    /// The package could not be reached or answered malformed data.
    PackageUnavailable,
    /// The package needs authentication first.
    AuthRequired,
    /// The package exists but is disabled.
    PackageDisabled,
    /// The package reported a fault while running the tool.
    DownstreamError,
    /// The tool's declared input schema does not compile.
    SchemaInvalid,
    /// A batch invocation did not finish before the batch deadline.
    Timeout,
    /// Malformed meta-tool request.
    InvalidParams,
    /// Unexpected gateway failure.
    Internal,
}

impl ErrorCode {
    /// Returns the numeric wire code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::PackageNotFound => -32001,
            Self::ToolNotFound => -32002,
            Self::ArgValidationFailed => -32003,
            Self::PackageUnavailable => -32004,
            Self::AuthRequired => -32005,
            Self::PackageDisabled => -32006,
            Self::DownstreamError => -32007,
            Self::SchemaInvalid => -32008,
            Self::Timeout => -32009,
            Self::InvalidParams => -32602,
            Self::Internal => -32603,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.as_i32())
    }
}

/// Closed set of failures returned by the gateway core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// No package is configured under the identifier.
    #[error("package not found: {package_id}")]
    PackageNotFound {
        /// Requested package identifier.
        package_id: String,
    },

    /// The package is configured but disabled.
    #[error("package is disabled: {package_id}")]
    PackageDisabled {
        /// Requested package identifier.
        package_id: String,
    },

    /// The package catalog has no tool with this name.
    #[error("tool '{tool_id}' not found in package {package_id}")]
    ToolNotFound {
        /// Package identifier.
        package_id: String,
        /// Requested tool name.
        tool_id: String,
    },

    /// The arguments violate the tool's input schema.
    #[error(
        "arguments for {package_id}/{tool_id} failed validation: {}",
        describe_field_errors(.errors)
    )]
    ArgValidationFailed {
        /// Package identifier.
        package_id: String,
        /// Tool name.
        tool_id: String,
        /// Every violation found.
        errors: Vec<FieldError>,
    },

    /// The tool's declared input schema cannot be compiled.
    #[error("input schema of {package_id}/{tool_id} is invalid: {reason}")]
    SchemaInvalid {
        /// Package identifier.
        package_id: String,
        /// Tool name.
        tool_id: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// The package could not be reached or answered malformed data.
    #[error("package {package_id} is unavailable: {reason}")]
    PackageUnavailable {
        /// Package identifier.
        package_id: String,
        /// Connection or protocol diagnostic.
        reason: String,
    },

    /// The package requires authentication before it can be used.
    #[error("package {package_id} requires authentication: {reason}")]
    AuthRequired {
        /// Package identifier.
        package_id: String,
        /// Challenge or provider detail.
        reason: String,
    },

    /// The package reported a fault; its message and payload are preserved.
    #[error("tool {package_id}/{tool_id} failed: {message}")]
    DownstreamError {
        /// Package identifier.
        package_id: String,
        /// Tool name.
        tool_id: String,
        /// Fault message from the package.
        message: String,
        /// Fault payload from the package, verbatim.
        data: Option<Value>,
    },

    /// A batch invocation was still pending when the batch deadline passed.
    #[error("invocation of {package_id}/{tool_id} timed out after {elapsed_ms} ms")]
    Timeout {
        /// Package identifier.
        package_id: String,
        /// Tool name.
        tool_id: String,
        /// Milliseconds elapsed since the batch started.
        elapsed_ms: u64,
    },

    /// The meta-tool request itself is malformed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Unexpected gateway failure (lock poisoning, task panic).
    #[error("internal gateway error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Builds [`GatewayError::PackageNotFound`].
    pub fn package_not_found(package_id: impl Into<String>) -> Self {
        Self::PackageNotFound {
            package_id: package_id.into(),
        }
    }

    /// Builds [`GatewayError::PackageDisabled`].
    pub fn package_disabled(package_id: impl Into<String>) -> Self {
        Self::PackageDisabled {
            package_id: package_id.into(),
        }
    }

    /// Builds [`GatewayError::ToolNotFound`].
    pub fn tool_not_found(package_id: impl Into<String>, tool_id: impl Into<String>) -> Self {
        Self::ToolNotFound {
            package_id: package_id.into(),
            tool_id: tool_id.into(),
        }
    }

    /// Builds [`GatewayError::PackageUnavailable`].
    pub fn unavailable(package_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PackageUnavailable {
            package_id: package_id.into(),
            reason: reason.into(),
        }
    }

    /// Builds [`GatewayError::AuthRequired`].
    pub fn auth_required(package_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthRequired {
            package_id: package_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PackageNotFound { .. } => ErrorCode::PackageNotFound,
            Self::PackageDisabled { .. } => ErrorCode::PackageDisabled,
            Self::ToolNotFound { .. } => ErrorCode::ToolNotFound,
            Self::ArgValidationFailed { .. } => ErrorCode::ArgValidationFailed,
            Self::SchemaInvalid { .. } => ErrorCode::SchemaInvalid,
            Self::PackageUnavailable { .. } => ErrorCode::PackageUnavailable,
            Self::AuthRequired { .. } => ErrorCode::AuthRequired,
            Self::DownstreamError { .. } => ErrorCode::DownstreamError,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Re-classifies a schema validation failure for a tool.
    #[must_use]
    pub fn from_validation(package_id: &str, tool_id: &str, error: ValidationError) -> Self {
        match error {
            ValidationError::SchemaInvalid { reason } => Self::SchemaInvalid {
                package_id: package_id.to_owned(),
                tool_id: tool_id.to_owned(),
                reason,
            },
            ValidationError::MissingSchema | ValidationError::Violations(_) => {
                Self::ArgValidationFailed {
                    package_id: package_id.to_owned(),
                    tool_id: tool_id.to_owned(),
                    errors: error.field_errors(),
                }
            }
        }
    }

    /// Re-classifies a transport failure raised during tool discovery.
    ///
    /// Discovery that cannot complete is always `PackageUnavailable`, apart
    /// from authentication challenges.
    #[must_use]
    pub fn from_discovery(package_id: &str, error: TransportError) -> Self {
        match error {
            TransportError::AuthChallenge(reason) => Self::auth_required(package_id, reason),
            other => Self::unavailable(package_id, other.to_string()),
        }
    }

    /// Re-classifies a transport failure raised while invoking a tool.
    #[must_use]
    pub fn from_invocation(package_id: &str, tool_id: &str, error: TransportError) -> Self {
        match error {
            TransportError::Fault { message, data } => Self::DownstreamError {
                package_id: package_id.to_owned(),
                tool_id: tool_id.to_owned(),
                message,
                data,
            },
            TransportError::AuthChallenge(reason) => Self::auth_required(package_id, reason),
            other @ (TransportError::Connection(_)
            | TransportError::Protocol(_)
            | TransportError::Runtime(_)) => Self::unavailable(package_id, other.to_string()),
        }
    }

    /// Renders the error in the JSON-RPC error shape.
    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        let data = match self {
            Self::PackageNotFound { package_id }
            | Self::PackageDisabled { package_id }
            | Self::PackageUnavailable { package_id, .. }
            | Self::AuthRequired { package_id, .. } => Some(json!({ "package_id": package_id })),
            Self::ToolNotFound {
                package_id,
                tool_id,
            }
            | Self::SchemaInvalid {
                package_id,
                tool_id,
                ..
            } => Some(json!({ "package_id": package_id, "tool_id": tool_id })),
            Self::ArgValidationFailed {
                package_id,
                tool_id,
                errors,
            } => Some(json!({
                "package_id": package_id,
                "tool_id": tool_id,
                "errors": errors,
            })),
            Self::DownstreamError { data, .. } => data.clone(),
            Self::Timeout {
                package_id,
                tool_id,
                elapsed_ms,
            } => Some(json!({
                "package_id": package_id,
                "tool_id": tool_id,
                "elapsed_ms": elapsed_ms,
            })),
            Self::InvalidParams(_) | Self::Internal(_) => None,
        };

        ErrorPayload {
            code: self.code().as_i32(),
            message: self.to_string(),
            data,
        }
    }
}

/// JSON-RPC style error object returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Structured detail, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn describe_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| {
            if error.path.is_empty() {
                error.message.clone()
            } else {
                format!("{}: {}", error.path, error.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
