//! Transport port for reaching downstream packages.

use crate::tool_registry::domain::{Package, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for package transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Connection contract for tool discovery and invocation on a package.
///
/// Implementations own any long-lived connection (child process, HTTP
/// session) for the packages they serve; a connection is never shared across
/// packages.
#[async_trait]
pub trait PackageTransport: Send + Sync {
    /// Lists tools exposed by the package.
    async fn list_tools(&self, package: &Package) -> TransportResult<Vec<ToolDefinition>>;

    /// Invokes one tool and returns its raw result.
    async fn invoke_tool(
        &self,
        package: &Package,
        tool_name: &str,
        arguments: Value,
    ) -> TransportResult<Value>;
}

/// Errors returned by package transport adapters.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The package could not be reached (refused, closed, timed out).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The package answered with an authentication challenge.
    #[error("authentication required: {0}")]
    AuthChallenge(String),

    /// The package answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The package reported a fault while running the tool.
    #[error("{message}")]
    Fault {
        /// Fault message from the package.
        message: String,
        /// Optional structured fault payload, preserved verbatim.
        data: Option<Value>,
    },

    /// Generic adapter failure.
    #[error("transport runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Builds a downstream fault.
    pub fn fault(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Fault {
            message: message.into(),
            data,
        }
    }

    /// Wraps a runtime error from the transport adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
