//! Transport selection by package transport kind.

use crate::tool_registry::{
    domain::{Package, ToolDefinition, TransportKind},
    ports::{PackageTransport, TransportError, TransportResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Routes each call to the transport registered for the package's kind.
///
/// Process and HTTP drivers are supplied by the embedding application; a
/// package whose kind has no registered driver is unreachable.
#[derive(Clone, Default)]
pub struct TransportRouter {
    routes: HashMap<TransportKind, Arc<dyn PackageTransport>>,
}

impl TransportRouter {
    /// Creates a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the transport for `kind`, replacing any previous one.
    #[must_use]
    pub fn with_route(mut self, kind: TransportKind, transport: Arc<dyn PackageTransport>) -> Self {
        self.routes.insert(kind, transport);
        self
    }

    fn route(&self, package: &Package) -> TransportResult<&Arc<dyn PackageTransport>> {
        let kind = package.transport_kind();
        self.routes.get(&kind).ok_or_else(|| {
            TransportError::Connection(format!(
                "no {kind} transport is configured for package {}",
                package.id()
            ))
        })
    }
}

impl fmt::Debug for TransportRouter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds = self.routes.keys().map(|kind| kind.as_str()).collect::<Vec<_>>();
        kinds.sort_unstable();
        formatter
            .debug_struct("TransportRouter")
            .field("routes", &kinds)
            .finish()
    }
}

#[async_trait]
impl PackageTransport for TransportRouter {
    async fn list_tools(&self, package: &Package) -> TransportResult<Vec<ToolDefinition>> {
        self.route(package)?.list_tools(package).await
    }

    async fn invoke_tool(
        &self,
        package: &Package,
        tool_name: &str,
        arguments: Value,
    ) -> TransportResult<Value> {
        self.route(package)?
            .invoke_tool(package, tool_name, arguments)
            .await
    }
}
