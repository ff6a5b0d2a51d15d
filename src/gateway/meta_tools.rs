//! The fixed meta-tool surface and its argument shapes.

use crate::dispatch::Invocation;
use crate::tool_registry::domain::{HealthStatus, ListToolsOptions, Package, PackageId, TransportKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Meta-tools exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaTool {
    /// Enumerate configured packages.
    ListToolPackages,
    /// Enumerate one package's tools.
    ListTools,
    /// Invoke one tool.
    UseTool,
    /// Invoke several tools in parallel.
    MultiUseTool,
    /// Probe every enabled package.
    HealthCheckAll,
    /// Start authentication for a package.
    Authenticate,
}

impl MetaTool {
    /// Every meta-tool, in display order.
    pub const ALL: [Self; 6] = [
        Self::ListToolPackages,
        Self::ListTools,
        Self::UseTool,
        Self::MultiUseTool,
        Self::HealthCheckAll,
        Self::Authenticate,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListToolPackages => "list_tool_packages",
            Self::ListTools => "list_tools",
            Self::UseTool => "use_tool",
            Self::MultiUseTool => "multi_use_tool",
            Self::HealthCheckAll => "health_check_all",
            Self::Authenticate => "authenticate",
        }
    }

    /// Resolves a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for MetaTool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Arguments of `list_tool_packages`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListPackagesArgs {
    /// Exclude experimental packages.
    pub safe_only: bool,
    /// Maximum number of packages.
    pub limit: Option<usize>,
    /// Attach a health status to each package.
    pub include_health: bool,
    /// Include disabled packages.
    pub include_disabled: bool,
}

/// Arguments of `list_tools`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListToolsArgs {
    /// Package to list.
    pub package_id: String,
    /// Paging and rendering options.
    #[serde(flatten)]
    pub options: ListToolsOptions,
}

/// Arguments of `multi_use_tool`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MultiUseToolArgs {
    /// Invocations to run.
    pub invocations: Vec<Invocation>,
    /// Override for the batch worker pool size.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// Arguments of `health_check_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthCheckArgs {
    /// Keep probe messages.
    pub detailed: bool,
    /// Ignore cached statuses.
    pub force: bool,
}

/// Arguments of `authenticate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateArgs {
    /// Package to authenticate.
    pub package_id: String,
    /// Block until the flow completes.
    #[serde(default)]
    pub wait_for_completion: bool,
}

/// Listing form of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    /// Package identifier.
    pub id: PackageId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Transport family.
    pub transport: TransportKind,
    /// Whether OAuth is required.
    pub oauth: bool,
    /// Whether the package is experimental.
    pub experimental: bool,
    /// Whether the package is disabled.
    pub disabled: bool,
    /// Health status, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
}

impl PackageSummary {
    /// Summarises a package without health information.
    #[must_use]
    pub fn from_package(package: &Package) -> Self {
        Self {
            id: package.id().clone(),
            name: package.name().to_owned(),
            description: package.description().to_owned(),
            transport: package.transport_kind(),
            oauth: package.requires_oauth(),
            experimental: package.is_experimental(),
            disabled: package.is_disabled(),
            health: None,
        }
    }
}
