//! Gateway configuration loaded from TOML.
//!
//! The embedding binary reads the file; this module only parses text and
//! turns package tables into validated [`Package`] values.

use crate::tool_registry::domain::{
    HttpTransportConfig, Package, PackageId, StdioTransportConfig, ToolRegistryDomainError,
    TransportConfig, TransportKind,
};
use crate::tool_registry::services::{PackageRegistry, RegistryBuildError};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Tunables for caching, timeouts, pagination and batch concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Default parallelism for `invoke_many`.
    pub max_concurrency: usize,
    /// Outer deadline for a whole batch, in milliseconds.
    pub batch_timeout_ms: u64,
    /// Catalog cache lifetime, in seconds.
    pub catalog_ttl_secs: u64,
    /// Health cache lifetime, in seconds.
    pub health_ttl_secs: u64,
    /// Upper bound for one health probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Upper bound for one tool discovery, in milliseconds.
    pub discovery_timeout_ms: u64,
    /// Page size used when a listing does not ask for one.
    pub default_page_size: usize,
    /// Largest page size a caller may request.
    pub max_page_size: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            batch_timeout_ms: 60_000,
            catalog_ttl_secs: 300,
            health_ttl_secs: 30,
            probe_timeout_ms: 5_000,
            discovery_timeout_ms: 30_000,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl GatewaySettings {
    /// Returns the batch deadline.
    #[must_use]
    pub const fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    /// Returns the health probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Returns the discovery timeout.
    #[must_use]
    pub const fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// Returns the catalog cache lifetime.
    #[must_use]
    pub fn catalog_ttl(&self) -> TimeDelta {
        seconds(self.catalog_ttl_secs)
    }

    /// Returns the health cache lifetime.
    #[must_use]
    pub fn health_ttl(&self) -> TimeDelta {
        seconds(self.health_ttl_secs)
    }

    /// Resolves the worker pool size for a batch of `batch_size` invocations.
    ///
    /// The result lies in `1..=min(batch_size, Semaphore::MAX_PERMITS)`, so
    /// oversized requests are capped rather than rejected.
    #[must_use]
    pub fn concurrency_limit(&self, requested: Option<usize>, batch_size: usize) -> usize {
        let ceiling = batch_size.clamp(1, Semaphore::MAX_PERMITS);
        requested.unwrap_or(self.max_concurrency).clamp(1, ceiling)
    }

    /// Resolves a requested page size into `1..=max_page_size`.
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

fn seconds(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// One `[[packages]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Package identifier.
    pub id: String,
    /// Display name; defaults to the identifier.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Transport family.
    pub transport: TransportKind,
    /// Executable for `stdio` packages.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments for `stdio` packages.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment for `stdio` packages.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory for `stdio` packages.
    #[serde(default)]
    pub working_directory: Option<String>,
    /// Endpoint for `http` packages.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Extra request headers for `http` packages.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Whether the package needs OAuth before use.
    #[serde(default)]
    pub oauth: bool,
    /// Whether the package is switched off.
    #[serde(default)]
    pub disabled: bool,
    /// Whether the package is flagged experimental.
    #[serde(default)]
    pub experimental: bool,
}

impl PackageConfig {
    /// Validates the table and builds a [`Package`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the transport's required
    /// field is absent and [`ConfigError::InvalidPackage`] when a domain
    /// constructor rejects a value.
    pub fn into_package(self) -> Result<Package, ConfigError> {
        let id = PackageId::new(self.id.as_str()).map_err(|source| ConfigError::InvalidPackage {
            package_id: self.id.clone(),
            source,
        })?;
        let invalid = |source| ConfigError::InvalidPackage {
            package_id: id.to_string(),
            source,
        };

        let transport = match self.transport {
            TransportKind::Stdio => {
                let command = self.command.ok_or_else(|| ConfigError::MissingField {
                    package_id: id.to_string(),
                    field: "command",
                })?;
                let mut stdio = StdioTransportConfig::new(command)
                    .map_err(invalid)?
                    .with_args(self.args)
                    .with_env(self.env);
                if let Some(directory) = self.working_directory {
                    stdio = stdio.with_working_directory(directory).map_err(invalid)?;
                }
                TransportConfig::Stdio(stdio)
            }
            TransportKind::Http => {
                let base_url = self.base_url.ok_or_else(|| ConfigError::MissingField {
                    package_id: id.to_string(),
                    field: "base_url",
                })?;
                TransportConfig::Http(
                    HttpTransportConfig::new(base_url)
                        .map_err(invalid)?
                        .with_headers(self.headers),
                )
            }
        };

        Ok(Package::new(id, transport)
            .with_name(self.name.unwrap_or_default())
            .with_description(self.description.unwrap_or_default())
            .with_oauth(self.oauth)
            .with_disabled(self.disabled)
            .with_experimental(self.experimental))
    }
}

/// Whole gateway configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway tunables.
    pub settings: GatewaySettings,
    /// Package tables in configuration order.
    pub packages: Vec<PackageConfig>,
}

impl GatewayConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown
    /// transport kinds.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Validates every package and builds the registry.
    ///
    /// # Errors
    ///
    /// Returns the first package validation failure, or
    /// [`ConfigError::Registry`] when two packages share an identifier.
    pub fn into_registry(self) -> Result<(GatewaySettings, PackageRegistry), ConfigError> {
        let packages = self
            .packages
            .into_iter()
            .map(PackageConfig::into_package)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((self.settings, PackageRegistry::new(packages)?))
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML for this schema.
    #[error("failed to parse gateway configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A transport-specific field is absent.
    #[error("package {package_id}: missing required field '{field}'")]
    MissingField {
        /// Package identifier as written.
        package_id: String,
        /// Missing field name.
        field: &'static str,
    },

    /// A domain constructor rejected a value.
    #[error("package {package_id}: {source}")]
    InvalidPackage {
        /// Package identifier as written.
        package_id: String,
        /// Validation failure.
        source: ToolRegistryDomainError,
    },

    /// The registry could not be built.
    #[error(transparent)]
    Registry(#[from] RegistryBuildError),
}
