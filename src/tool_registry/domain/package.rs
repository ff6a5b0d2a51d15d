//! Package definition: one downstream tool provider.

use super::{PackageId, TransportConfig, TransportKind};
use serde::{Deserialize, Serialize};

/// A configured downstream tool provider.
///
/// Packages are built once while the gateway is configured and are immutable
/// afterwards; the registry owns them for the rest of the process life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    id: PackageId,
    name: String,
    description: String,
    transport: TransportConfig,
    oauth: bool,
    disabled: bool,
    experimental: bool,
}

impl Package {
    /// Creates an enabled package with no authentication requirement.
    ///
    /// The display name defaults to the identifier.
    #[must_use]
    pub fn new(id: PackageId, transport: TransportConfig) -> Self {
        Self {
            name: id.as_str().to_owned(),
            id,
            description: String::new(),
            transport,
            oauth: false,
            disabled: false,
            experimental: false,
        }
    }

    /// Sets the display name. Blank names keep the current value.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let normalized = name.into().trim().to_owned();
        if !normalized.is_empty() {
            self.name = normalized;
        }
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_owned();
        self
    }

    /// Marks whether the package requires OAuth before invocation.
    #[must_use]
    pub const fn with_oauth(mut self, oauth: bool) -> Self {
        self.oauth = oauth;
        self
    }

    /// Marks whether the package is disabled.
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Marks whether the package is flagged unsafe or experimental.
    #[must_use]
    pub const fn with_experimental(mut self, experimental: bool) -> Self {
        self.experimental = experimental;
        self
    }

    /// Returns the package identifier.
    #[must_use]
    pub const fn id(&self) -> &PackageId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the transport settings.
    #[must_use]
    pub const fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Returns the transport family.
    #[must_use]
    pub const fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Returns whether OAuth must complete before invocation.
    #[must_use]
    pub const fn requires_oauth(&self) -> bool {
        self.oauth
    }

    /// Returns whether the package is disabled.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns whether the package is flagged unsafe or experimental.
    #[must_use]
    pub const fn is_experimental(&self) -> bool {
        self.experimental
    }
}
