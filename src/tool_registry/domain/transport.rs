//! Package transport configuration value objects.

use super::{ParseTransportKindError, ToolRegistryDomainError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Transport settings for a package hosted as a local process over STDIO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdioTransportConfig {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_directory: Option<String>,
}

impl StdioTransportConfig {
    /// Creates a new STDIO transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyStdioCommand`] when `command`
    /// is empty after trimming.
    pub fn new(command: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(ToolRegistryDomainError::EmptyStdioCommand);
        }

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: None,
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces process environment variables.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = values.into_iter().collect();
        self
    }

    /// Sets an explicit working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyWorkingDirectory`] when the
    /// provided value is empty after trimming.
    pub fn with_working_directory(
        mut self,
        value: impl Into<String>,
    ) -> Result<Self, ToolRegistryDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyWorkingDirectory);
        }

        self.working_directory = Some(normalized);
        Ok(self)
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment variables.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the optional working directory.
    #[must_use]
    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }
}

/// Transport settings for a package reachable over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    base_url: String,
    headers: BTreeMap<String, String>,
}

impl HttpTransportConfig {
    /// Creates a new HTTP transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when `base_url` is empty or does
    /// not start with `http://` or `https://`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized_base_url = base_url.into().trim().to_owned();
        if normalized_base_url.is_empty() {
            return Err(ToolRegistryDomainError::EmptyHttpBaseUrl);
        }

        let has_valid_prefix = normalized_base_url.starts_with("http://")
            || normalized_base_url.starts_with("https://");
        if !has_valid_prefix {
            return Err(ToolRegistryDomainError::InvalidHttpBaseUrl(
                normalized_base_url,
            ));
        }

        Ok(Self {
            base_url: normalized_base_url,
            headers: BTreeMap::new(),
        })
    }

    /// Replaces the static request headers sent with every call.
    #[must_use]
    pub fn with_headers(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = values.into_iter().collect();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the static request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Discriminant for the supported transport families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Local process over STDIO.
    Stdio,
    /// Remote service over HTTP.
    Http,
}

impl TransportKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransportKind {
    type Error = ParseTransportKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            _ => Err(ParseTransportKindError(value.to_owned())),
        }
    }
}

/// Supported package transport configuration variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "config")]
pub enum TransportConfig {
    /// Package over local process STDIO.
    Stdio(StdioTransportConfig),
    /// Package over HTTP.
    Http(HttpTransportConfig),
}

impl TransportConfig {
    /// Creates a `stdio` transport.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`StdioTransportConfig::new`].
    pub fn stdio(command: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::Stdio(StdioTransportConfig::new(command)?))
    }

    /// Creates an `http` transport.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`HttpTransportConfig::new`].
    pub fn http(base_url: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::Http(HttpTransportConfig::new(base_url)?))
    }

    /// Returns the transport family.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::Stdio(_) => TransportKind::Stdio,
            Self::Http(_) => TransportKind::Http,
        }
    }
}
