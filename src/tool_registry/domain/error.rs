//! Error types for package registry domain validation.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The package identifier is empty after trimming.
    #[error("package id must not be empty")]
    EmptyPackageId,

    /// The package identifier contains characters outside `[a-z0-9_-]`.
    #[error(
        "package id '{0}' contains invalid characters (only lowercase alphanumeric, '-' and '_' allowed)"
    )]
    InvalidPackageId(String),

    /// The package identifier exceeds the 100-character limit.
    #[error("package id exceeds 100 character limit: {0}")]
    PackageIdTooLong(String),

    /// The STDIO command is empty.
    #[error("STDIO command must not be empty")]
    EmptyStdioCommand,

    /// The STDIO working directory is empty after trimming.
    #[error("STDIO working directory must not be empty when provided")]
    EmptyWorkingDirectory,

    /// The HTTP base URL is empty.
    #[error("HTTP base URL must not be empty")]
    EmptyHttpBaseUrl,

    /// The HTTP base URL does not have an `http://` or `https://` prefix.
    #[error("HTTP base URL '{0}' must start with 'http://' or 'https://'")]
    InvalidHttpBaseUrl(String),

    /// A tool definition name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,
}

/// Error returned while parsing a health state from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown package health state: {0}")]
pub struct ParseHealthStateError(pub String);

/// Error returned while parsing a transport kind from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown transport kind: {0}")]
pub struct ParseTransportKindError(pub String);
