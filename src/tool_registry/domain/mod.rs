//! Domain model for packages, tool catalogs and package health.
//!
//! The tool registry domain models package identity, transport
//! configuration, discovered tool metadata with schema fingerprints, cached
//! catalog entries and health observations. Infrastructure concerns remain
//! outside this boundary.

mod catalog;
mod error;
mod health;
mod ids;
mod package;
mod schema_hash;
mod tool;
mod transport;

pub use catalog::{
    CatalogEntry, InvalidPageToken, ListToolsOptions, SummaryView, ToolPage, ToolSummary,
};
pub use error::{ParseHealthStateError, ParseTransportKindError, ToolRegistryDomainError};
pub use health::{HealthState, HealthStatus};
pub use ids::PackageId;
pub use package::Package;
pub use schema_hash::SchemaHash;
pub use tool::{Tool, ToolDefinition};
pub use transport::{HttpTransportConfig, StdioTransportConfig, TransportConfig, TransportKind};
