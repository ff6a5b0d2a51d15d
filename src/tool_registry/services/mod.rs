//! Application services for package lookup, tool discovery and health.

mod catalog;
mod health;
mod registry;

pub use catalog::ToolCatalog;
pub use health::HealthMonitor;
pub use registry::{GetPackageOptions, PackageFilter, PackageRegistry, RegistryBuildError};
