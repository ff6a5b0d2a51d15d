//! The meta-tool surface callers use to reach packages.

mod meta_tools;
mod service;

pub use meta_tools::{
    AuthenticateArgs, HealthCheckArgs, ListPackagesArgs, ListToolsArgs, MetaTool,
    MultiUseToolArgs, PackageSummary,
};
pub use service::ToolGateway;
