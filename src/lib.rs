//! Switchyard: a tool gateway in front of many downstream tool packages.
//!
//! Callers see a fixed set of meta-tools for discovering packages, listing
//! their tools, invoking one or many tools, checking health and starting
//! authentication. Behind that surface each package speaks its own transport
//! and exposes its own tool catalog.
//!
//! # Architecture
//!
//! Switchyard follows hexagonal architecture principles:
//!
//! - **Domain**: packages, tools, schema fingerprints, catalog entries
//! - **Ports**: package transport and authentication traits
//! - **Adapters**: in-memory transports, a transport router, an auth provider
//! - **Services**: registry, catalog, health monitor and dispatcher
//!
//! # Modules
//!
//! - [`tool_registry`]: package registry, tool catalog and package health
//! - [`validation`]: JSON Schema argument validation
//! - [`dispatch`]: single and batched invocation
//! - [`gateway`]: the meta-tool front end
//! - [`config`]: TOML configuration
//! - [`error`]: the gateway error taxonomy and its stable codes

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod tool_registry;
pub mod validation;
