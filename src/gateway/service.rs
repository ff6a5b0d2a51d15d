//! Meta-tool front end over the registry, catalog, health and dispatch
//! services.

use super::meta_tools::{
    AuthenticateArgs, HealthCheckArgs, ListPackagesArgs, ListToolsArgs, MetaTool,
    MultiUseToolArgs, PackageSummary,
};
use crate::config::GatewaySettings;
use crate::dispatch::{Dispatcher, Invocation};
use crate::error::{GatewayError, GatewayResult};
use crate::tool_registry::{
    ports::{AuthFlow, AuthProvider, PackageTransport},
    services::{GetPackageOptions, HealthMonitor, PackageFilter, PackageRegistry, ToolCatalog},
};
use crate::validation::SchemaValidator;
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Routes meta-tool calls to the gateway services.
pub struct ToolGateway<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    registry: Arc<PackageRegistry>,
    auth: Arc<A>,
    dispatcher: Dispatcher<T, A, C>,
    health: HealthMonitor<T, A, C>,
}

impl<T, A, C> Clone for ToolGateway<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            auth: Arc::clone(&self.auth),
            dispatcher: self.dispatcher.clone(),
            health: self.health.clone(),
        }
    }
}

impl<T, A, C> ToolGateway<T, A, C>
where
    T: PackageTransport + 'static,
    A: AuthProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Wires the catalog, health monitor and dispatcher over shared
    /// collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<PackageRegistry>,
        transport: Arc<T>,
        auth: Arc<A>,
        clock: Arc<C>,
        settings: GatewaySettings,
    ) -> Self {
        let catalog = ToolCatalog::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            Arc::clone(&auth),
            Arc::clone(&clock),
            settings,
        );
        let health = HealthMonitor::new(
            Arc::clone(&registry),
            transport,
            Arc::clone(&auth),
            clock,
            settings,
        );
        Self {
            registry,
            auth,
            dispatcher: Dispatcher::new(catalog, Arc::new(SchemaValidator::new())),
            health,
        }
    }

    /// Returns the package registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<PackageRegistry> {
        &self.registry
    }

    /// Returns the tool catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ToolCatalog<T, A, C> {
        self.dispatcher.catalog()
    }

    /// Returns the health monitor.
    #[must_use]
    pub const fn health(&self) -> &HealthMonitor<T, A, C> {
        &self.health
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<T, A, C> {
        &self.dispatcher
    }

    /// Calls a meta-tool by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidParams`] for unknown meta-tools or
    /// malformed arguments, and the failing service's error otherwise.
    pub async fn call(&self, name: &str, arguments: Value) -> GatewayResult<Value> {
        let meta_tool = MetaTool::from_name(name)
            .ok_or_else(|| GatewayError::InvalidParams(format!("unknown meta-tool '{name}'")))?;
        debug!(meta_tool = %meta_tool, "meta-tool call");

        match meta_tool {
            MetaTool::ListToolPackages => self.list_tool_packages(parse(arguments)?).await,
            MetaTool::ListTools => {
                let args: ListToolsArgs = parse(arguments)?;
                let page = self
                    .catalog()
                    .get_package_tools(&args.package_id, &args.options)
                    .await?;
                render(&page)
            }
            MetaTool::UseTool => {
                let invocation: Invocation = parse(arguments)?;
                Ok(self.dispatcher.invoke(&invocation).await?.into_value())
            }
            MetaTool::MultiUseTool => {
                let args: MultiUseToolArgs = parse(arguments)?;
                let results = self
                    .dispatcher
                    .invoke_many(args.invocations, args.max_concurrency)
                    .await;
                Ok(json!({ "results": render(&results)? }))
            }
            MetaTool::HealthCheckAll => {
                let args: HealthCheckArgs = parse(arguments)?;
                let statuses = self.health.check_all(args.detailed, args.force).await?;
                Ok(json!({ "packages": render(&statuses)? }))
            }
            MetaTool::Authenticate => {
                let args: AuthenticateArgs = parse(arguments)?;
                let flow = self.authenticate(&args).await?;
                render(&flow)
            }
        }
    }

    async fn list_tool_packages(&self, args: ListPackagesArgs) -> GatewayResult<Value> {
        let filter = PackageFilter {
            include_disabled: args.include_disabled,
            safe_only: args.safe_only,
            limit: args.limit,
        };

        let listed = self.registry.list(&filter);
        let mut statuses = if args.include_health {
            let package_ids = listed.iter().map(|package| package.id().clone());
            self.health.check_packages(package_ids, false).await?
        } else {
            BTreeMap::new()
        };

        let packages = listed
            .into_iter()
            .map(|package| PackageSummary {
                health: statuses.remove(package.id()),
                ..PackageSummary::from_package(package)
            })
            .collect::<Vec<_>>();
        Ok(json!({ "packages": render(&packages)? }))
    }

    async fn authenticate(&self, args: &AuthenticateArgs) -> GatewayResult<AuthFlow> {
        let package = self
            .registry
            .get(&args.package_id, GetPackageOptions::default())?;
        if !package.requires_oauth() {
            return Ok(AuthFlow::completed(package.id().clone()));
        }

        let flow = self
            .auth
            .begin_auth(package, args.wait_for_completion)
            .await
            .map_err(|err| GatewayError::auth_required(package.id().as_str(), err.to_string()))?;
        debug!(package_id = %package.id(), status = ?flow.status, "authentication flow reported");
        Ok(flow)
    }
}

/// Decodes meta-tool arguments; `null` is read as an empty object.
fn parse<T: DeserializeOwned>(arguments: Value) -> GatewayResult<T> {
    let normalized = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    serde_json::from_value(normalized).map_err(|err| GatewayError::InvalidParams(err.to_string()))
}

fn render<T: Serialize>(value: &T) -> GatewayResult<Value> {
    serde_json::to_value(value).map_err(|err| GatewayError::Internal(err.to_string()))
}
