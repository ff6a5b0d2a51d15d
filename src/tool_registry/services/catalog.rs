//! Lazy, cached and coalesced tool discovery per package.

use super::{GetPackageOptions, PackageRegistry};
use crate::config::GatewaySettings;
use crate::error::{GatewayError, GatewayResult};
use crate::tool_registry::{
    domain::{CatalogEntry, ListToolsOptions, Package, PackageId, Tool, ToolDefinition, ToolPage},
    ports::{AuthProvider, PackageTransport},
};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Cache state and discovery gate of one package.
///
/// `state` is only held for short synchronous sections, so peeks never wait
/// on a discovery. `discovery` admits one discovery at a time.
#[derive(Default)]
struct CatalogSlot {
    state: Mutex<SlotState>,
    discovery: AsyncMutex<()>,
}

#[derive(Default)]
struct SlotState {
    entry: Option<Arc<CatalogEntry>>,
    /// Number of discoveries that have settled, successfully or not.
    settled: u64,
    /// Outcome of the most recent settled discovery.
    last_outcome: Option<GatewayResult<Arc<CatalogEntry>>>,
}

impl CatalogSlot {
    fn state(&self) -> GatewayResult<MutexGuard<'_, SlotState>> {
        self.state
            .lock()
            .map_err(|err| GatewayError::Internal(format!("catalog slot lock poisoned: {err}")))
    }
}

impl SlotState {
    fn settle(&mut self, outcome: &GatewayResult<Arc<CatalogEntry>>) {
        self.entry = outcome.as_ref().ok().cloned();
        self.settled = self.settled.wrapping_add(1);
        self.last_outcome = Some(outcome.clone());
    }
}

/// Tool catalog service.
///
/// Each package owns one slot. Concurrent callers that miss the cache queue
/// on the slot's discovery gate; only the first performs discovery and the
/// rest receive its outcome, whether an entry or an error.
pub struct ToolCatalog<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    registry: Arc<PackageRegistry>,
    transport: Arc<T>,
    auth: Arc<A>,
    clock: Arc<C>,
    settings: GatewaySettings,
    slots: Arc<Mutex<HashMap<PackageId, Arc<CatalogSlot>>>>,
}

impl<T, A, C> Clone for ToolCatalog<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
            auth: Arc::clone(&self.auth),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T, A, C> ToolCatalog<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    /// Creates a catalog with empty caches.
    #[must_use]
    pub fn new(
        registry: Arc<PackageRegistry>,
        transport: Arc<T>,
        auth: Arc<A>,
        clock: Arc<C>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            registry,
            transport,
            auth,
            clock,
            settings,
            slots: Arc::default(),
        }
    }

    /// Returns the package registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<PackageRegistry> {
        &self.registry
    }

    /// Returns the package transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the gateway settings.
    #[must_use]
    pub const fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Returns one page of a package's tools.
    ///
    /// # Errors
    ///
    /// Returns lookup and discovery errors from [`Self::tools`], or
    /// [`GatewayError::InvalidParams`] for an unusable page token.
    pub async fn get_package_tools(
        &self,
        package_id: &str,
        options: &ListToolsOptions,
    ) -> GatewayResult<ToolPage> {
        let package = self.registry.get(package_id, GetPackageOptions::default())?;
        let entry = self.package_entry(package).await?;
        let page_size = self.settings.page_size(options.page_size);

        entry
            .page(
                package.id(),
                options.page_token.as_deref(),
                page_size,
                options.view(),
            )
            .map_err(|err| GatewayError::InvalidParams(err.to_string()))
    }

    /// Returns the full catalog entry for a package.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PackageNotFound`], [`GatewayError::PackageDisabled`],
    /// [`GatewayError::AuthRequired`] or [`GatewayError::PackageUnavailable`].
    pub async fn tools(&self, package_id: &str) -> GatewayResult<Arc<CatalogEntry>> {
        let package = self.registry.get(package_id, GetPackageOptions::default())?;
        self.package_entry(package).await
    }

    /// Finds one tool by name.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::tools`], or [`GatewayError::ToolNotFound`].
    pub async fn find_tool(&self, package_id: &str, tool_id: &str) -> GatewayResult<Tool> {
        let package = self.registry.get(package_id, GetPackageOptions::default())?;
        self.find_package_tool(package, tool_id).await
    }

    /// Finds one tool of an already resolved package.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AuthRequired`], [`GatewayError::PackageUnavailable`]
    /// or [`GatewayError::ToolNotFound`].
    pub async fn find_package_tool(&self, package: &Package, tool_id: &str) -> GatewayResult<Tool> {
        let entry = self.package_entry(package).await?;
        entry
            .find(tool_id)
            .cloned()
            .ok_or_else(|| GatewayError::tool_not_found(package.id().as_str(), tool_id))
    }

    /// Drops the cached entry for a package. Returns whether one existed.
    ///
    /// A discovery already in flight is not cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when the slot table is poisoned.
    pub fn invalidate(&self, package_id: &PackageId) -> GatewayResult<bool> {
        let Some(slot) = self.existing_slot(package_id)? else {
            return Ok(false);
        };
        let dropped = slot.state()?.entry.take().is_some();
        debug!(package_id = %package_id, dropped, "catalog entry invalidated");
        Ok(dropped)
    }

    /// Returns the cached entry without triggering or awaiting discovery.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when the slot table is poisoned.
    pub fn cached_entry(&self, package_id: &PackageId) -> GatewayResult<Option<Arc<CatalogEntry>>> {
        let Some(slot) = self.existing_slot(package_id)? else {
            return Ok(None);
        };
        let entry = slot.state()?.entry.clone();
        Ok(entry)
    }

    async fn package_entry(&self, package: &Package) -> GatewayResult<Arc<CatalogEntry>> {
        if package.requires_oauth() && !self.auth.is_authenticated(package.id()).await {
            return Err(GatewayError::auth_required(
                package.id().as_str(),
                "authenticate the package before listing or invoking its tools",
            ));
        }

        let slot = self.slot(package.id())?;
        let joined = {
            let state = slot.state()?;
            if let Some(entry) = state.entry.as_ref()
                && entry.is_fresh(self.clock.utc(), self.settings.catalog_ttl())
            {
                debug!(package_id = %package.id(), "catalog cache hit");
                return Ok(Arc::clone(entry));
            }
            state.settled
        };

        let _gate = slot.discovery.lock().await;
        let previous = {
            let state = slot.state()?;
            if state.settled != joined
                && let Some(outcome) = state.last_outcome.clone()
            {
                debug!(package_id = %package.id(), "joined in-flight discovery");
                return outcome;
            }
            state.entry.clone()
        };

        debug!(
            package_id = %package.id(),
            expired = previous.is_some(),
            "catalog cache miss"
        );
        let outcome = self
            .discover(package, previous.as_deref())
            .await
            .map(Arc::new);
        slot.state()?.settle(&outcome);
        outcome
    }

    async fn discover(
        &self,
        package: &Package,
        previous: Option<&CatalogEntry>,
    ) -> GatewayResult<CatalogEntry> {
        let package_id = package.id().as_str();
        let limit = self.settings.discovery_timeout();

        let definitions = match timeout(limit, self.transport.list_tools(package)).await {
            Ok(Ok(definitions)) => definitions,
            Ok(Err(err)) => {
                warn!(package_id, error = %err, "tool discovery failed");
                return Err(GatewayError::from_discovery(package_id, err));
            }
            Err(_) => {
                warn!(package_id, timeout_ms = self.settings.discovery_timeout_ms, "tool discovery timed out");
                return Err(GatewayError::unavailable(
                    package_id,
                    format!(
                        "tool discovery timed out after {} ms",
                        self.settings.discovery_timeout_ms
                    ),
                ));
            }
        };
        ensure_unique_names(package_id, &definitions)?;

        let tools = definitions
            .into_iter()
            .map(Tool::from_definition)
            .collect::<Vec<_>>();
        if let Some(previous_entry) = previous {
            log_schema_changes(package_id, previous_entry, &tools);
        }

        let entry = CatalogEntry::new(tools, self.clock.utc());
        info!(
            package_id,
            tool_count = entry.len(),
            revision = entry.revision(),
            "tool discovery completed"
        );
        Ok(entry)
    }

    fn slot(&self, package_id: &PackageId) -> GatewayResult<Arc<CatalogSlot>> {
        let mut slots = self.slots.lock().map_err(|err| {
            GatewayError::Internal(format!("catalog slot table lock poisoned: {err}"))
        })?;
        Ok(Arc::clone(slots.entry(package_id.clone()).or_default()))
    }

    fn existing_slot(&self, package_id: &PackageId) -> GatewayResult<Option<Arc<CatalogSlot>>> {
        let slots = self.slots.lock().map_err(|err| {
            GatewayError::Internal(format!("catalog slot table lock poisoned: {err}"))
        })?;
        Ok(slots.get(package_id).cloned())
    }
}

/// Rejects discovery responses that name the same tool twice.
fn ensure_unique_names(package_id: &str, definitions: &[ToolDefinition]) -> GatewayResult<()> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for definition in definitions {
        if !seen.insert(definition.name()) {
            return Err(GatewayError::unavailable(
                package_id,
                format!(
                    "malformed discovery response: duplicate tool name '{}'",
                    definition.name()
                ),
            ));
        }
    }
    Ok(())
}

fn log_schema_changes(package_id: &str, previous: &CatalogEntry, tools: &[Tool]) {
    for tool in tools {
        if let Some(known) = previous.find(tool.name())
            && known.schema_hash() != tool.schema_hash()
        {
            info!(
                package_id,
                tool = tool.name(),
                previous_hash = %known.schema_hash(),
                schema_hash = %tool.schema_hash(),
                "tool input schema changed"
            );
        }
    }
}
