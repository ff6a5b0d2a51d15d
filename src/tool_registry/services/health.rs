//! Package reachability probes with a short-lived status cache.

use super::{GetPackageOptions, PackageRegistry};
use crate::config::GatewaySettings;
use crate::error::{GatewayError, GatewayResult};
use crate::tool_registry::{
    domain::{HealthStatus, Package, PackageId},
    ports::{AuthProvider, PackageTransport, TransportError},
};
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Health monitor service.
///
/// A probe lists the package's tools under the probe timeout. Probe failures
/// are reported as states, never as errors.
pub struct HealthMonitor<T, A, C>
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
    statuses: Arc<RwLock<HashMap<PackageId, HealthStatus>>>,
}

impl<T, A, C> Clone for HealthMonitor<T, A, C>
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
            statuses: Arc::clone(&self.statuses),
        }
    }
}

impl<T, A, C> HealthMonitor<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    /// Creates a monitor with an empty status cache.
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
            statuses: Arc::default(),
        }
    }

    /// Returns the health of one package, probing when the cache is stale.
    ///
    /// Disabled packages may be checked for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PackageNotFound`] for unknown identifiers and
    /// [`GatewayError::Internal`] when the status cache is poisoned.
    pub async fn check(&self, package_id: &str, force: bool) -> GatewayResult<HealthStatus> {
        let package = self
            .registry
            .get(package_id, GetPackageOptions::including_disabled())?;

        if !force
            && let Some(cached) = self.cached(package.id())?
            && cached.is_fresh(self.clock.utc(), self.settings.health_ttl())
        {
            debug!(package_id = %package.id(), state = %cached.state(), "health cache hit");
            return Ok(cached);
        }

        let status = self.probe(package).await;
        debug!(package_id = %package.id(), state = %status.state(), "health probe finished");
        self.statuses
            .write()
            .map_err(|err| GatewayError::Internal(format!("health cache lock poisoned: {err}")))?
            .insert(package.id().clone(), status.clone());
        Ok(status)
    }

    /// Returns the cached status without probing.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when the status cache is poisoned.
    pub fn cached(&self, package_id: &PackageId) -> GatewayResult<Option<HealthStatus>> {
        let statuses = self
            .statuses
            .read()
            .map_err(|err| GatewayError::Internal(format!("health cache lock poisoned: {err}")))?;
        Ok(statuses.get(package_id).cloned())
    }

    async fn probe(&self, package: &Package) -> HealthStatus {
        let package_id = package.id().clone();

        if package.requires_oauth() && !self.auth.is_authenticated(&package_id).await {
            return HealthStatus::needs_auth(package_id, self.clock.utc())
                .with_message("authentication has not been completed");
        }

        let outcome = timeout(
            self.settings.probe_timeout(),
            self.transport.list_tools(package),
        )
        .await;
        let checked_at = self.clock.utc();

        match outcome {
            Ok(Ok(tools)) => HealthStatus::healthy(package_id, checked_at)
                .with_message(format!("{} tools available", tools.len())),
            Ok(Err(TransportError::AuthChallenge(challenge))) => {
                HealthStatus::needs_auth(package_id, checked_at).with_message(challenge)
            }
            Ok(Err(err)) => {
                warn!(package_id = %package_id, error = %err, "package unreachable");
                HealthStatus::unreachable(package_id, checked_at, err.to_string())
            }
            Err(_) => {
                warn!(package_id = %package_id, timeout_ms = self.settings.probe_timeout_ms, "health probe timed out");
                HealthStatus::unreachable(
                    package_id,
                    checked_at,
                    format!("probe timed out after {} ms", self.settings.probe_timeout_ms),
                )
            }
        }
    }
}

impl<T, A, C> HealthMonitor<T, A, C>
where
    T: PackageTransport + 'static,
    A: AuthProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Checks every enabled package concurrently.
    ///
    /// Messages are stripped unless `detailed` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when a probe task fails or the
    /// status cache is poisoned.
    pub async fn check_all(
        &self,
        detailed: bool,
        force: bool,
    ) -> GatewayResult<BTreeMap<PackageId, HealthStatus>> {
        let package_ids = self
            .registry
            .enabled()
            .into_iter()
            .map(|package| package.id().clone())
            .collect::<Vec<_>>();
        let statuses = self.check_packages(package_ids, force).await?;
        if detailed {
            return Ok(statuses);
        }
        Ok(statuses
            .into_iter()
            .map(|(package_id, status)| (package_id, status.without_message()))
            .collect())
    }

    /// Checks the named packages concurrently, one probe task per package.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PackageNotFound`] for unknown identifiers and
    /// [`GatewayError::Internal`] when a probe task fails or the status cache
    /// is poisoned.
    pub async fn check_packages(
        &self,
        package_ids: impl IntoIterator<Item = PackageId>,
        force: bool,
    ) -> GatewayResult<BTreeMap<PackageId, HealthStatus>> {
        let mut probes = JoinSet::new();
        for package_id in package_ids {
            let monitor = self.clone();
            probes.spawn(async move { monitor.check(package_id.as_str(), force).await });
        }

        let mut statuses = BTreeMap::new();
        while let Some(joined) = probes.join_next().await {
            let status = joined
                .map_err(|err| GatewayError::Internal(format!("health probe task failed: {err}")))??;
            statuses.insert(status.package_id().clone(), status);
        }
        Ok(statuses)
    }
}
