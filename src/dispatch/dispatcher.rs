//! Single and batched tool invocation.

use super::{Invocation, InvocationResult, InvokeOutcome};
use crate::error::{GatewayError, GatewayResult};
use crate::tool_registry::{
    ports::{AuthProvider, PackageTransport},
    services::{GetPackageOptions, ToolCatalog},
};
use crate::validation::SchemaValidator;
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

/// Routes invocations to packages after lookup and argument validation.
pub struct Dispatcher<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    catalog: ToolCatalog<T, A, C>,
    validator: Arc<SchemaValidator>,
}

impl<T, A, C> Clone for Dispatcher<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            validator: Arc::clone(&self.validator),
        }
    }
}

impl<T, A, C> Dispatcher<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher over a catalog and a shared validator.
    #[must_use]
    pub const fn new(catalog: ToolCatalog<T, A, C>, validator: Arc<SchemaValidator>) -> Self {
        Self { catalog, validator }
    }

    /// Returns the catalog used for tool lookup.
    #[must_use]
    pub const fn catalog(&self) -> &ToolCatalog<T, A, C> {
        &self.catalog
    }

    /// Runs one invocation.
    ///
    /// Arguments are validated for dry runs too; a dry run never reaches the
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns exactly one [`GatewayError`] describing the first failing
    /// step: package lookup, tool lookup, validation, or the downstream call.
    pub async fn invoke(&self, invocation: &Invocation) -> GatewayResult<InvokeOutcome> {
        let package = self
            .catalog
            .registry()
            .get(&invocation.package_id, GetPackageOptions::default())?;
        let tool = self
            .catalog
            .find_package_tool(package, &invocation.tool_id)
            .await?;
        let package_id = package.id().as_str();

        let arguments = invocation.arguments();
        self.validator
            .validate_tool(&tool, &arguments)
            .map_err(|err| GatewayError::from_validation(package_id, tool.name(), err))?;

        if invocation.dry_run {
            debug!(package_id, tool = tool.name(), "dry run validated");
            return Ok(InvokeOutcome::Validated {
                package_id: package_id.to_owned(),
                tool_id: tool.name().to_owned(),
                schema_hash: tool.schema_hash().clone(),
            });
        }

        debug!(package_id, tool = tool.name(), "forwarding invocation");
        match self
            .catalog
            .transport()
            .invoke_tool(package, tool.name(), arguments)
            .await
        {
            Ok(value) => Ok(InvokeOutcome::Completed(value)),
            Err(err) => {
                let error = GatewayError::from_invocation(package_id, tool.name(), err);
                warn!(package_id, tool = tool.name(), code = %error.code(), error = %error, "invocation failed");
                Err(error)
            }
        }
    }
}

impl<T, A, C> Dispatcher<T, A, C>
where
    T: PackageTransport + 'static,
    A: AuthProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Runs invocations in parallel and returns one result per input, in
    /// input order.
    ///
    /// At most `max_concurrency` invocations are in flight. The value defaults
    /// from settings and is clamped to `1..=min(invocations.len(),
    /// Semaphore::MAX_PERMITS)`. Invocations still pending when the batch
    /// deadline passes are cancelled and reported as timeouts; a failure
    /// never affects its siblings.
    pub async fn invoke_many(
        &self,
        invocations: Vec<Invocation>,
        max_concurrency: Option<usize>,
    ) -> Vec<InvocationResult> {
        if invocations.is_empty() {
            return Vec::new();
        }

        let span = info_span!(
            "invoke_many",
            batch_id = %Uuid::new_v4(),
            size = invocations.len()
        );
        self.run_batch(invocations, max_concurrency)
            .instrument(span)
            .await
    }

    async fn run_batch(
        &self,
        invocations: Vec<Invocation>,
        max_concurrency: Option<usize>,
    ) -> Vec<InvocationResult> {
        let settings = *self.catalog.settings();
        let started = Instant::now();
        let deadline = started + settings.batch_timeout();
        let permits = Arc::new(Semaphore::new(
            settings.concurrency_limit(max_concurrency, invocations.len()),
        ));

        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(invocations.len());
        for (index, invocation) in invocations.iter().cloned().enumerate() {
            let handle = tasks.spawn(
                self.clone()
                    .invoke_with_permit(Arc::clone(&permits), invocation),
            );
            positions.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<InvocationResult>> = vec![None; invocations.len()];
        loop {
            match timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(joined)) => {
                    let (task_id, outcome) = match joined {
                        Ok((task_id, outcome)) => (task_id, outcome),
                        Err(err) => (err.id(), Err(task_failure(&err))),
                    };
                    if let Some(&index) = positions.get(&task_id)
                        && let (Some(slot), Some(invocation)) =
                            (slots.get_mut(index), invocations.get(index))
                    {
                        *slot = Some(settle(index, invocation, outcome));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = tasks.len(),
                        timeout_ms = settings.batch_timeout_ms,
                        "batch deadline elapsed; cancelling pending invocations"
                    );
                    tasks.shutdown().await;
                    break;
                }
            }
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        invocations
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (invocation, slot))| {
                slot.unwrap_or_else(|| {
                    InvocationResult::failed(
                        index,
                        invocation,
                        &GatewayError::Timeout {
                            package_id: invocation.package_id.clone(),
                            tool_id: invocation.tool_id.clone(),
                            elapsed_ms,
                        },
                    )
                })
            })
            .collect()
    }
}

impl<T, A, C> Dispatcher<T, A, C>
where
    T: PackageTransport,
    A: AuthProvider,
    C: Clock + Send + Sync,
{
    async fn invoke_with_permit(
        self,
        permits: Arc<Semaphore>,
        invocation: Invocation,
    ) -> GatewayResult<Value> {
        let _permit = permits
            .acquire_owned()
            .await
            .map_err(|err| GatewayError::Internal(format!("concurrency limiter closed: {err}")))?;
        self.invoke(&invocation).await.map(InvokeOutcome::into_value)
    }
}

fn settle(
    index: usize,
    invocation: &Invocation,
    outcome: GatewayResult<Value>,
) -> InvocationResult {
    match outcome {
        Ok(value) => InvocationResult::succeeded(index, invocation, value),
        Err(error) => InvocationResult::failed(index, invocation, &error),
    }
}

fn task_failure(err: &JoinError) -> GatewayError {
    if err.is_panic() {
        GatewayError::Internal("invocation task panicked".to_owned())
    } else {
        GatewayError::Internal(format!("invocation task failed: {err}"))
    }
}
