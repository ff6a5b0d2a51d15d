//! In-memory package transport for tests and deterministic local flows.

use crate::tool_registry::{
    domain::{Package, PackageId, ToolDefinition},
    ports::{PackageTransport, TransportError, TransportResult},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Canned reply for one tool, optionally delayed.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    result: TransportResult<Value>,
    delay: Duration,
}

impl ScriptedResponse {
    /// Replies with `value`.
    #[must_use]
    pub const fn ok(value: Value) -> Self {
        Self {
            result: Ok(value),
            delay: Duration::ZERO,
        }
    }

    /// Replies with a downstream fault.
    #[must_use]
    pub fn fault(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::error(TransportError::fault(message, data))
    }

    /// Replies with an arbitrary transport error.
    #[must_use]
    pub const fn error(error: TransportError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
        }
    }

    /// Delays the reply by `delay`.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One call observed by [`InMemoryPackageTransport::invoke_tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    /// Target package.
    pub package_id: PackageId,
    /// Target tool.
    pub tool_name: String,
    /// Arguments as forwarded.
    pub arguments: Value,
}

/// In-memory package transport.
///
/// Models catalogs, scripted tool replies, unreachable packages and
/// authentication challenges without any process or network. Tools without a
/// scripted reply echo their arguments back.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPackageTransport {
    state: Arc<RwLock<InMemoryTransportState>>,
}

#[derive(Debug, Default)]
struct InMemoryTransportState {
    catalogs: HashMap<PackageId, Vec<ToolDefinition>>,
    responses: HashMap<(PackageId, String), ScriptedResponse>,
    unreachable: HashMap<PackageId, String>,
    auth_challenges: HashMap<PackageId, String>,
    discovery_delays: HashMap<PackageId, Duration>,
    list_tools_calls: HashMap<PackageId, usize>,
    invocations: Vec<RecordedInvocation>,
}

impl InMemoryPackageTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a tool catalog with a package, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_tool_catalog(
        &self,
        package_id: &PackageId,
        tools: Vec<ToolDefinition>,
    ) -> TransportResult<()> {
        self.write()?.catalogs.insert(package_id.clone(), tools);
        Ok(())
    }

    /// Scripts the reply for one tool.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_response(
        &self,
        package_id: &PackageId,
        tool_name: impl Into<String>,
        response: ScriptedResponse,
    ) -> TransportResult<()> {
        self.write()?
            .responses
            .insert((package_id.clone(), tool_name.into()), response);
        Ok(())
    }

    /// Makes every call to the package fail with a connection error.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_unreachable(
        &self,
        package_id: &PackageId,
        message: impl Into<String>,
    ) -> TransportResult<()> {
        self.write()?
            .unreachable
            .insert(package_id.clone(), message.into().trim().to_owned());
        Ok(())
    }

    /// Restores connectivity for a package.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_reachable(&self, package_id: &PackageId) -> TransportResult<()> {
        self.write()?.unreachable.remove(package_id);
        Ok(())
    }

    /// Makes every call to the package answer with an auth challenge.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_auth_challenge(
        &self,
        package_id: &PackageId,
        challenge: impl Into<String>,
    ) -> TransportResult<()> {
        self.write()?
            .auth_challenges
            .insert(package_id.clone(), challenge.into());
        Ok(())
    }

    /// Delays every `list_tools` reply for the package.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn set_discovery_delay(
        &self,
        package_id: &PackageId,
        delay: Duration,
    ) -> TransportResult<()> {
        self.write()?
            .discovery_delays
            .insert(package_id.clone(), delay);
        Ok(())
    }

    /// Returns how many times `list_tools` was called for the package.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn list_tools_calls(&self, package_id: &PackageId) -> TransportResult<usize> {
        Ok(self
            .read()?
            .list_tools_calls
            .get(package_id)
            .copied()
            .unwrap_or_default())
    }

    /// Returns every invocation received so far, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns transport runtime errors when lock acquisition fails.
    pub fn invocations(&self) -> TransportResult<Vec<RecordedInvocation>> {
        Ok(self.read()?.invocations.clone())
    }

    fn read(&self) -> TransportResult<std::sync::RwLockReadGuard<'_, InMemoryTransportState>> {
        self.state.read().map_err(lock_error)
    }

    fn write(&self) -> TransportResult<std::sync::RwLockWriteGuard<'_, InMemoryTransportState>> {
        self.state.write().map_err(lock_error)
    }
}

impl InMemoryTransportState {
    fn connectivity_error(&self, package_id: &PackageId) -> Option<TransportError> {
        if let Some(message) = self.unreachable.get(package_id) {
            return Some(TransportError::Connection(message.clone()));
        }
        self.auth_challenges
            .get(package_id)
            .map(|challenge| TransportError::AuthChallenge(challenge.clone()))
    }
}

fn lock_error<T>(err: PoisonError<T>) -> TransportError {
    TransportError::runtime(std::io::Error::other(err.to_string()))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl PackageTransport for InMemoryPackageTransport {
    async fn list_tools(&self, package: &Package) -> TransportResult<Vec<ToolDefinition>> {
        let (outcome, delay) = {
            let mut state = self.write()?;
            *state
                .list_tools_calls
                .entry(package.id().clone())
                .or_default() += 1;

            let delay = state
                .discovery_delays
                .get(package.id())
                .copied()
                .unwrap_or_default();
            let outcome = state.connectivity_error(package.id()).map_or_else(
                || {
                    Ok(state
                        .catalogs
                        .get(package.id())
                        .cloned()
                        .unwrap_or_default())
                },
                Err,
            );
            (outcome, delay)
        };

        pause(delay).await;
        outcome
    }

    async fn invoke_tool(
        &self,
        package: &Package,
        tool_name: &str,
        arguments: Value,
    ) -> TransportResult<Value> {
        let scripted = {
            let mut state = self.write()?;
            state.invocations.push(RecordedInvocation {
                package_id: package.id().clone(),
                tool_name: tool_name.to_owned(),
                arguments: arguments.clone(),
            });

            if let Some(error) = state.connectivity_error(package.id()) {
                return Err(error);
            }
            state
                .responses
                .get(&(package.id().clone(), tool_name.to_owned()))
                .cloned()
        };

        match scripted {
            Some(response) => {
                pause(response.delay).await;
                response.result
            }
            None => Ok(json!({ "tool": tool_name, "arguments": arguments })),
        }
    }
}
