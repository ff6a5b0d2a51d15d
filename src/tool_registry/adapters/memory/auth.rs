//! In-memory authentication provider.

use crate::tool_registry::{
    domain::{Package, PackageId},
    ports::{AuthError, AuthFlow, AuthProvider, AuthResult},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory [`AuthProvider`].
///
/// A flow started without waiting stays pending until [`Self::authenticate`]
/// is called, as if the user finished the browser step later. Waiting
/// completes the flow at once.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthProvider {
    state: Arc<RwLock<AuthState>>,
}

#[derive(Debug, Default)]
struct AuthState {
    authenticated: HashSet<PackageId>,
    rejected: HashMap<PackageId, String>,
    begin_calls: usize,
}

impl InMemoryAuthProvider {
    /// Creates a provider with no authenticated packages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a package as authenticated.
    pub fn authenticate(&self, package_id: &PackageId) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
            .insert(package_id.clone());
    }

    /// Forgets a package's credentials.
    pub fn revoke(&self, package_id: &PackageId) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
            .remove(package_id);
    }

    /// Makes every flow for the package fail with `reason`.
    pub fn reject(&self, package_id: &PackageId, reason: impl Into<String>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rejected
            .insert(package_id.clone(), reason.into());
    }

    /// Returns how many flows were started.
    #[must_use]
    pub fn begin_calls(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .begin_calls
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn is_authenticated(&self, package_id: &PackageId) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
            .contains(package_id)
    }

    async fn begin_auth(
        &self,
        package: &Package,
        wait_for_completion: bool,
    ) -> AuthResult<AuthFlow> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.begin_calls += 1;

        if let Some(reason) = state.rejected.get(package.id()) {
            return Err(AuthError::Failed {
                package_id: package.id().clone(),
                reason: reason.clone(),
            });
        }

        if wait_for_completion || state.authenticated.contains(package.id()) {
            state.authenticated.insert(package.id().clone());
            return Ok(AuthFlow::completed(package.id().clone()));
        }

        Ok(AuthFlow::pending(
            package.id().clone(),
            format!("memory://oauth/{}", package.id()),
        ))
    }
}
