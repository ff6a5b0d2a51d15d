//! Authentication port for OAuth-gated packages.

use crate::tool_registry::domain::{Package, PackageId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Collaborator that owns the OAuth flow for packages.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns whether the package has completed authentication.
    async fn is_authenticated(&self, package_id: &PackageId) -> bool;

    /// Starts (or resumes) the authentication flow for a package.
    ///
    /// When `wait_for_completion` is set the provider may block until the
    /// flow finishes.
    async fn begin_auth(
        &self,
        package: &Package,
        wait_for_completion: bool,
    ) -> AuthResult<AuthFlow>;
}

/// Progress of an authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlowStatus {
    /// The user still has to complete the flow.
    Pending,
    /// The package is authenticated.
    Completed,
}

/// Snapshot of an authentication flow returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFlow {
    /// Package being authenticated.
    pub package_id: PackageId,
    /// Current progress.
    pub status: AuthFlowStatus,
    /// URL the user should open, when the flow is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
}

impl AuthFlow {
    /// Creates a completed flow.
    #[must_use]
    pub const fn completed(package_id: PackageId) -> Self {
        Self {
            package_id,
            status: AuthFlowStatus::Completed,
            authorization_url: None,
        }
    }

    /// Creates a pending flow with the URL the user must visit.
    #[must_use]
    pub fn pending(package_id: PackageId, authorization_url: impl Into<String>) -> Self {
        Self {
            package_id,
            status: AuthFlowStatus::Pending,
            authorization_url: Some(authorization_url.into()),
        }
    }
}

/// Errors returned by authentication providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The flow could not be started or was rejected.
    #[error("authentication failed for package {package_id}: {reason}")]
    Failed {
        /// Package being authenticated.
        package_id: PackageId,
        /// Provider-supplied reason.
        reason: String,
    },
}
