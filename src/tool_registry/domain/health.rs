//! Package health domain types.

use super::{PackageId, ParseHealthStateError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability and authentication state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Health has not been checked yet.
    Unknown,
    /// The package answered a probe.
    Healthy,
    /// The probe timed out or failed to connect.
    Unreachable,
    /// The package requires authentication before it can answer.
    NeedsAuth,
}

impl HealthState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Unreachable => "unreachable",
            Self::NeedsAuth => "needs_auth",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HealthState {
    type Error = ParseHealthStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "healthy" => Ok(Self::Healthy),
            "unreachable" => Ok(Self::Unreachable),
            "needs_auth" => Ok(Self::NeedsAuth),
            _ => Err(ParseHealthStateError(value.to_owned())),
        }
    }
}

/// Timestamped health observation for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    package_id: PackageId,
    state: HealthState,
    checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl HealthStatus {
    /// Creates a health observation.
    #[must_use]
    pub const fn new(package_id: PackageId, state: HealthState, checked_at: DateTime<Utc>) -> Self {
        Self {
            package_id,
            state,
            checked_at,
            message: None,
        }
    }

    /// Creates a `healthy` observation.
    #[must_use]
    pub const fn healthy(package_id: PackageId, checked_at: DateTime<Utc>) -> Self {
        Self::new(package_id, HealthState::Healthy, checked_at)
    }

    /// Creates an `unreachable` observation with details.
    #[must_use]
    pub fn unreachable(
        package_id: PackageId,
        checked_at: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(package_id, HealthState::Unreachable, checked_at).with_message(message)
    }

    /// Creates a `needs_auth` observation.
    #[must_use]
    pub const fn needs_auth(package_id: PackageId, checked_at: DateTime<Utc>) -> Self {
        Self::new(package_id, HealthState::NeedsAuth, checked_at)
    }

    /// Adds an explanatory message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let normalized = message.into().trim().to_owned();
        if !normalized.is_empty() {
            self.message = Some(normalized);
        }
        self
    }

    /// Drops the explanatory message, keeping only the state.
    #[must_use]
    pub fn without_message(mut self) -> Self {
        self.message = None;
        self
    }

    /// Returns the package identifier.
    #[must_use]
    pub const fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    /// Returns the health state.
    #[must_use]
    pub const fn state(&self) -> HealthState {
        self.state
    }

    /// Returns the probe timestamp.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Returns an optional detail message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns whether this observation is still within `ttl` at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.checked_at) < ttl
    }
}
