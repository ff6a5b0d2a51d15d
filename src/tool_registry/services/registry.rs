//! Read-only table of configured packages.

use crate::error::{GatewayError, GatewayResult};
use crate::tool_registry::domain::{Package, PackageId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building a [`PackageRegistry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryBuildError {
    /// Two packages share an identifier.
    #[error("package {0} is configured more than once")]
    DuplicatePackage(PackageId),
}

/// Listing filter for [`PackageRegistry::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageFilter {
    /// Include disabled packages.
    pub include_disabled: bool,
    /// Exclude experimental packages.
    pub safe_only: bool,
    /// Maximum number of packages returned.
    pub limit: Option<usize>,
}

/// Lookup switches for [`PackageRegistry::get`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetPackageOptions {
    /// Resolve disabled packages instead of rejecting them.
    pub include_disabled: bool,
}

impl GetPackageOptions {
    /// Options that also resolve disabled packages.
    #[must_use]
    pub const fn including_disabled() -> Self {
        Self {
            include_disabled: true,
        }
    }
}

/// Authoritative set of packages, in configuration order.
///
/// The registry is built once and never mutated, so it is shared as
/// `Arc<PackageRegistry>` without locking.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: Vec<Package>,
    positions: HashMap<PackageId, usize>,
}

impl PackageRegistry {
    /// Builds a registry from packages in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryBuildError::DuplicatePackage`] on a repeated id.
    pub fn new(packages: Vec<Package>) -> Result<Self, RegistryBuildError> {
        let mut positions = HashMap::with_capacity(packages.len());
        for (position, package) in packages.iter().enumerate() {
            if positions.insert(package.id().clone(), position).is_some() {
                return Err(RegistryBuildError::DuplicatePackage(package.id().clone()));
            }
        }
        Ok(Self {
            packages,
            positions,
        })
    }

    /// Lists packages matching `filter`, in configuration order.
    #[must_use]
    pub fn list(&self, filter: &PackageFilter) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|package| filter.include_disabled || !package.is_disabled())
            .filter(|package| !filter.safe_only || !package.is_experimental())
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Returns every enabled package.
    #[must_use]
    pub fn enabled(&self) -> Vec<&Package> {
        self.list(&PackageFilter::default())
    }

    /// Resolves a package by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PackageNotFound`] for unknown identifiers and
    /// [`GatewayError::PackageDisabled`] for disabled packages unless
    /// `options.include_disabled` is set.
    pub fn get(&self, package_id: &str, options: GetPackageOptions) -> GatewayResult<&Package> {
        let package = self
            .lookup(package_id)
            .ok_or_else(|| GatewayError::package_not_found(package_id))?;
        if package.is_disabled() && !options.include_disabled {
            return Err(GatewayError::package_disabled(package.id().as_str()));
        }
        Ok(package)
    }

    /// Returns whether a package with this identifier is configured.
    #[must_use]
    pub fn contains(&self, package_id: &str) -> bool {
        self.lookup(package_id).is_some()
    }

    /// Returns the number of configured packages, disabled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns whether no packages are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn lookup(&self, package_id: &str) -> Option<&Package> {
        let normalized = PackageId::new(package_id).ok()?;
        self.positions
            .get(&normalized)
            .and_then(|position| self.packages.get(*position))
    }
}
