// crates/datagate-core/src/core/feature.rs
// ============================================================================
// Module: Feature Configuration Model
// Description: Per-tenant capability group configuration and policy inputs.
// Purpose: Represent the read-only configuration snapshot used for admission.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A tenant has at most one [`GroupConfig`] per [`CapabilityGroup`]. A missing
//! record means the group is disabled with no sub-options and no force mode.
//! [`PolicyInputs`] bundles the configuration with the installed capability
//! set and datasource presence into one point-in-time snapshot.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::catalog::CapabilityGroup;
use crate::core::catalog::SubOption;
use crate::core::identifiers::CapabilityId;

// ============================================================================
// SECTION: Group Configuration
// ============================================================================

/// Configuration record for one capability group of one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Blanket enablement for the group's base operations.
    #[serde(default)]
    pub enabled: bool,
    /// Sub-option flags set on this record.
    #[serde(default)]
    pub options: BTreeSet<SubOption>,
    /// Restrict the catalog to this group plus always-on operations.
    #[serde(default)]
    pub force_mode: bool,
}

impl GroupConfig {
    /// Builds an enabled record with no sub-options.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Returns a copy with the sub-option set.
    #[must_use]
    pub fn with_option(mut self, option: SubOption) -> Self {
        self.options.insert(option);
        self
    }

    /// Returns a copy with force mode set.
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force_mode = true;
        self
    }

    /// Returns true when the sub-option is set on this record.
    #[must_use]
    pub fn has_option(&self, option: SubOption) -> bool {
        self.options.contains(&option)
    }
}

// ============================================================================
// SECTION: Tenant Configuration
// ============================================================================

/// All capability group records for a tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureConfiguration {
    /// Group records keyed by group.
    groups: BTreeMap<CapabilityGroup, GroupConfig>,
}

impl FeatureConfiguration {
    /// Builds an empty configuration (every group disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the group record replaced.
    #[must_use]
    pub fn with_group(mut self, group: CapabilityGroup, config: GroupConfig) -> Self {
        self.groups.insert(group, config);
        self
    }

    /// Replaces the record for a group.
    pub fn insert(&mut self, group: CapabilityGroup, config: GroupConfig) {
        self.groups.insert(group, config);
    }

    /// Returns the record for a group, if one exists.
    #[must_use]
    pub fn get(&self, group: CapabilityGroup) -> Option<&GroupConfig> {
        self.groups.get(&group)
    }

    /// Returns true when the group has a record with `enabled` set.
    #[must_use]
    pub fn is_enabled(&self, group: CapabilityGroup) -> bool {
        self.get(group).is_some_and(|config| config.enabled)
    }

    /// Returns true when any record, enabled or not, sets the sub-option.
    #[must_use]
    pub fn option_set_anywhere(&self, option: SubOption) -> bool {
        self.groups.values().any(|config| config.has_option(option))
    }

    /// Returns the force-mode group, if any.
    ///
    /// When several groups set force mode the group whose wire name sorts
    /// first wins.
    #[must_use]
    pub fn force_group(&self) -> Option<CapabilityGroup> {
        self.groups
            .iter()
            .filter(|(_, config)| config.force_mode)
            .map(|(group, _)| *group)
            .min_by_key(|group| group.as_str())
    }

    /// Iterates over all group records.
    pub fn iter(&self) -> impl Iterator<Item = (CapabilityGroup, &GroupConfig)> {
        self.groups.iter().map(|(group, config)| (*group, config))
    }

    /// Returns true when no group records exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ============================================================================
// SECTION: Policy Inputs
// ============================================================================

/// Point-in-time inputs for one admission or listing decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyInputs {
    /// Tenant capability group configuration.
    pub features: FeatureConfiguration,
    /// Installed capability packages.
    pub installed: BTreeSet<CapabilityId>,
    /// Whether the tenant has a default datasource configured.
    pub has_default_datasource: bool,
}

impl PolicyInputs {
    /// Builds inputs from their parts.
    #[must_use]
    pub const fn new(
        features: FeatureConfiguration,
        installed: BTreeSet<CapabilityId>,
        has_default_datasource: bool,
    ) -> Self {
        Self {
            features,
            installed,
            has_default_datasource,
        }
    }

    /// Returns true when the named capability is installed.
    #[must_use]
    pub fn is_installed(&self, capability: &str) -> bool {
        self.installed.iter().any(|id| id.as_str() == capability)
    }
}
