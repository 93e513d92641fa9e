// crates/datagate-core/src/core/policy.rs
// ============================================================================
// Module: Catalog Policy Resolver
// Description: Pure admission rule shared by catalog listing and tool calls.
// Purpose: Decide which operations a caller may see and invoke.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`evaluate`] is the only admission rule. [`catalog`] is defined as every
//! operation for which [`evaluate`] admits, so listing and calling cannot
//! disagree.
//!
//! Resolution order for a single operation:
//! 1. Unresolved identity admits only always-on operations.
//! 2. Agents need `agent-tools` enabled and get the fixed agent loadout.
//! 3. Users get group base operations when the group is enabled; sub-option
//!    gated operations follow the sub-option's scope.
//! 4. Force mode intersects with the forced group plus always-on operations.
//! 5. Missing installed capabilities deny.
//! 6. A missing default datasource denies datasource-backed operations.
//!
//! ## Invariants
//! - Force mode only removes operations.
//! - A sub-option under a disabled parent group still unlocks its slice.

use serde::Serialize;

use crate::core::catalog::CapabilityGroup;
use crate::core::catalog::OperationDescriptor;
use crate::core::catalog::OperationName;
use crate::core::catalog::SubOption;
use crate::core::catalog::SubOptionScope;
use crate::core::feature::PolicyInputs;
use crate::core::identifiers::IdentityClass;

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Reason class for a denied admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// Caller identity or tenant could not be resolved.
    IdentityUnresolved,
    /// Tenant configuration does not admit the operation.
    ConfigurationDenies {
        /// Human-readable explanation.
        detail: String,
    },
    /// A required installed capability is absent.
    CapabilityMissing {
        /// Missing capability identifier.
        capability: String,
    },
}

impl DenialReason {
    /// Returns the stable short code for the reason class.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IdentityUnresolved => "identity_unresolved",
            Self::ConfigurationDenies {
                ..
            } => "configuration_denies",
            Self::CapabilityMissing {
                ..
            } => "capability_missing",
        }
    }

    /// Returns a human-readable message for the caller.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::IdentityUnresolved => "caller identity could not be resolved".to_string(),
            Self::ConfigurationDenies {
                detail,
            } => detail.clone(),
            Self::CapabilityMissing {
                capability,
            } => format!("required capability {capability} is not installed"),
        }
    }

    /// Builds the denial for an operation name outside the catalog.
    #[must_use]
    pub fn unknown_operation(name: &str) -> Self {
        Self::config(format!("unknown operation {name}"))
    }

    /// Builds a configuration denial.
    fn config(detail: impl Into<String>) -> Self {
        Self::ConfigurationDenies {
            detail: detail.into(),
        }
    }
}

/// Admission outcome for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// Operation is admissible.
    Admit,
    /// Operation is not admissible.
    Deny(DenialReason),
}

impl AdmissionDecision {
    /// Returns true when the operation is admissible.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }

    /// Returns the denial reason, when denied.
    #[must_use]
    pub const fn denial(&self) -> Option<&DenialReason> {
        match self {
            Self::Admit => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Evaluates admission for one operation.
#[must_use]
pub fn evaluate(
    op: OperationName,
    identity: IdentityClass,
    inputs: &PolicyInputs,
) -> AdmissionDecision {
    match evaluate_descriptor(op.descriptor(), identity, inputs) {
        Ok(()) => AdmissionDecision::Admit,
        Err(reason) => AdmissionDecision::Deny(reason),
    }
}

/// Evaluates admission for an operation given by name.
///
/// Unknown names are never admissible.
#[must_use]
pub fn evaluate_named(
    name: &str,
    identity: IdentityClass,
    inputs: &PolicyInputs,
) -> AdmissionDecision {
    OperationName::parse(name).map_or_else(
        || AdmissionDecision::Deny(DenialReason::unknown_operation(name)),
        |op| evaluate(op, identity, inputs),
    )
}

/// Returns true when the operation is admissible.
#[must_use]
pub fn admissible(op: OperationName, identity: IdentityClass, inputs: &PolicyInputs) -> bool {
    evaluate(op, identity, inputs).is_admitted()
}

/// Returns every admissible operation in canonical listing order.
#[must_use]
pub fn catalog(identity: IdentityClass, inputs: &PolicyInputs) -> Vec<OperationName> {
    OperationName::all().filter(|op| admissible(*op, identity, inputs)).collect()
}

/// Applies the resolution steps to one descriptor.
fn evaluate_descriptor(
    descriptor: &OperationDescriptor,
    identity: IdentityClass,
    inputs: &PolicyInputs,
) -> Result<(), DenialReason> {
    if descriptor.always {
        return Ok(());
    }
    match identity {
        IdentityClass::Unresolved => return Err(DenialReason::IdentityUnresolved),
        IdentityClass::Agent => agent_base(descriptor, inputs)?,
        IdentityClass::User => user_base(descriptor, inputs)?,
    }
    if let Some(forced) = inputs.features.force_group()
        && !descriptor.belongs_to(forced)
    {
        return Err(DenialReason::config(format!("force mode restricts catalog to {forced}")));
    }
    if let Some(capability) = descriptor.capability
        && !inputs.is_installed(capability)
    {
        return Err(DenialReason::CapabilityMissing {
            capability: capability.to_string(),
        });
    }
    if descriptor.requires_datasource && !inputs.has_default_datasource {
        return Err(DenialReason::config("no default datasource configured"));
    }
    Ok(())
}

/// Base admission for agent callers.
fn agent_base(descriptor: &OperationDescriptor, inputs: &PolicyInputs) -> Result<(), DenialReason> {
    if !inputs.features.is_enabled(CapabilityGroup::AgentTools) {
        return Err(DenialReason::config("agent tools disabled"));
    }
    if !descriptor.agent_limited {
        return Err(DenialReason::config(format!(
            "{} is not available to agents",
            descriptor.name
        )));
    }
    Ok(())
}

/// Base admission for user and service callers.
fn user_base(descriptor: &OperationDescriptor, inputs: &PolicyInputs) -> Result<(), DenialReason> {
    let features = &inputs.features;
    match (descriptor.group, descriptor.sub_option) {
        (None, _) => Err(DenialReason::config(format!("{} has no owning group", descriptor.name))),
        (Some(group), None) => {
            if features.is_enabled(group) {
                Ok(())
            } else {
                Err(DenialReason::config(format!("{group} disabled")))
            }
        }
        (Some(_), Some(option)) => match option.scope() {
            SubOptionScope::Group(scope_group) => {
                let Some(config) = features.get(scope_group).filter(|config| config.enabled)
                else {
                    return Err(DenialReason::config(format!("{scope_group} disabled")));
                };
                if config.has_option(option) {
                    Ok(())
                } else {
                    Err(DenialReason::config(format!("{} sub-option disabled", short_label(option))))
                }
            }
            SubOptionScope::Anywhere => {
                if features.option_set_anywhere(option) {
                    Ok(())
                } else {
                    Err(DenialReason::config(format!("{option} sub-option disabled")))
                }
            }
        },
    }
}

/// Returns the short label used in denial messages for group-scoped options.
const fn short_label(option: SubOption) -> &'static str {
    match option {
        SubOption::EnableExecute => "execute",
        other => other.as_str(),
    }
}
