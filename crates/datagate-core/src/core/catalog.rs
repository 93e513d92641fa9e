// crates/datagate-core/src/core/catalog.rs
// ============================================================================
// Module: Operation Catalog
// Description: Canonical operation names and the static descriptor table.
// Purpose: Single source of truth for listing and admission metadata.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every operation the server can expose has exactly one row in
//! [`OPERATIONS`]. The listing path and the call path both read that row; no
//! other membership table exists.
//!
//! ## Invariants
//! - [`OperationName::all`] and [`OPERATIONS`] share the same order.
//! - Only `health` is always admissible.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Capability Groups
// ============================================================================

/// Named bundle of operations gated by one enablement flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityGroup {
    /// Direct SQL and schema tooling for developers.
    #[serde(rename = "developer-tools")]
    DeveloperTools,
    /// Pre-approved, parameterized queries.
    #[serde(rename = "approved-queries")]
    ApprovedQueries,
    /// Narrow loadout for autonomous agents.
    #[serde(rename = "agent-tools")]
    AgentTools,
    /// Ontology inspection and edits.
    #[serde(rename = "ontology-maintenance")]
    OntologyMaintenance,
}

impl CapabilityGroup {
    /// Returns the stable wire name for the group.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeveloperTools => "developer-tools",
            Self::ApprovedQueries => "approved-queries",
            Self::AgentTools => "agent-tools",
            Self::OntologyMaintenance => "ontology-maintenance",
        }
    }

    /// Returns every capability group.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::DeveloperTools, Self::ApprovedQueries, Self::AgentTools, Self::OntologyMaintenance]
    }

    /// Parses a group from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|group| group.as_str() == name)
    }
}

impl fmt::Display for CapabilityGroup {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Sub-Options
// ============================================================================

/// Where a sub-option must be set to count as an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubOptionScope {
    /// Must be set on the named group, and that group must be enabled.
    Group(CapabilityGroup),
    /// May be set on any group record, regardless of that group's `enabled`.
    Anywhere,
}

/// Named flag that unlocks a narrow operation subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubOption {
    /// Unlocks the mutating `execute` operation.
    EnableExecute,
    /// Unlocks approved-query operations.
    AddQueryTools,
    /// Unlocks ontology maintenance operations.
    AddOntologyMaintenance,
    /// Unlocks ontology question/suggestion operations.
    AddOntologySuggestions,
}

impl SubOption {
    /// Returns the stable wire name for the sub-option.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnableExecute => "enable_execute",
            Self::AddQueryTools => "add_query_tools",
            Self::AddOntologyMaintenance => "add_ontology_maintenance",
            Self::AddOntologySuggestions => "add_ontology_suggestions",
        }
    }

    /// Returns every sub-option.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::EnableExecute,
            Self::AddQueryTools,
            Self::AddOntologyMaintenance,
            Self::AddOntologySuggestions,
        ]
    }

    /// Parses a sub-option from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|option| option.as_str() == name)
    }

    /// Returns where this sub-option must be set to unlock its operations.
    #[must_use]
    pub const fn scope(self) -> SubOptionScope {
        match self {
            Self::EnableExecute => SubOptionScope::Group(CapabilityGroup::DeveloperTools),
            Self::AddQueryTools | Self::AddOntologyMaintenance | Self::AddOntologySuggestions => {
                SubOptionScope::Anywhere
            }
        }
    }
}

impl fmt::Display for SubOption {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Operation Names
// ============================================================================

/// Installed capability required by suggestion-style operations.
pub const AI_DATA_LIAISON: &str = "ai-data-liaison";

/// Canonical operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationName {
    /// Liveness probe.
    Health,
    /// Inspect datasource schema.
    GetSchema,
    /// Run a read-only SQL query.
    Query,
    /// Sample rows from a table.
    Sample,
    /// Validate SQL without running it.
    Validate,
    /// Explain a query plan.
    ExplainQuery,
    /// Run a data-modifying SQL statement.
    Execute,
    /// List approved queries.
    ListApprovedQueries,
    /// Run an approved query by reference.
    ExecuteApprovedQuery,
    /// Propose a new approved query.
    SuggestApprovedQuery,
    /// Read the ontology.
    GetOntology,
    /// Edit an ontology entity.
    UpdateEntity,
    /// Edit an ontology relationship.
    UpdateRelationship,
    /// List open ontology questions.
    ListOntologyQuestions,
    /// Answer an ontology question.
    ResolveOntologyQuestion,
}

impl OperationName {
    /// Returns the canonical string name for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::GetSchema => "get_schema",
            Self::Query => "query",
            Self::Sample => "sample",
            Self::Validate => "validate",
            Self::ExplainQuery => "explain_query",
            Self::Execute => "execute",
            Self::ListApprovedQueries => "list_approved_queries",
            Self::ExecuteApprovedQuery => "execute_approved_query",
            Self::SuggestApprovedQuery => "suggest_approved_query",
            Self::GetOntology => "get_ontology",
            Self::UpdateEntity => "update_entity",
            Self::UpdateRelationship => "update_relationship",
            Self::ListOntologyQuestions => "list_ontology_questions",
            Self::ResolveOntologyQuestion => "resolve_ontology_question",
        }
    }

    /// Returns all operation names in canonical listing order.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        OPERATIONS.iter().map(|descriptor| descriptor.name)
    }

    /// Parses an operation name. Unknown names return `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().find(|op| op.as_str() == name)
    }

    /// Returns the static descriptor for this operation.
    #[must_use]
    pub fn descriptor(self) -> &'static OperationDescriptor {
        // The table holds one row per variant in declaration order.
        &OPERATIONS[self as usize]
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Descriptor Table
// ============================================================================

/// Static admission metadata for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation name.
    pub name: OperationName,
    /// Owning capability group (`None` for always-on operations).
    pub group: Option<CapabilityGroup>,
    /// Sub-option that unlocks the operation, when any.
    pub sub_option: Option<SubOption>,
    /// Installed capability the operation additionally requires.
    pub capability: Option<&'static str>,
    /// Admissible regardless of identity or configuration.
    pub always: bool,
    /// Member of the fixed agent loadout.
    pub agent_limited: bool,
    /// Requires the tenant to have a default datasource configured.
    pub requires_datasource: bool,
    /// Operation may modify customer data or tenant metadata.
    pub modifying: bool,
}

impl OperationDescriptor {
    /// Returns true when the operation is a member of the group.
    ///
    /// The agent loadout counts as the membership of `agent-tools`.
    #[must_use]
    pub fn belongs_to(&self, group: CapabilityGroup) -> bool {
        self.group == Some(group) || (group == CapabilityGroup::AgentTools && self.agent_limited)
    }

    /// Base row for a group-owned, read-only, datasource-backed operation.
    const fn grouped(name: OperationName, group: CapabilityGroup) -> Self {
        Self {
            name,
            group: Some(group),
            sub_option: None,
            capability: None,
            always: false,
            agent_limited: false,
            requires_datasource: true,
            modifying: false,
        }
    }

    /// Returns a copy gated by a sub-option.
    const fn unlocked_by(mut self, option: SubOption) -> Self {
        self.sub_option = Some(option);
        self
    }

    /// Returns a copy requiring an installed capability.
    const fn requires(mut self, capability: &'static str) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Returns a copy marked as part of the agent loadout.
    const fn for_agents(mut self) -> Self {
        self.agent_limited = true;
        self
    }

    /// Returns a copy marked as modifying.
    const fn modifying(mut self) -> Self {
        self.modifying = true;
        self
    }
}

/// Operation descriptor table, in [`OperationName`] declaration order.
pub static OPERATIONS: [OperationDescriptor; 15] = {
    use CapabilityGroup::ApprovedQueries;
    use CapabilityGroup::DeveloperTools;
    use CapabilityGroup::OntologyMaintenance;
    use OperationName as Op;
    [
        OperationDescriptor {
            name: Op::Health,
            group: None,
            sub_option: None,
            capability: None,
            always: true,
            agent_limited: true,
            requires_datasource: false,
            modifying: false,
        },
        OperationDescriptor::grouped(Op::GetSchema, DeveloperTools),
        OperationDescriptor::grouped(Op::Query, DeveloperTools),
        OperationDescriptor::grouped(Op::Sample, DeveloperTools),
        OperationDescriptor::grouped(Op::Validate, DeveloperTools),
        OperationDescriptor::grouped(Op::ExplainQuery, DeveloperTools),
        OperationDescriptor::grouped(Op::Execute, DeveloperTools)
            .unlocked_by(SubOption::EnableExecute)
            .modifying(),
        OperationDescriptor::grouped(Op::ListApprovedQueries, ApprovedQueries)
            .unlocked_by(SubOption::AddQueryTools)
            .for_agents(),
        OperationDescriptor::grouped(Op::ExecuteApprovedQuery, ApprovedQueries)
            .unlocked_by(SubOption::AddQueryTools)
            .for_agents(),
        OperationDescriptor::grouped(Op::SuggestApprovedQuery, ApprovedQueries)
            .unlocked_by(SubOption::AddQueryTools)
            .requires(AI_DATA_LIAISON)
            .modifying(),
        OperationDescriptor::grouped(Op::GetOntology, OntologyMaintenance)
            .unlocked_by(SubOption::AddOntologyMaintenance),
        OperationDescriptor::grouped(Op::UpdateEntity, OntologyMaintenance)
            .unlocked_by(SubOption::AddOntologyMaintenance)
            .modifying(),
        OperationDescriptor::grouped(Op::UpdateRelationship, OntologyMaintenance)
            .unlocked_by(SubOption::AddOntologyMaintenance)
            .modifying(),
        OperationDescriptor::grouped(Op::ListOntologyQuestions, OntologyMaintenance)
            .unlocked_by(SubOption::AddOntologySuggestions)
            .requires(AI_DATA_LIAISON),
        OperationDescriptor::grouped(Op::ResolveOntologyQuestion, OntologyMaintenance)
            .unlocked_by(SubOption::AddOntologySuggestions)
            .requires(AI_DATA_LIAISON)
            .modifying(),
    ]
};
