//! Rampart Authorization - Group Permission Compiler
//!
//! This crate compiles filter-based group grants into concrete per-resource
//! permissions for one principal:
//!
//! - Filters: `SetFilter`, `EnvironmentFilter`, `WorkflowFilter`, `ResourceFilter`
//! - Groups: `Group`, `ResourceGrant`, default group templates
//! - Scope resolution: which applications to load, per resource kind
//! - Filter evaluation: matched resource ids per grant and application
//! - Aggregation: `ApplicationSummary` per application
//! - Indexing: `PermissionIndex` with action-keyed `AuthorizationIndex`es
//! - Enforcement helpers: `authorize`, `EntityFilterProjector`, `PermissionIndexCache`
//!
//! # Architecture
//!
//! This is the **domain layer**. It depends on `rampart-core` for identifiers,
//! actions, errors and configuration. Storage stays outside: groups come from
//! a `GroupSource` and resource projections from a `ResourceLoader`.
//!
//! ```text
//! groups -> scope -> loader -> aggregator -> index -> authorize / projector
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rampart_authorization::{authorize, PermissionCheck, PermissionEngine};
//! use rampart_core::{Action, EngineConfig, ResourceKind};
//!
//! let engine = PermissionEngine::new(groups, loader, EngineConfig::default());
//! let index = engine.build_for_principal(&account, &principal).await?;
//!
//! let checks = [PermissionCheck::new(ResourceKind::Environment, Action::Read)];
//! let decision = authorize(&index, &application, Some(&environment), &checks)?;
//! ```

pub mod aggregator;
pub mod cache;
pub mod decision;
pub mod defaults;
pub mod effects;
pub mod engine;
pub mod evaluator;
pub mod filter;
pub mod group;
pub mod index;
pub mod projector;
pub mod resources;
pub mod scope;

pub use aggregator::{Aggregation, ApplicationSummary, PermissionAggregator, ResourcePermissions};
pub use cache::PermissionIndexCache;
pub use decision::{authorize, AccessDecision, PermissionCheck, DEFAULT_ID_FIELD};
pub use defaults::{
    default_admin_group, non_prod_support_group, prod_support_group, read_only_group,
    ACCOUNT_ADMIN_GROUP, NON_PROD_SUPPORT_GROUP, PROD_SUPPORT_GROUP,
};
pub use effects::{GroupSource, ResourceLoader};
pub use engine::{compile, PermissionEngine};
pub use evaluator::{evaluate, PipelineFilter};
pub use filter::{
    ApplicationFilter, EnvironmentFilter, EnvironmentSelector, ResourceFilter, ServiceFilter,
    SetFilter, WorkflowFilter, WorkflowTag,
};
pub use group::{EffectiveGrant, Group, ResourceGrant};
pub use index::{ActionIndex, AuthorizationIndex, PermissionIndex};
pub use projector::{EntityFilter, EntityFilterProjector};
pub use resources::{
    EnvironmentProjection, PipelineProjection, PipelineStage, ResourceInventory,
    ResourceProjection, ServiceProjection, WorkflowProjection, ENVIRONMENT_TEMPLATE_FIELD,
};
pub use scope::{resolve_applications, resolve_scopes, ApplicationScopes, DEPENDENCY_EDGES};
