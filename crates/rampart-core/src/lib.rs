//! Rampart Core - Foundation Types
//!
//! This crate holds the vocabulary shared by every Rampart crate:
//!
//! - Identifiers: `AccountId`, `PrincipalId`, `GroupId`, `ApplicationId`, `ResourceId`
//! - Actions: `Action`, `ActionSet`
//! - Resource kinds: `ResourceKind`, `GrantKind`, `EnvironmentType`, `AccountPermission`
//! - Errors: `AuthorizationError`, `Result`
//! - Configuration: `EngineConfig`, `MergePolicy`
//!
//! # Architecture
//!
//! This is the **foundation layer**. It has no knowledge of filters, grants or
//! the permission index; those live in `rampart-authorization`, which builds
//! on the types defined here.

pub mod action;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod kind;

pub use action::{Action, ActionSet};
pub use config::{EngineConfig, MergePolicy, ENV_PREFIX};
pub use errors::{AuthorizationError, Result};
pub use identifiers::{AccountId, ApplicationId, GroupId, PrincipalId, ResourceId};
pub use kind::{AccountPermission, EnvironmentType, GrantKind, ResourceKind};
