//! Resource kinds, grant kinds and account-level permission kinds

use crate::errors::AuthorizationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete resource kind inside an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// Deployable service definition
    Service,
    /// Deployment target environment
    Environment,
    /// Orchestration workflow
    Workflow,
    /// Ordered sequence of workflow stages
    Pipeline,
    /// Execution record of a workflow or pipeline.
    ///
    /// Virtual kind: there is no deployment projection, matches are derived
    /// from workflows and pipelines.
    Deployment,
}

impl ResourceKind {
    /// Every concrete kind, in expansion order
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Service,
        ResourceKind::Environment,
        ResourceKind::Workflow,
        ResourceKind::Pipeline,
        ResourceKind::Deployment,
    ];

    /// Kinds backed by a resource projection the loader can fetch
    pub const LOADABLE: [ResourceKind; 4] = [
        ResourceKind::Service,
        ResourceKind::Environment,
        ResourceKind::Workflow,
        ResourceKind::Pipeline,
    ];

    /// Whether the loader has projections for this kind
    pub fn is_loadable(self) -> bool {
        !matches!(self, ResourceKind::Deployment)
    }

    /// Whether a per-application create capability exists for this kind
    pub fn supports_create(self) -> bool {
        self.is_loadable()
    }

    /// Default collection name used by the query layer for this kind
    pub fn default_collection(self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Environment => "environments",
            ResourceKind::Workflow => "workflows",
            ResourceKind::Pipeline => "pipelines",
            ResourceKind::Deployment => "workflow_executions",
        }
    }

    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Service => "SERVICE",
            ResourceKind::Environment => "ENVIRONMENT",
            ResourceKind::Workflow => "WORKFLOW",
            ResourceKind::Pipeline => "PIPELINE",
            ResourceKind::Deployment => "DEPLOYMENT",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource kind named by a grant, including the `AllResourceKinds` macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantKind {
    /// Services
    Service,
    /// Environments
    Environment,
    /// Workflows
    Workflow,
    /// Pipelines
    Pipeline,
    /// Deployment records
    Deployment,
    /// Expands into one grant per concrete kind at aggregation time
    AllResourceKinds,
}

impl GrantKind {
    /// Concrete kinds this grant applies to
    pub fn expand(self) -> &'static [ResourceKind] {
        match self {
            GrantKind::Service => &[ResourceKind::Service],
            GrantKind::Environment => &[ResourceKind::Environment],
            GrantKind::Workflow => &[ResourceKind::Workflow],
            GrantKind::Pipeline => &[ResourceKind::Pipeline],
            GrantKind::Deployment => &[ResourceKind::Deployment],
            GrantKind::AllResourceKinds => &ResourceKind::ALL,
        }
    }

    /// The concrete kind, or `None` for `AllResourceKinds`
    pub fn concrete(self) -> Option<ResourceKind> {
        match self {
            GrantKind::AllResourceKinds => None,
            other => other.expand().first().copied(),
        }
    }
}

impl From<ResourceKind> for GrantKind {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Service => GrantKind::Service,
            ResourceKind::Environment => GrantKind::Environment,
            ResourceKind::Workflow => GrantKind::Workflow,
            ResourceKind::Pipeline => GrantKind::Pipeline,
            ResourceKind::Deployment => GrantKind::Deployment,
        }
    }
}

/// Environment classification used by environment and workflow filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentType {
    /// Production environment
    Prod,
    /// Any non-production environment
    NonProd,
}

impl EnvironmentType {
    /// Both environment types
    pub const ALL: [EnvironmentType; 2] = [EnvironmentType::Prod, EnvironmentType::NonProd];

    /// Wire name of the environment type
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentType::Prod => "PROD",
            EnvironmentType::NonProd => "NON_PROD",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvironmentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuthorizationError::invalid_filter("environment", s))
    }
}

/// Account-scoped permission kinds granted outside any application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountPermission {
    /// Manage groups and their grants
    UserPermissionManagement,
    /// Manage account settings
    AccountManagement,
    /// Create and delete applications
    ApplicationCreateDelete,
}

impl AccountPermission {
    /// Every account-level permission
    pub const ALL: [AccountPermission; 3] = [
        AccountPermission::UserPermissionManagement,
        AccountPermission::AccountManagement,
        AccountPermission::ApplicationCreateDelete,
    ];
}
