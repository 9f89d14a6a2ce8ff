//! Minimal resource projections and the per-build inventory

use rampart_core::{
    ApplicationId, AuthorizationError, EnvironmentType, ResourceId, ResourceKind, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Template field that binds a workflow's environment at execution time
pub const ENVIRONMENT_TEMPLATE_FIELD: &str = "envId";

/// Service projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProjection {
    /// Service id
    pub id: ResourceId,
    /// Owning application
    pub application_id: ApplicationId,
}

/// Environment projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentProjection {
    /// Environment id
    pub id: ResourceId,
    /// Owning application
    pub application_id: ApplicationId,
    /// Production or non-production
    pub environment_type: EnvironmentType,
}

/// Workflow projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProjection {
    /// Workflow id
    pub id: ResourceId,
    /// Owning application
    pub application_id: ApplicationId,
    /// Bound environment; `None` for global workflows
    #[serde(default)]
    pub environment_id: Option<ResourceId>,
    /// Whether any field is supplied through a template parameter
    #[serde(default)]
    pub is_templatized: bool,
    /// Names of the templated fields
    #[serde(default)]
    pub templatized_field_names: BTreeSet<String>,
}

impl WorkflowProjection {
    /// Whether the workflow's environment is a template parameter
    pub fn is_environment_templatized(&self) -> bool {
        self.is_templatized
            && self
                .templatized_field_names
                .contains(ENVIRONMENT_TEMPLATE_FIELD)
    }
}

/// One stage of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    /// Approval stages carry no environment and are never checked
    #[serde(default)]
    pub is_approval_stage: bool,
    /// Environment the stage runs against
    #[serde(default)]
    pub environment_id: Option<ResourceId>,
}

impl PipelineStage {
    /// Stage running against an environment
    pub fn deploy(environment_id: impl Into<ResourceId>) -> Self {
        Self {
            is_approval_stage: false,
            environment_id: Some(environment_id.into()),
        }
    }

    /// Approval stage
    pub fn approval() -> Self {
        Self {
            is_approval_stage: true,
            environment_id: None,
        }
    }
}

/// Pipeline projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProjection {
    /// Pipeline id
    pub id: ResourceId,
    /// Owning application
    pub application_id: ApplicationId,
    /// Stages in execution order
    #[serde(default)]
    pub stages: Vec<PipelineStage>,
}

/// Projection returned by the resource loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceProjection {
    /// Service
    Service(ServiceProjection),
    /// Environment
    Environment(EnvironmentProjection),
    /// Workflow
    Workflow(WorkflowProjection),
    /// Pipeline
    Pipeline(PipelineProjection),
}

impl ResourceProjection {
    /// Kind of the projected resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceProjection::Service(_) => ResourceKind::Service,
            ResourceProjection::Environment(_) => ResourceKind::Environment,
            ResourceProjection::Workflow(_) => ResourceKind::Workflow,
            ResourceProjection::Pipeline(_) => ResourceKind::Pipeline,
        }
    }

    /// Resource id
    pub fn id(&self) -> &ResourceId {
        match self {
            ResourceProjection::Service(p) => &p.id,
            ResourceProjection::Environment(p) => &p.id,
            ResourceProjection::Workflow(p) => &p.id,
            ResourceProjection::Pipeline(p) => &p.id,
        }
    }

    /// Owning application
    pub fn application_id(&self) -> &ApplicationId {
        match self {
            ResourceProjection::Service(p) => &p.application_id,
            ResourceProjection::Environment(p) => &p.application_id,
            ResourceProjection::Workflow(p) => &p.application_id,
            ResourceProjection::Pipeline(p) => &p.application_id,
        }
    }
}

impl From<ServiceProjection> for ResourceProjection {
    fn from(p: ServiceProjection) -> Self {
        ResourceProjection::Service(p)
    }
}

impl From<EnvironmentProjection> for ResourceProjection {
    fn from(p: EnvironmentProjection) -> Self {
        ResourceProjection::Environment(p)
    }
}

impl From<WorkflowProjection> for ResourceProjection {
    fn from(p: WorkflowProjection) -> Self {
        ResourceProjection::Workflow(p)
    }
}

impl From<PipelineProjection> for ResourceProjection {
    fn from(p: PipelineProjection) -> Self {
        ResourceProjection::Pipeline(p)
    }
}

/// Projections loaded for a single build, grouped by application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInventory {
    services: BTreeMap<ApplicationId, Vec<ServiceProjection>>,
    environments: BTreeMap<ApplicationId, Vec<EnvironmentProjection>>,
    workflows: BTreeMap<ApplicationId, Vec<WorkflowProjection>>,
    pipelines: BTreeMap<ApplicationId, Vec<PipelineProjection>>,
}

impl ResourceInventory {
    /// Empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Services of an application
    pub fn services(&self, application: &ApplicationId) -> &[ServiceProjection] {
        self.services.get(application).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Environments of an application
    pub fn environments(&self, application: &ApplicationId) -> &[EnvironmentProjection] {
        self.environments.get(application).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Workflows of an application
    pub fn workflows(&self, application: &ApplicationId) -> &[WorkflowProjection] {
        self.workflows.get(application).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pipelines of an application
    pub fn pipelines(&self, application: &ApplicationId) -> &[PipelineProjection] {
        self.pipelines.get(application).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add a single projection under its own application
    pub fn insert(&mut self, projection: impl Into<ResourceProjection>) {
        let projection = projection.into();
        let application = projection.application_id().clone();
        self.push(application, projection);
    }

    /// Add one loader batch for `kind`.
    ///
    /// Projections are filed under the application key the loader used.
    /// A projection of another kind fails the batch.
    pub fn absorb(
        &mut self,
        kind: ResourceKind,
        batch: BTreeMap<ApplicationId, Vec<ResourceProjection>>,
    ) -> Result<()> {
        for (application, projections) in batch {
            for projection in projections {
                let found = projection.kind();
                if found != kind {
                    return Err(AuthorizationError::ProjectionMismatch {
                        expected: kind,
                        found,
                    });
                }
                self.push(application.clone(), projection);
            }
        }
        Ok(())
    }

    fn push(&mut self, application: ApplicationId, projection: ResourceProjection) {
        match projection {
            ResourceProjection::Service(p) => self.services.entry(application).or_default().push(p),
            ResourceProjection::Environment(p) => {
                self.environments.entry(application).or_default().push(p)
            }
            ResourceProjection::Workflow(p) => {
                self.workflows.entry(application).or_default().push(p)
            }
            ResourceProjection::Pipeline(p) => {
                self.pipelines.entry(application).or_default().push(p)
            }
        }
    }

    /// Number of projections held for a kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Service => self.services.values().map(Vec::len).sum(),
            ResourceKind::Environment => self.environments.values().map(Vec::len).sum(),
            ResourceKind::Workflow => self.workflows.values().map(Vec::len).sum(),
            ResourceKind::Pipeline => self.pipelines.values().map(Vec::len).sum(),
            ResourceKind::Deployment => 0,
        }
    }
}
