//! Account fixtures: applications and their resource projections

use crate::mocks::{InMemoryGroupSource, InMemoryResourceLoader};
use rampart_authorization::{
    EnvironmentProjection, Group, PermissionEngine, PipelineProjection, PipelineStage,
    ResourceInventory, ResourceProjection, ServiceProjection, WorkflowProjection,
    ENVIRONMENT_TEMPLATE_FIELD,
};
use rampart_core::{AccountId, ApplicationId, EngineConfig, EnvironmentType, ResourceId};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Fresh account id for tests that need isolation
pub fn unique_account_id() -> AccountId {
    AccountId::new(format!("acct-{}", Uuid::new_v4()))
}

/// An account, its applications and every projection the loader can serve
#[derive(Debug, Clone)]
pub struct AccountFixture {
    /// Account id
    pub account: AccountId,
    /// Applications in the account
    pub applications: BTreeSet<ApplicationId>,
    /// Resource projections across all applications
    pub projections: Vec<ResourceProjection>,
}

impl AccountFixture {
    /// Empty account
    pub fn new(account: impl Into<AccountId>) -> Self {
        Self {
            account: account.into(),
            applications: BTreeSet::new(),
            projections: Vec::new(),
        }
    }

    /// Add an application without resources
    pub fn with_application(mut self, application: &str) -> Self {
        self.applications.insert(application.into());
        self
    }

    fn push(mut self, projection: impl Into<ResourceProjection>) -> Self {
        let projection = projection.into();
        self.applications.insert(projection.application_id().clone());
        self.projections.push(projection);
        self
    }

    /// Add a service
    pub fn with_service(self, application: &str, id: &str) -> Self {
        self.push(ServiceProjection {
            id: id.into(),
            application_id: application.into(),
        })
    }

    /// Add an environment
    pub fn with_environment(
        self,
        application: &str,
        id: &str,
        environment_type: EnvironmentType,
    ) -> Self {
        self.push(EnvironmentProjection {
            id: id.into(),
            application_id: application.into(),
            environment_type,
        })
    }

    /// Add a workflow bound to an environment, or a global one for `None`
    pub fn with_workflow(self, application: &str, id: &str, environment: Option<&str>) -> Self {
        self.push(WorkflowProjection {
            id: id.into(),
            application_id: application.into(),
            environment_id: environment.map(ResourceId::from),
            is_templatized: false,
            templatized_field_names: BTreeSet::new(),
        })
    }

    /// Add a workflow whose environment is a template parameter
    pub fn with_templated_workflow(
        self,
        application: &str,
        id: &str,
        environment: Option<&str>,
    ) -> Self {
        self.push(WorkflowProjection {
            id: id.into(),
            application_id: application.into(),
            environment_id: environment.map(ResourceId::from),
            is_templatized: true,
            templatized_field_names: [ENVIRONMENT_TEMPLATE_FIELD.to_string()]
                .into_iter()
                .collect(),
        })
    }

    /// Add a pipeline
    pub fn with_pipeline(self, application: &str, id: &str, stages: Vec<PipelineStage>) -> Self {
        self.push(PipelineProjection {
            id: id.into(),
            application_id: application.into(),
            stages,
        })
    }

    /// Every projection filed into an inventory
    pub fn inventory(&self) -> ResourceInventory {
        let mut inventory = ResourceInventory::new();
        for projection in &self.projections {
            inventory.insert(projection.clone());
        }
        inventory
    }

    /// Loader serving this fixture
    pub fn loader(&self) -> InMemoryResourceLoader {
        InMemoryResourceLoader::new(self.clone())
    }

    /// Engine over this fixture, with `groups` assigned to every principal
    pub fn engine(
        &self,
        groups: Vec<Group>,
        config: EngineConfig,
    ) -> PermissionEngine<Arc<InMemoryGroupSource>, Arc<InMemoryResourceLoader>> {
        let source = InMemoryGroupSource::new();
        source.set_default_groups(groups);
        PermissionEngine::new(Arc::new(source), Arc::new(self.loader()), config)
    }
}

/// Two applications, each with one production and one non-production
/// environment
pub fn two_app_environments() -> AccountFixture {
    AccountFixture::new("acct")
        .with_environment("app-1", "app-1-prod", EnvironmentType::Prod)
        .with_environment("app-1", "app-1-qa", EnvironmentType::NonProd)
        .with_environment("app-2", "app-2-prod", EnvironmentType::Prod)
        .with_environment("app-2", "app-2-qa", EnvironmentType::NonProd)
}

/// One application holding one resource of every loadable kind
pub fn single_app_all_kinds() -> AccountFixture {
    AccountFixture::new("acct")
        .with_service("app", "svc")
        .with_environment("app", "env", EnvironmentType::Prod)
        .with_workflow("app", "wf", Some("env"))
        .with_pipeline("app", "pipe", vec![PipelineStage::deploy("env")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::ResourceKind;

    #[test]
    fn test_fixture_tracks_applications() {
        let fixture = single_app_all_kinds().with_application("empty");
        assert_eq!(fixture.applications.len(), 2);

        let inventory = fixture.inventory();
        for kind in ResourceKind::LOADABLE {
            assert_eq!(inventory.count(kind), 1);
        }
    }

    #[test]
    fn test_new_fixture_starts_empty() {
        let fixture = AccountFixture::new("acct");
        assert_eq!(fixture.account.as_str(), "acct");
        assert!(fixture.applications.is_empty());
        let inventory = fixture.inventory();
        for kind in ResourceKind::LOADABLE {
            assert_eq!(inventory.count(kind), 0);
        }
    }

    #[test]
    fn test_unique_account_ids_differ() {
        assert_ne!(unique_account_id(), unique_account_id());
    }
}
