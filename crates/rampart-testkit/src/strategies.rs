//! Property test strategies for groups, grants and account fixtures
//!
//! Ids are drawn from small fixed pools (`app-0..3`, `env-0..6`, ...) so
//! generated grants regularly reference both existing and missing resources.

use crate::fixtures::AccountFixture;
use proptest::prelude::*;
use rampart_authorization::{
    ApplicationFilter, EnvironmentFilter, Group, PipelineStage, ResourceFilter, ResourceGrant,
    ServiceFilter, WorkflowFilter, WorkflowTag,
};
use rampart_core::{AccountPermission, Action, ActionSet, EnvironmentType, GrantKind};

pub use proptest;

const APPLICATIONS: usize = 3;
const ENVIRONMENTS: usize = 6;
const RESOURCES: usize = 4;

fn pool(prefix: &str, size: usize) -> Vec<String> {
    (0..size).map(|i| format!("{prefix}-{i}")).collect()
}

/// Either environment type
pub fn arb_environment_type() -> impl Strategy<Value = EnvironmentType> {
    prop_oneof![Just(EnvironmentType::Prod), Just(EnvironmentType::NonProd)]
}

/// Any subset of actions, including the empty set
pub fn arb_action_set() -> impl Strategy<Value = ActionSet> {
    prop::sample::subsequence(Action::ALL.to_vec(), 0..=Action::ALL.len())
        .prop_map(|actions| actions.into_iter().collect())
}

/// Arbitrary subset of the tracked actions (never `Create`, never empty)
pub fn arb_tracked_action_set() -> impl Strategy<Value = ActionSet> {
    prop::sample::subsequence(Action::TRACKED.to_vec(), 1..=Action::TRACKED.len())
        .prop_map(|actions| actions.into_iter().collect())
}

fn arb_ids(prefix: &'static str, size: usize) -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(pool(prefix, size), 0..=size)
}

/// Application filter over the `app-*` pool, plus one id that never exists
pub fn arb_application_filter() -> impl Strategy<Value = ApplicationFilter> {
    prop_oneof![
        Just(ApplicationFilter::All),
        arb_ids("app", APPLICATIONS + 1).prop_map(ApplicationFilter::selected),
    ]
}

/// Environment filter over the `env-*` pool
pub fn arb_environment_filter() -> impl Strategy<Value = EnvironmentFilter> {
    (
        prop::sample::subsequence(EnvironmentType::ALL.to_vec(), 0..=2),
        prop::option::of(arb_ids("env", ENVIRONMENTS)),
    )
        .prop_map(|(types, ids)| EnvironmentFilter {
            type_tags: types.into_iter().collect(),
            ids: ids.map(|ids| ids.into_iter().map(Into::into).collect()),
        })
}

/// Workflow filter over the `env-*` pool
pub fn arb_workflow_filter() -> impl Strategy<Value = WorkflowFilter> {
    (
        prop::sample::subsequence(WorkflowTag::ALL.to_vec(), 0..=3),
        prop::option::of(arb_ids("env", ENVIRONMENTS)),
    )
        .prop_map(|(tags, ids)| WorkflowFilter {
            type_tags: tags.into_iter().collect(),
            ids: ids.map(|ids| ids.into_iter().map(Into::into).collect()),
        })
}

fn arb_resource_filter(kind: GrantKind) -> BoxedStrategy<Option<ResourceFilter>> {
    match kind {
        GrantKind::Service => prop::option::of(prop_oneof![
            Just(ServiceFilter::All),
            arb_ids("svc", RESOURCES).prop_map(ServiceFilter::selected),
        ])
        .prop_map(|f| f.map(ResourceFilter::Set))
        .boxed(),
        GrantKind::Workflow => prop::option::of(arb_workflow_filter())
            .prop_map(|f| f.map(ResourceFilter::Workflow))
            .boxed(),
        GrantKind::AllResourceKinds => Just(None).boxed(),
        _ => prop::option::of(arb_environment_filter())
            .prop_map(|f| f.map(ResourceFilter::Environment))
            .boxed(),
    }
}

/// Grant whose resource filter always fits its kind
pub fn arb_grant() -> impl Strategy<Value = ResourceGrant> {
    prop_oneof![
        Just(GrantKind::Service),
        Just(GrantKind::Environment),
        Just(GrantKind::Workflow),
        Just(GrantKind::Pipeline),
        Just(GrantKind::Deployment),
        Just(GrantKind::AllResourceKinds),
    ]
    .prop_flat_map(|kind| {
        (
            arb_application_filter(),
            arb_resource_filter(kind),
            arb_action_set(),
        )
            .prop_map(move |(application_filter, resource_filter, actions)| ResourceGrant {
                kind,
                application_filter,
                resource_filter,
                actions,
            })
    })
}

/// Group of account `acct` with up to four grants
pub fn arb_group(index: usize) -> impl Strategy<Value = Group> {
    (
        prop::sample::subsequence(AccountPermission::ALL.to_vec(), 0..=3),
        prop::collection::vec(arb_grant(), 0..4),
    )
        .prop_map(move |(permissions, grants)| {
            let mut group = Group::new(format!("group-{index}"), "acct");
            group.account_permissions = permissions.into_iter().collect();
            group.resource_grants = grants;
            group
        })
}

/// Up to three groups
pub fn arb_groups() -> impl Strategy<Value = Vec<Group>> {
    (0usize..=3).prop_flat_map(|count| (0..count).map(arb_group).collect::<Vec<_>>())
}

fn arb_stage() -> impl Strategy<Value = PipelineStage> {
    prop_oneof![
        Just(PipelineStage::approval()),
        Just(PipelineStage::default()),
        (0..ENVIRONMENTS).prop_map(|i| PipelineStage::deploy(format!("env-{i}"))),
    ]
}

/// Account `acct` with random resources spread over `app-0..3`.
///
/// Environment `env-i` belongs to `app-(i % 3)`; workflows and pipelines may
/// reference environments of other applications.
pub fn arb_account_fixture() -> impl Strategy<Value = AccountFixture> {
    (
        prop::collection::vec(arb_environment_type(), ENVIRONMENTS),
        prop::collection::vec(
            (0..APPLICATIONS, prop::option::of(0..ENVIRONMENTS), any::<bool>()),
            0..6,
        ),
        prop::collection::vec(
            (0..APPLICATIONS, prop::collection::vec(arb_stage(), 0..4)),
            0..4,
        ),
        prop::collection::vec(0..APPLICATIONS, 0..4),
    )
        .prop_map(|(environment_types, workflows, pipelines, services)| {
            let mut fixture = AccountFixture::new("acct");
            for app in 0..APPLICATIONS {
                fixture = fixture.with_application(&format!("app-{app}"));
            }
            for (i, environment_type) in environment_types.into_iter().enumerate() {
                let app = format!("app-{}", i % APPLICATIONS);
                fixture = fixture.with_environment(&app, &format!("env-{i}"), environment_type);
            }
            for (i, (app, environment, templated)) in workflows.into_iter().enumerate() {
                let app = format!("app-{app}");
                let id = format!("wf-{i}");
                let environment = environment.map(|e| format!("env-{e}"));
                fixture = if templated {
                    fixture.with_templated_workflow(&app, &id, environment.as_deref())
                } else {
                    fixture.with_workflow(&app, &id, environment.as_deref())
                };
            }
            for (i, (app, stages)) in pipelines.into_iter().enumerate() {
                fixture =
                    fixture.with_pipeline(&format!("app-{app}"), &format!("pipe-{i}"), stages);
            }
            for (i, app) in services.into_iter().enumerate() {
                fixture = fixture.with_service(&format!("app-{app}"), &format!("svc-{i}"));
            }
            fixture
        })
}
