//! Grant filters
//!
//! Filters are a closed tagged union: set filters for applications and
//! services, environment filters, and workflow filters. Unknown
//! discriminants never reach the evaluator; they are rejected when a group
//! document is decoded or when a tag is parsed.

use rampart_core::{
    ApplicationId, AuthorizationError, EnvironmentType, ResourceId, ResourceKind, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Selection over a known id universe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    bound(deserialize = "T: Deserialize<'de> + Ord")
)]
pub enum SetFilter<T> {
    /// Every id in the universe
    All,
    /// Only the listed ids that still exist in the universe
    Selected {
        /// Requested ids
        ids: BTreeSet<T>,
    },
}

/// Application filter of a grant
pub type ApplicationFilter = SetFilter<ApplicationId>;

/// Resource filter for service grants
pub type ServiceFilter = SetFilter<ResourceId>;

impl<T> Default for SetFilter<T> {
    fn default() -> Self {
        SetFilter::All
    }
}

impl<T: Ord + Clone> SetFilter<T> {
    /// Filter matching everything
    pub fn all() -> Self {
        SetFilter::All
    }

    /// Filter matching the given ids
    pub fn selected<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        SetFilter::Selected {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a single id passes the filter
    pub fn contains(&self, id: &T) -> bool {
        match self {
            SetFilter::All => true,
            SetFilter::Selected { ids } => ids.contains(id),
        }
    }

    /// Intersect the filter with a universe of known ids.
    ///
    /// Selected ids absent from the universe are dropped, not reported.
    pub fn resolve<'a, U>(&self, universe: U) -> BTreeSet<T>
    where
        U: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        universe
            .into_iter()
            .filter(|id| self.contains(id))
            .cloned()
            .collect()
    }
}

/// Environment selection by type tags or explicit ids
///
/// A non-empty `ids` list overrides `type_tags` entirely. An empty filter
/// matches every environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvironmentFilter {
    /// Environment types to match
    pub type_tags: BTreeSet<EnvironmentType>,
    /// Explicit environment ids
    pub ids: Option<BTreeSet<ResourceId>>,
}

impl EnvironmentFilter {
    /// Filter matching the given environment types
    pub fn of_types(types: impl IntoIterator<Item = EnvironmentType>) -> Self {
        Self {
            type_tags: types.into_iter().collect(),
            ids: None,
        }
    }

    /// Filter matching explicit environment ids
    pub fn of_ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ResourceId>,
    {
        Self {
            type_tags: BTreeSet::new(),
            ids: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Selection rule after defaults are applied
    pub fn selector(&self) -> EnvironmentSelector {
        let types = if self.type_tags.is_empty() {
            EnvironmentType::ALL.into_iter().collect()
        } else {
            self.type_tags.clone()
        };
        EnvironmentSelector::new(selected_ids(&self.ids), types)
    }

    /// Equivalent workflow filter, widened with the `Templates` tag.
    ///
    /// Deployments and pipelines may run templated workflows, so the
    /// derived filter always admits them.
    pub fn to_workflow_filter(&self) -> WorkflowFilter {
        let mut type_tags: BTreeSet<WorkflowTag> = self
            .selector()
            .types
            .into_iter()
            .map(WorkflowTag::from)
            .collect();
        type_tags.insert(WorkflowTag::Templates);
        WorkflowFilter {
            type_tags,
            ids: self.ids.clone(),
        }
    }
}

/// Tag accepted by workflow filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowTag {
    /// Workflows targeting production environments
    Prod,
    /// Workflows targeting non-production environments
    NonProd,
    /// Workflows whose environment is a template parameter
    Templates,
}

impl WorkflowTag {
    /// Every workflow tag
    pub const ALL: [WorkflowTag; 3] = [WorkflowTag::Prod, WorkflowTag::NonProd, WorkflowTag::Templates];

    /// Environment type named by this tag, if any
    pub fn environment_type(self) -> Option<EnvironmentType> {
        match self {
            WorkflowTag::Prod => Some(EnvironmentType::Prod),
            WorkflowTag::NonProd => Some(EnvironmentType::NonProd),
            WorkflowTag::Templates => None,
        }
    }

    /// Wire name of the tag
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowTag::Prod => "PROD",
            WorkflowTag::NonProd => "NON_PROD",
            WorkflowTag::Templates => "TEMPLATES",
        }
    }
}

impl From<EnvironmentType> for WorkflowTag {
    fn from(environment_type: EnvironmentType) -> Self {
        match environment_type {
            EnvironmentType::Prod => WorkflowTag::Prod,
            EnvironmentType::NonProd => WorkflowTag::NonProd,
        }
    }
}

impl fmt::Display for WorkflowTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowTag {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowTag::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuthorizationError::invalid_filter("workflow", s))
    }
}

/// Workflow selection: an environment filter plus the `Templates` tag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowFilter {
    /// Environment types (and `Templates`) to match
    pub type_tags: BTreeSet<WorkflowTag>,
    /// Explicit environment ids
    pub ids: Option<BTreeSet<ResourceId>>,
}

impl WorkflowFilter {
    /// Filter matching the given tags
    pub fn of_tags(tags: impl IntoIterator<Item = WorkflowTag>) -> Self {
        Self {
            type_tags: tags.into_iter().collect(),
            ids: None,
        }
    }

    /// Filter matching workflows bound to explicit environment ids
    pub fn of_environment_ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ResourceId>,
    {
        Self {
            type_tags: BTreeSet::new(),
            ids: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    // An id selection counts as an explicit filter, so defaults only apply
    // when neither tags nor ids are given.
    fn effective_tags(&self) -> BTreeSet<WorkflowTag> {
        if self.type_tags.is_empty() && selected_ids(&self.ids).is_none() {
            WorkflowTag::ALL.into_iter().collect()
        } else {
            self.type_tags.clone()
        }
    }

    /// Whether environment-templatized workflows are admitted
    pub fn includes_templates(&self) -> bool {
        self.effective_tags().contains(&WorkflowTag::Templates)
    }

    /// Environment selection rule for concrete (non-templated) workflows.
    ///
    /// Unlike `EnvironmentFilter::selector`, a filter carrying only
    /// `Templates` selects no environment types.
    pub fn selector(&self) -> EnvironmentSelector {
        let types = self
            .effective_tags()
            .into_iter()
            .filter_map(WorkflowTag::environment_type)
            .collect();
        EnvironmentSelector::new(selected_ids(&self.ids), types)
    }
}

/// Environment selection rule with defaults resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSelector {
    ids: Option<BTreeSet<ResourceId>>,
    types: BTreeSet<EnvironmentType>,
}

impl EnvironmentSelector {
    fn new(ids: Option<BTreeSet<ResourceId>>, types: BTreeSet<EnvironmentType>) -> Self {
        Self { ids, types }
    }

    /// Whether an environment with the given id and type is selected
    pub fn matches(&self, id: &ResourceId, environment_type: EnvironmentType) -> bool {
        match &self.ids {
            Some(ids) => ids.contains(id),
            None => self.types.contains(&environment_type),
        }
    }

    /// Whether selection is by explicit ids
    pub fn is_by_ids(&self) -> bool {
        self.ids.is_some()
    }
}

fn selected_ids(ids: &Option<BTreeSet<ResourceId>>) -> Option<BTreeSet<ResourceId>> {
    ids.as_ref().filter(|ids| !ids.is_empty()).cloned()
}

/// Resource-level filter carried by a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "filter", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceFilter {
    /// Service selection
    Set(ServiceFilter),
    /// Environment selection; also drives pipeline and deployment grants
    Environment(EnvironmentFilter),
    /// Workflow selection
    Workflow(WorkflowFilter),
}

impl ResourceFilter {
    /// Wire name of the variant
    pub fn variant_name(&self) -> &'static str {
        match self {
            ResourceFilter::Set(_) => "SET",
            ResourceFilter::Environment(_) => "ENVIRONMENT",
            ResourceFilter::Workflow(_) => "WORKFLOW",
        }
    }

    /// Check that this filter variant fits a resource kind
    pub fn check_kind(&self, kind: ResourceKind) -> Result<()> {
        let fits = matches!(
            (kind, self),
            (ResourceKind::Service, ResourceFilter::Set(_))
                | (ResourceKind::Environment, ResourceFilter::Environment(_))
                | (ResourceKind::Pipeline, ResourceFilter::Environment(_))
                | (ResourceKind::Deployment, ResourceFilter::Environment(_))
                | (ResourceKind::Workflow, ResourceFilter::Workflow(_))
        );
        if fits {
            Ok(())
        } else {
            Err(AuthorizationError::filter_mismatch(kind, self.variant_name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> BTreeSet<ResourceId> {
        raw.iter().map(|id| ResourceId::from(*id)).collect()
    }

    #[test]
    fn test_set_filter_resolve_drops_unknown_ids() {
        let universe: BTreeSet<ApplicationId> =
            ["a1", "a2"].into_iter().map(ApplicationId::from).collect();

        let all = ApplicationFilter::all();
        assert_eq!(all.resolve(&universe), universe);

        let selected = ApplicationFilter::selected(["a2", "deleted"]);
        let resolved = selected.resolve(&universe);
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains("a2"));
    }

    #[test]
    fn test_environment_filter_default_matches_all_types() {
        let selector = EnvironmentFilter::default().selector();
        assert!(selector.matches(&ResourceId::from("e1"), EnvironmentType::Prod));
        assert!(selector.matches(&ResourceId::from("e2"), EnvironmentType::NonProd));
        assert!(!selector.is_by_ids());
    }

    #[test]
    fn test_environment_ids_override_type_tags() {
        let filter = EnvironmentFilter {
            type_tags: [EnvironmentType::Prod].into_iter().collect(),
            ids: Some(ids(&["e2"])),
        };
        let selector = filter.selector();
        assert!(selector.is_by_ids());
        assert!(selector.matches(&ResourceId::from("e2"), EnvironmentType::NonProd));
        assert!(!selector.matches(&ResourceId::from("e1"), EnvironmentType::Prod));
    }

    #[test]
    fn test_empty_id_list_falls_back_to_types() {
        let filter = EnvironmentFilter {
            type_tags: [EnvironmentType::NonProd].into_iter().collect(),
            ids: Some(BTreeSet::new()),
        };
        let selector = filter.selector();
        assert!(!selector.is_by_ids());
        assert!(selector.matches(&ResourceId::from("e1"), EnvironmentType::NonProd));
        assert!(!selector.matches(&ResourceId::from("e1"), EnvironmentType::Prod));
    }

    #[test]
    fn test_templates_only_workflow_filter_selects_no_environments() {
        let filter = WorkflowFilter::of_tags([WorkflowTag::Templates]);
        assert!(filter.includes_templates());
        let selector = filter.selector();
        assert!(!selector.matches(&ResourceId::from("e1"), EnvironmentType::Prod));
        assert!(!selector.matches(&ResourceId::from("e1"), EnvironmentType::NonProd));
    }

    #[test]
    fn test_default_workflow_filter_includes_templates() {
        assert!(WorkflowFilter::default().includes_templates());
        assert!(!WorkflowFilter::of_tags([WorkflowTag::Prod]).includes_templates());
    }

    #[test]
    fn test_workflow_filter_from_environment_filter() {
        let env = EnvironmentFilter::of_types([EnvironmentType::Prod]);
        let workflow = env.to_workflow_filter();
        assert_eq!(
            workflow.type_tags,
            [WorkflowTag::Prod, WorkflowTag::Templates]
                .into_iter()
                .collect::<BTreeSet<_>>()
        );

        let by_ids = EnvironmentFilter::of_ids(["e9"]).to_workflow_filter();
        assert_eq!(by_ids.ids, Some(ids(&["e9"])));
        assert!(by_ids.includes_templates());
    }

    #[test]
    fn test_workflow_tag_parse_rejects_unknown() {
        assert_eq!("TEMPLATES".parse::<WorkflowTag>().ok(), Some(WorkflowTag::Templates));
        let err = "SELECTED_BY_NAME".parse::<WorkflowTag>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_filter_kind_compatibility() {
        let env = ResourceFilter::Environment(EnvironmentFilter::default());
        assert!(env.check_kind(ResourceKind::Environment).is_ok());
        assert!(env.check_kind(ResourceKind::Pipeline).is_ok());
        assert!(env.check_kind(ResourceKind::Deployment).is_ok());

        let err = env.check_kind(ResourceKind::Service).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::filter_mismatch(ResourceKind::Service, "ENVIRONMENT")
        );

        let set = ResourceFilter::Set(ServiceFilter::all());
        assert!(set.check_kind(ResourceKind::Service).is_ok());
        assert!(set.check_kind(ResourceKind::Workflow).is_err());
    }

    #[test]
    fn test_resource_filter_wire_format() {
        let json = r#"{"type":"ENVIRONMENT","filter":{"typeTags":["PROD"]}}"#;
        let filter: ResourceFilter = serde_json::from_str(json).unwrap();
        assert_eq!(
            filter,
            ResourceFilter::Environment(EnvironmentFilter::of_types([EnvironmentType::Prod]))
        );

        let unknown = r#"{"type":"ENVIRONMENT","filter":{"typeTags":["STAGING"]}}"#;
        assert!(serde_json::from_str::<ResourceFilter>(unknown).is_err());
    }

    #[test]
    fn test_set_filter_wire_format() {
        let json = r#"{"kind":"SELECTED","ids":["a2","a1","a2"]}"#;
        let filter: ApplicationFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter, ApplicationFilter::selected(["a1", "a2"]));

        let all: ServiceFilter = serde_json::from_str(r#"{"kind":"ALL"}"#).unwrap();
        assert_eq!(all, ServiceFilter::all());

        let wrapped = r#"{"type":"SET","filter":{"kind":"SELECTED","ids":["api"]}}"#;
        let filter: ResourceFilter = serde_json::from_str(wrapped).unwrap();
        assert_eq!(filter, ResourceFilter::Set(ServiceFilter::selected(["api"])));
    }
}
