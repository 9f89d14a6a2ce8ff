//! Resource-level actions

use crate::errors::AuthorizationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Action a principal may perform on an application resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Create a new resource of a kind inside an application
    Create,
    /// Read a resource
    Read,
    /// Modify a resource
    Update,
    /// Remove a resource
    Delete,
    /// Execute a workflow, pipeline or deployment
    Execute,
}

/// Ordered set of actions attached to a single resource
pub type ActionSet = BTreeSet<Action>;

impl Action {
    /// Every action, in declaration order
    pub const ALL: [Action; 5] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Execute,
    ];

    /// Actions attached to individual resources.
    ///
    /// `Create` is not scoped to existing resources; it is carried as a
    /// per-application capability instead.
    pub const TRACKED: [Action; 4] = [Action::Read, Action::Update, Action::Delete, Action::Execute];

    /// Whether this action is attached to individual resource ids
    pub fn is_tracked(self) -> bool {
        !matches!(self, Action::Create)
    }

    /// Wire name of the action
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Read => "READ",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::Execute => "EXECUTE",
        }
    }

    /// Split an action set into the create flag and the tracked remainder
    pub fn split_create(actions: &ActionSet) -> (bool, ActionSet) {
        let create = actions.contains(&Action::Create);
        let tracked = actions.iter().copied().filter(|a| a.is_tracked()).collect();
        (create, tracked)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AuthorizationError::invalid_filter("action", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_create() {
        let actions: ActionSet = [Action::Create, Action::Read, Action::Execute]
            .into_iter()
            .collect();
        let (create, tracked) = Action::split_create(&actions);
        assert!(create);
        assert_eq!(
            tracked,
            [Action::Read, Action::Execute].into_iter().collect::<ActionSet>()
        );

        let only_create: ActionSet = [Action::Create].into_iter().collect();
        let (create, tracked) = Action::split_create(&only_create);
        assert!(create);
        assert!(tracked.is_empty());
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("read".parse::<Action>().ok(), Some(Action::Read));
        assert_eq!("EXECUTE".parse::<Action>().ok(), Some(Action::Execute));

        let err = "approve".parse::<Action>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("approve"));
    }
}
