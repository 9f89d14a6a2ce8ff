//! Identifier types for the entities the permission compiler reasons about
//!
//! Identifiers are minted by the platform's storage layer, so they are opaque
//! strings here. Ordering is derived so that every map keyed by an identifier
//! iterates deterministically, which keeps rebuilt indexes bit-identical.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier!(
    /// Tenant account owning groups and applications
    AccountId
);

string_identifier!(
    /// User (or service principal) whose permissions are being compiled
    PrincipalId
);

string_identifier!(
    /// Permission group identifier
    GroupId
);

string_identifier!(
    /// Application identifier; applications partition every resource kind
    ApplicationId
);

string_identifier!(
    /// Identifier of a service, environment, workflow or pipeline
    ///
    /// Deployment records are authorized through the workflow or pipeline
    /// they execute, so deployment permissions are keyed by those ids too.
    ResourceId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_identifier_display_and_borrow() {
        let id = ResourceId::new("env-1");
        assert_eq!(id.to_string(), "env-1");
        assert_eq!(id.as_str(), "env-1");

        let set: BTreeSet<ResourceId> = [ResourceId::from("a"), ResourceId::from("b")]
            .into_iter()
            .collect();
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }
}
