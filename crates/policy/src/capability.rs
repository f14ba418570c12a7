use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The kind of element a capability check concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityTarget {
    Entity,
    Instance,
    Property,
    Relationship,
    Operation,
}

/// A named permission.
///
/// Variant order is the rendering order of capability sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    Create,
    Delete,
    List,
    Read,
    Update,
    Call,
}

impl Capability {
    /// Every grantable capability.
    pub const ALL: [Capability; 6] = [
        Capability::Create,
        Capability::Delete,
        Capability::List,
        Capability::Read,
        Capability::Update,
        Capability::Call,
    ];

    /// The targets this capability applies to. Never empty.
    pub fn targets(self) -> &'static [CapabilityTarget] {
        use CapabilityTarget::*;
        match self {
            Capability::Create | Capability::List => &[Entity],
            Capability::Delete => &[Instance],
            Capability::Read | Capability::Update => &[Instance, Property, Relationship],
            Capability::Call => &[Operation],
        }
    }

    /// Whether this capability applies to any of the given targets.
    pub fn applies_to(self, targets: &[CapabilityTarget]) -> bool {
        self.targets().iter().any(|t| targets.contains(t))
    }

    /// Canonical name, as transmitted to API clients.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Create => "Create",
            Capability::Delete => "Delete",
            Capability::List => "List",
            Capability::Read => "Read",
            Capability::Update => "Update",
            Capability::Call => "Call",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::Configuration(format!("unknown capability '{s}'")))
    }
}

/// All grantable capabilities.
pub fn all_capabilities() -> BTreeSet<Capability> {
    Capability::ALL.into_iter().collect()
}

/// Capabilities whose target set intersects `targets`.
pub fn capabilities_for_targets(targets: &[CapabilityTarget]) -> BTreeSet<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| c.applies_to(targets))
        .collect()
}
