//! Capability sets as handed to the API layer.

use policy::Capability;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical capability names.
pub type CapabilityNames = BTreeSet<String>;

/// What the actor may do with a type and its type-level operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCapabilities {
    pub entity: CapabilityNames,
    pub queries: BTreeMap<String, CapabilityNames>,
    pub static_actions: BTreeMap<String, CapabilityNames>,
}

impl EntityCapabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        self.entity.contains(capability.name())
    }
}

/// What the actor may do with one instance and its members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCapabilities {
    pub instance: CapabilityNames,
    pub attributes: BTreeMap<String, CapabilityNames>,
    pub relationships: BTreeMap<String, CapabilityNames>,
    pub actions: BTreeMap<String, CapabilityNames>,
}

impl InstanceCapabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        self.instance.contains(capability.name())
    }
}

pub(crate) fn to_names(capabilities: impl IntoIterator<Item = Capability>) -> CapabilityNames {
    capabilities
        .into_iter()
        .map(|c| c.name().to_string())
        .collect()
}
