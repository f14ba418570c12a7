//! Role types and the static role hierarchy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::{Error, Result};

/// The name of a role type, e.g. `Customer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleType(String);

impl RoleType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RoleType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A concrete role object held by the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_type: RoleType,
    /// Identity of the role object, compared against instances by predicates.
    pub id: String,
}

impl Role {
    pub fn new(role_type: impl Into<RoleType>, id: impl Into<String>) -> Self {
        Self {
            role_type: role_type.into(),
            id: id.into(),
        }
    }
}

/// Statically built role-type table.
///
/// Holds, for every registered role type, the set of role types it is
/// assignable to (itself included). Built once at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
    assignable: BTreeMap<RoleType, BTreeSet<RoleType>>,
}

impl RoleHierarchy {
    pub fn builder() -> RoleHierarchyBuilder {
        RoleHierarchyBuilder::default()
    }

    /// A hierarchy of unrelated role types.
    pub fn flat<I, R>(role_types: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleType>,
    {
        let assignable = role_types
            .into_iter()
            .map(|r| {
                let r = r.into();
                (r.clone(), BTreeSet::from([r]))
            })
            .collect();
        Self { assignable }
    }

    pub fn contains(&self, role_type: &RoleType) -> bool {
        self.assignable.contains_key(role_type)
    }

    /// Whether `concrete` is `required` or one of its subtypes.
    ///
    /// Unregistered role types are only assignable to themselves.
    pub fn is_subtype(&self, concrete: &RoleType, required: &RoleType) -> bool {
        match self.assignable.get(concrete) {
            Some(supertypes) => supertypes.contains(required),
            None => concrete == required,
        }
    }

    pub fn role_types(&self) -> impl Iterator<Item = &RoleType> {
        self.assignable.keys()
    }
}

/// Collects role declarations and resolves the subtype closure.
#[derive(Debug, Default)]
pub struct RoleHierarchyBuilder {
    parents: BTreeMap<RoleType, BTreeSet<RoleType>>,
}

impl RoleHierarchyBuilder {
    /// Declare a role type together with its direct parents.
    pub fn role<I, R>(mut self, role_type: impl Into<RoleType>, parents: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleType>,
    {
        self.parents
            .entry(role_type.into())
            .or_default()
            .extend(parents.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<RoleHierarchy> {
        for (role, parents) in &self.parents {
            if let Some(missing) = parents.iter().find(|p| !self.parents.contains_key(*p)) {
                return Err(Error::Configuration(format!(
                    "role '{role}' extends unknown role '{missing}'"
                )));
            }
        }

        let mut assignable = BTreeMap::new();
        for role in self.parents.keys() {
            let mut seen = BTreeSet::from([role.clone()]);
            let mut pending: Vec<&RoleType> = self.parents[role].iter().collect();
            while let Some(next) = pending.pop() {
                if next == role {
                    return Err(Error::Configuration(format!(
                        "role '{role}' is part of an inheritance cycle"
                    )));
                }
                if seen.insert(next.clone()) {
                    pending.extend(self.parents[next].iter());
                }
            }
            assignable.insert(role.clone(), seen);
        }

        Ok(RoleHierarchy { assignable })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoleHierarchy {
        RoleHierarchy::builder()
            .role("Person", Vec::<&str>::new())
            .role("Customer", ["Person"])
            .role("Employee", ["Person"])
            .role("Manager", ["Employee"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_subtype_is_reflexive_and_transitive() {
        let h = sample();
        let manager = RoleType::from("Manager");
        assert!(h.is_subtype(&manager, &"Manager".into()));
        assert!(h.is_subtype(&manager, &"Employee".into()));
        assert!(h.is_subtype(&manager, &"Person".into()));
        assert!(!h.is_subtype(&manager, &"Customer".into()));
        assert!(!h.is_subtype(&"Person".into(), &"Employee".into()));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = RoleHierarchy::builder()
            .role("Customer", ["Person"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("Person")));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = RoleHierarchy::builder()
            .role("A", ["B"])
            .role("B", ["C"])
            .role("C", ["A"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("cycle")));
    }

    #[test]
    fn test_flat_and_unregistered() {
        let h = RoleHierarchy::flat(["Employee", "Customer"]);
        assert!(h.contains(&"Employee".into()));
        assert!(!h.is_subtype(&"Employee".into(), &"Customer".into()));
        assert!(h.is_subtype(&"Guest".into(), &"Guest".into()));
        assert!(!h.contains(&"Guest".into()));
    }
}
