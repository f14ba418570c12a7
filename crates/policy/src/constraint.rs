//! Access constraint declarations.
//!
//! Constraints are plain immutable data, built once while configuring the
//! guarded types:
//!
//! ```
//! use policy::{can, constraint, roles, AccessControl, Capability, Constraint, SameIdentity};
//! use std::sync::Arc;
//!
//! let access = AccessControl::new(vec![
//!     constraint(roles(["Customer"]), can([Capability::Update]))
//!         .with_predicate(Arc::new(SameIdentity)),
//!     constraint(roles(["Employee"]), can([Capability::Create, Capability::List])),
//!     Constraint::behavior("allCustomers", roles(["Employee"]), can([Capability::Call])),
//! ]);
//! assert_eq!(access.entity_layer().len(), 2);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{AccessPredicate, Capability, RoleType};

/// Whether a constraint grants or revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    /// Revokes every capability for the matched roles.
    Deny,
}

/// What part of the guarded type a constraint is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintScope {
    /// The type as a whole.
    Entity,
    /// A named attribute or relationship.
    Data(String),
    /// A named operation.
    Behavior(String),
}

/// The capability side of a constraint, as produced by [`can`] or [`deny`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub effect: Effect,
    pub capabilities: BTreeSet<Capability>,
}

/// A declarative rule granting or denying capabilities to role types.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub scope: ConstraintScope,
    pub effect: Effect,
    /// Granted capabilities. Ignored for [`Effect::Deny`].
    pub capabilities: BTreeSet<Capability>,
    /// Role types this constraint applies to, subtypes included.
    pub roles: BTreeSet<RoleType>,
    pub predicate: Option<Arc<dyn AccessPredicate>>,
}

impl Constraint {
    fn scoped(scope: ConstraintScope, roles: BTreeSet<RoleType>, permission: Permission) -> Self {
        Self {
            scope,
            effect: permission.effect,
            capabilities: permission.capabilities,
            roles,
            predicate: None,
        }
    }

    pub fn entity(roles: BTreeSet<RoleType>, permission: Permission) -> Self {
        Self::scoped(ConstraintScope::Entity, roles, permission)
    }

    pub fn data(name: impl Into<String>, roles: BTreeSet<RoleType>, permission: Permission) -> Self {
        Self::scoped(ConstraintScope::Data(name.into()), roles, permission)
    }

    pub fn behavior(
        name: impl Into<String>,
        roles: BTreeSet<RoleType>,
        permission: Permission,
    ) -> Self {
        Self::scoped(ConstraintScope::Behavior(name.into()), roles, permission)
    }

    /// Gate this constraint with an instance-level predicate.
    pub fn with_predicate(mut self, predicate: Arc<dyn AccessPredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn is_deny(&self) -> bool {
        self.effect == Effect::Deny
    }
}

/// Entity-scoped constraint.
pub fn constraint(roles: BTreeSet<RoleType>, permission: Permission) -> Constraint {
    Constraint::entity(roles, permission)
}

pub fn roles<I, R>(roles: I) -> BTreeSet<RoleType>
where
    I: IntoIterator<Item = R>,
    R: Into<RoleType>,
{
    roles.into_iter().map(Into::into).collect()
}

pub fn can(capabilities: impl IntoIterator<Item = Capability>) -> Permission {
    Permission {
        effect: Effect::Allow,
        capabilities: capabilities.into_iter().collect(),
    }
}

/// Revoke everything for the matched roles.
pub fn deny() -> Permission {
    Permission {
        effect: Effect::Deny,
        capabilities: BTreeSet::new(),
    }
}

/// An ordered group of constraints evaluated together.
#[derive(Debug, Clone, Default)]
pub struct ConstraintLayer<'a> {
    constraints: Vec<&'a Constraint>,
}

impl<'a> ConstraintLayer<'a> {
    pub fn new(constraints: impl IntoIterator<Item = &'a Constraint>) -> Self {
        Self {
            constraints: constraints.into_iter().collect(),
        }
    }

    pub fn constraints(&self) -> &[&'a Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl<'a> FromIterator<&'a Constraint> for ConstraintLayer<'a> {
    fn from_iter<T: IntoIterator<Item = &'a Constraint>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// The access constraints attached to one guarded type.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    constraints: Vec<Constraint>,
}

impl AccessControl {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Type-wide constraints; the outer layer of every check.
    pub fn entity_layer(&self) -> ConstraintLayer<'_> {
        self.constraints
            .iter()
            .filter(|c| c.scope == ConstraintScope::Entity)
            .collect()
    }

    /// Constraints naming the given attribute or relationship.
    pub fn data_layer(&self, name: &str) -> ConstraintLayer<'_> {
        self.constraints
            .iter()
            .filter(|c| matches!(&c.scope, ConstraintScope::Data(n) if n == name))
            .collect()
    }

    /// Constraints naming the given operation.
    pub fn behavior_layer(&self, name: &str) -> ConstraintLayer<'_> {
        self.constraints
            .iter()
            .filter(|c| matches!(&c.scope, ConstraintScope::Behavior(n) if n == name))
            .collect()
    }

    /// Every role type referenced by a constraint.
    pub fn role_types(&self) -> BTreeSet<&RoleType> {
        self.constraints.iter().flat_map(|c| c.roles.iter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AccessControl {
        AccessControl::new(vec![
            constraint(roles(["Customer"]), can([Capability::Read])),
            constraint(roles(["Employee"]), can([Capability::Create])),
            Constraint::data("email", roles(["Employee"]), can([Capability::Read])),
            Constraint::behavior("suspend", roles(["Customer"]), deny()),
        ])
    }

    #[test]
    fn test_layers_by_scope() {
        let access = sample();
        assert_eq!(access.entity_layer().len(), 2);
        assert_eq!(access.data_layer("email").len(), 1);
        assert!(access.data_layer("name").is_empty());
        assert_eq!(access.behavior_layer("suspend").len(), 1);
        assert!(access.behavior_layer("email").is_empty());
    }

    #[test]
    fn test_deny_permission() {
        let access = sample();
        let suspend = access.behavior_layer("suspend");
        assert!(suspend.constraints()[0].is_deny());
        assert!(suspend.constraints()[0].capabilities.is_empty());
    }

    #[test]
    fn test_role_types() {
        let access = sample();
        let types: Vec<_> = access.role_types().into_iter().map(RoleType::as_str).collect();
        assert_eq!(types, vec!["Customer", "Employee"]);
    }
}
