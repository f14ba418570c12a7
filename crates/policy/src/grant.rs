//! Per-evaluation grant structures.
//!
//! Everything here borrows from the declared constraints and lives only for
//! the duration of one capability computation.

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use crate::{
    Capability, CapabilityTarget, Constraint, ConstraintLayer, Effect, RoleHierarchy, RoleType,
    all_capabilities,
};

/// A constraint together with whether it grants or revokes.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintGrant<'a> {
    pub constraint: &'a Constraint,
    pub granted: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CapabilityGrant<'a> {
    pub capability: Capability,
    pub constraint_grant: ConstraintGrant<'a>,
}

/// The capability grants applicable to one role type within a layer.
#[derive(Debug, Clone)]
pub struct RoleGrant<'a> {
    pub role_type: RoleType,
    pub capability_grants: Vec<CapabilityGrant<'a>>,
}

impl<'a> RoleGrant<'a> {
    /// Accumulate another grant for the same role type.
    pub fn add(&mut self, other: RoleGrant<'a>) {
        self.capability_grants.extend(other.capability_grants);
    }
}

/// Role grants produced from one constraint layer.
#[derive(Debug, Clone, Default)]
pub struct GrantLayer<'a> {
    pub role_grants: BTreeMap<RoleType, RoleGrant<'a>>,
}

impl<'a> GrantLayer<'a> {
    /// Overlay an inner layer: its role grants replace ours wholesale.
    pub fn merge(mut self, next: GrantLayer<'a>) -> GrantLayer<'a> {
        self.role_grants.extend(next.role_grants);
        self
    }
}

/// Build the grant one constraint gives to one role type.
///
/// A deny constraint covers every capability, each marked as not granted.
pub fn build_role_grant<'a>(
    targets: &[CapabilityTarget],
    role_type: &RoleType,
    constraint: &'a Constraint,
) -> RoleGrant<'a> {
    let (granted, capabilities): (bool, BTreeSet<Capability>) = match constraint.effect {
        Effect::Deny => (false, all_capabilities()),
        Effect::Allow => (true, constraint.capabilities.clone()),
    };
    let capability_grants = capabilities
        .into_iter()
        .filter(|c| c.applies_to(targets))
        .map(|capability| CapabilityGrant {
            capability,
            constraint_grant: ConstraintGrant {
                constraint,
                granted,
            },
        })
        .collect();
    RoleGrant {
        role_type: role_type.clone(),
        capability_grants,
    }
}

/// Turn one constraint layer into grants keyed by declared role type.
///
/// A declared role type counts when one of the actor's role types is
/// assignable to it. Several constraints declaring the same role type union
/// their grants.
pub fn build_layer<'a>(
    targets: &[CapabilityTarget],
    actor_role_types: &BTreeSet<RoleType>,
    layer: &ConstraintLayer<'a>,
    hierarchy: &RoleHierarchy,
) -> GrantLayer<'a> {
    let mut role_grants: BTreeMap<RoleType, RoleGrant<'a>> = BTreeMap::new();
    for &constraint in layer.constraints() {
        let held = constraint.roles.iter().filter(|declared| {
            actor_role_types
                .iter()
                .any(|actor_type| hierarchy.is_subtype(actor_type, declared))
        });
        for declared in held {
            let grant = build_role_grant(targets, declared, constraint);
            trace!(
                role = %declared,
                effect = ?constraint.effect,
                grants = grant.capability_grants.len(),
                "constraint matched"
            );
            match role_grants.get_mut(declared) {
                Some(existing) => existing.add(grant),
                None => {
                    role_grants.insert(declared.clone(), grant);
                }
            }
        }
    }
    GrantLayer { role_grants }
}

/// Whether `role_type` is assignable to one of the constraint's role types.
pub(crate) fn matches_role(
    hierarchy: &RoleHierarchy,
    role_type: &RoleType,
    constraint: &Constraint,
) -> bool {
    constraint
        .roles
        .iter()
        .any(|required| hierarchy.is_subtype(role_type, required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{can, constraint, deny, roles};

    fn employee() -> BTreeSet<RoleType> {
        BTreeSet::from([RoleType::from("Employee")])
    }

    #[test]
    fn test_allow_grant_filtered_by_target() {
        let c = constraint(roles(["Employee"]), can(Capability::ALL));
        let grant = build_role_grant(&[CapabilityTarget::Entity], &"Employee".into(), &c);
        let caps: Vec<_> = grant.capability_grants.iter().map(|g| g.capability).collect();
        assert_eq!(caps, vec![Capability::Create, Capability::List]);
        assert!(grant.capability_grants.iter().all(|g| g.constraint_grant.granted));
    }

    #[test]
    fn test_deny_grant_covers_target_capabilities() {
        let c = constraint(roles(["Employee"]), deny());
        let grant = build_role_grant(&[CapabilityTarget::Instance], &"Employee".into(), &c);
        let caps: Vec<_> = grant.capability_grants.iter().map(|g| g.capability).collect();
        assert_eq!(caps, vec![Capability::Delete, Capability::Read, Capability::Update]);
        assert!(grant.capability_grants.iter().all(|g| !g.constraint_grant.granted));
    }

    #[test]
    fn test_layer_unions_same_role() {
        let constraints = [
            constraint(roles(["Employee"]), can([Capability::Read])),
            constraint(roles(["Employee"]), can([Capability::Update])),
            constraint(roles(["Customer"]), can([Capability::Delete])),
        ];
        let layer = ConstraintLayer::new(&constraints);
        let hierarchy = RoleHierarchy::flat(["Employee", "Customer"]);
        let grants = build_layer(&[CapabilityTarget::Property], &employee(), &layer, &hierarchy);
        assert_eq!(grants.role_grants.len(), 1);
        assert_eq!(grants.role_grants[&RoleType::from("Employee")].capability_grants.len(), 2);
    }

    #[test]
    fn test_layer_matches_subtypes() {
        let constraints = [constraint(roles(["Person"]), can([Capability::List]))];
        let layer = ConstraintLayer::new(&constraints);
        let hierarchy = RoleHierarchy::builder()
            .role("Person", Vec::<&str>::new())
            .role("Employee", ["Person"])
            .build()
            .unwrap();
        let grants = build_layer(&[CapabilityTarget::Entity], &employee(), &layer, &hierarchy);
        let keys: Vec<_> = grants.role_grants.keys().map(RoleType::as_str).collect();
        assert_eq!(keys, vec!["Person"]);
    }

    #[test]
    fn test_layer_keys_each_held_declared_role() {
        let constraints = [constraint(roles(["Person", "Employee", "Customer"]), can([Capability::Read]))];
        let layer = ConstraintLayer::new(&constraints);
        let hierarchy = RoleHierarchy::builder()
            .role("Person", Vec::<&str>::new())
            .role("Employee", ["Person"])
            .role("Customer", ["Person"])
            .build()
            .unwrap();
        let grants = build_layer(&[CapabilityTarget::Property], &employee(), &layer, &hierarchy);
        let keys: Vec<_> = grants.role_grants.keys().map(RoleType::as_str).collect();
        assert_eq!(keys, vec!["Employee", "Person"]);
    }

    #[test]
    fn test_merge_replaces_per_role() {
        let outer_constraints = [
            constraint(roles(["Employee"]), can([Capability::Read, Capability::Update])),
            constraint(roles(["Customer"]), can([Capability::Read])),
        ];
        let inner_constraints = [constraint(roles(["Employee"]), can([Capability::Read]))];
        let hierarchy = RoleHierarchy::flat(["Employee", "Customer"]);
        let actors = BTreeSet::from([RoleType::from("Employee"), RoleType::from("Customer")]);
        let targets = [CapabilityTarget::Property];

        let outer = build_layer(&targets, &actors, &ConstraintLayer::new(&outer_constraints), &hierarchy);
        let inner = build_layer(&targets, &actors, &ConstraintLayer::new(&inner_constraints), &hierarchy);
        let merged = outer.merge(inner);

        assert_eq!(merged.role_grants[&RoleType::from("Employee")].capability_grants.len(), 1);
        assert_eq!(merged.role_grants[&RoleType::from("Customer")].capability_grants.len(), 1);
    }
}
