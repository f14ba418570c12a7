//! Capability computation.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::grant::{GrantLayer, build_layer, matches_role};
use crate::{
    Capability, CapabilityTarget, Constraint, ConstraintLayer, Instance, Result, Role,
    RoleHierarchy, RoleType, capabilities_for_targets,
};

/// Computes the capabilities an actor holds over some target.
///
/// Stateless apart from the borrowed role hierarchy; safe to share across
/// threads and to call on every request.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityEngine<'h> {
    hierarchy: &'h RoleHierarchy,
}

impl<'h> CapabilityEngine<'h> {
    pub fn new(hierarchy: &'h RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Compute the capabilities granted to `roles` for `targets`.
    ///
    /// `layers` run outer to inner. With no layers at all, everything
    /// applicable to `targets` is allowed. Otherwise the actor gets only what
    /// the layers grant to declared role types it holds. Grants for a
    /// declared role type in an inner layer replace whatever outer layers
    /// gave that same declared role type.
    ///
    /// Predicate failures abort the computation.
    pub fn compute(
        &self,
        instance: Option<&Instance>,
        roles: &[Role],
        targets: &[CapabilityTarget],
        layers: &[ConstraintLayer<'_>],
    ) -> Result<BTreeSet<Capability>> {
        if layers.is_empty() {
            let capabilities = capabilities_for_targets(targets);
            debug!(?targets, ?capabilities, "no constraints, default allow");
            return Ok(capabilities);
        }

        let role_types: BTreeSet<RoleType> = roles.iter().map(|r| r.role_type.clone()).collect();
        let merged = layers
            .iter()
            .map(|layer| build_layer(targets, &role_types, layer, self.hierarchy))
            .reduce(GrantLayer::merge)
            .unwrap_or_default();

        let mut verdicts: Vec<(&Constraint, bool)> = Vec::new();
        let mut capabilities = BTreeSet::new();
        for role_grant in merged.role_grants.values() {
            for grant in &role_grant.capability_grants {
                if !grant.constraint_grant.granted {
                    continue;
                }
                let constraint = grant.constraint_grant.constraint;
                let satisfied = match verdicts.iter().find(|(c, _)| std::ptr::eq(*c, constraint)) {
                    Some(&(_, verdict)) => verdict,
                    None => {
                        let verdict = self.check_predicate(constraint, instance, roles)?;
                        verdicts.push((constraint, verdict));
                        verdict
                    }
                };
                if satisfied {
                    capabilities.insert(grant.capability);
                }
            }
        }

        debug!(
            ?targets,
            layers = layers.len(),
            roles = role_types.len(),
            ?capabilities,
            "computed capabilities"
        );
        Ok(capabilities)
    }

    /// True if the constraint has no predicate, or its predicate holds for
    /// at least one of the actor's roles matching the constraint.
    fn check_predicate(
        &self,
        constraint: &Constraint,
        instance: Option<&Instance>,
        roles: &[Role],
    ) -> Result<bool> {
        let Some(predicate) = &constraint.predicate else {
            return Ok(true);
        };
        for role in roles
            .iter()
            .filter(|r| matches_role(self.hierarchy, &r.role_type, constraint))
        {
            match predicate.evaluate(instance, role) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    warn!(predicate = predicate.name(), role = %role.role_type, "predicate failed: {e}");
                    return Err(e.into());
                }
            }
        }
        Ok(false)
    }
}

/// Convenience wrapper around [`CapabilityEngine::compute`].
pub fn compute_capabilities(
    hierarchy: &RoleHierarchy,
    instance: Option<&Instance>,
    roles: &[Role],
    targets: &[CapabilityTarget],
    layers: &[ConstraintLayer<'_>],
) -> Result<BTreeSet<Capability>> {
    CapabilityEngine::new(hierarchy).compute(instance, roles, targets, layers)
}
