//! Constraint declarations loaded from TOML.
//!
//! ```toml
//! [[access.Customer]]
//! roles = ["Customer"]
//! can = ["Update"]
//! provided = { kind = "same_identity" }
//!
//! [[access.Customer]]
//! operation = "allCustomers"
//! roles = ["Employee"]
//! can = ["Call"]
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    AccessControl, Capability, Constraint, Error, Permission, PredicateDecl, Result, can, deny,
    roles,
};

/// Spelling of the deny effect in `can` lists.
const DENY_ALL: &str = "None";
/// Shorthand for every capability.
const ALLOW_ALL: &str = "All";

/// One constraint as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDecl {
    /// Restrict to a named attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Restrict to a named relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    /// Restrict to a named operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    /// Role types the constraint applies to.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Capability names, `"All"`, or `"None"` to revoke everything.
    #[serde(default)]
    pub can: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided: Option<PredicateDecl>,
}

impl ConstraintDecl {
    pub fn into_constraint(self) -> Result<Constraint> {
        let permission = parse_permission(&self.can)?;
        let role_types = roles(self.roles);
        let mut constraint = match (self.attribute, self.relationship, self.operation) {
            (None, None, None) => Constraint::entity(role_types, permission),
            (Some(name), None, None) | (None, Some(name), None) => {
                Constraint::data(name, role_types, permission)
            }
            (None, None, Some(name)) => Constraint::behavior(name, role_types, permission),
            _ => {
                return Err(Error::Configuration(
                    "a constraint names at most one of attribute, relationship or operation"
                        .to_string(),
                ));
            }
        };
        if let Some(predicate) = self.provided {
            constraint = constraint.with_predicate(predicate.into_predicate());
        }
        Ok(constraint)
    }
}

fn parse_permission(names: &[String]) -> Result<Permission> {
    if names.is_empty() {
        return Err(Error::Configuration(
            "constraint grants no capabilities".to_string(),
        ));
    }
    if names.iter().any(|n| n == DENY_ALL) {
        if names.len() > 1 {
            return Err(Error::Configuration(format!(
                "'{DENY_ALL}' cannot be combined with other capabilities"
            )));
        }
        return Ok(deny());
    }
    if names.iter().any(|n| n == ALLOW_ALL) {
        return Ok(can(Capability::ALL));
    }
    let capabilities = names
        .iter()
        .map(|n| n.parse::<Capability>())
        .collect::<Result<Vec<_>>>()?;
    Ok(can(capabilities))
}

impl AccessControl {
    /// Build from declarations, failing on the first malformed one.
    pub fn from_decls(decls: impl IntoIterator<Item = ConstraintDecl>) -> Result<Self> {
        let constraints = decls
            .into_iter()
            .map(ConstraintDecl::into_constraint)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(constraints))
    }
}
