//! Registry of guarded types.

use policy::{AccessControl, ConstraintScope, RoleHierarchy};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{Error, Result, SchemaLookup};

/// Maps guarded type names to their access control, populated at bootstrap.
///
/// Types without an entry are open to everyone.
#[derive(Debug, Clone, Default)]
pub struct AccessRegistry {
    hierarchy: RoleHierarchy,
    controls: BTreeMap<String, AccessControl>,
}

impl AccessRegistry {
    pub fn new(hierarchy: RoleHierarchy) -> Self {
        Self {
            hierarchy,
            controls: BTreeMap::new(),
        }
    }

    /// Attach access control to a type.
    ///
    /// Every role type referenced must be registered in the hierarchy.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        access_control: AccessControl,
    ) -> Result<()> {
        let type_name = type_name.into();
        if self.controls.contains_key(&type_name) {
            return Err(Error::Configuration(format!(
                "access control for '{type_name}' registered twice"
            )));
        }
        if let Some(unknown) = access_control
            .role_types()
            .into_iter()
            .find(|r| !self.hierarchy.contains(r))
        {
            return Err(Error::Configuration(format!(
                "access control for '{type_name}' references unknown role '{unknown}'"
            )));
        }
        for c in access_control.constraints() {
            if c.roles.is_empty() {
                warn!(type_name = %type_name, scope = ?c.scope, "constraint has no roles and never matches");
            }
        }
        debug!(
            type_name = %type_name,
            constraints = access_control.constraints().len(),
            "registered access control"
        );
        self.controls.insert(type_name, access_control);
        Ok(())
    }

    pub fn with(mut self, type_name: impl Into<String>, access_control: AccessControl) -> Result<Self> {
        self.register(type_name, access_control)?;
        Ok(self)
    }

    pub fn get(&self, type_name: &str) -> Option<&AccessControl> {
        self.controls.get(type_name)
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    /// Check every registration against the schema.
    ///
    /// Guarded types must exist, data constraints must name a declared
    /// property or relationship, behavior constraints a declared operation.
    pub fn validate(&self, schema: &impl SchemaLookup) -> Result<()> {
        for (type_name, access_control) in &self.controls {
            let entity = schema
                .entity(type_name)
                .ok_or_else(|| Error::Configuration(format!("'{type_name}' is not in the schema")))?;
            for c in access_control.constraints() {
                match &c.scope {
                    ConstraintScope::Entity => {}
                    ConstraintScope::Data(name) => {
                        if !entity.has_property(name) && !entity.has_relationship(name) {
                            return Err(Error::Configuration(format!(
                                "'{type_name}' has no attribute or relationship '{name}'"
                            )));
                        }
                    }
                    ConstraintScope::Behavior(name) => {
                        if entity.operation(name).is_none() {
                            return Err(Error::Configuration(format!(
                                "'{type_name}' has no operation '{name}'"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
