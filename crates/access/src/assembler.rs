//! Assembles the capability sets for one authorization query.

use policy::{
    AccessControl, Capability, CapabilityEngine, CapabilityTarget, ConstraintLayer, Instance,
    Role, capabilities_for_targets,
};
use std::collections::BTreeMap;
use std::slice;
use tracing::debug;

use crate::capabilities::{CapabilityNames, to_names};
use crate::{
    AccessRegistry, Entity, EntityCapabilities, Error, InstanceCapabilities, OperationKind,
    Result, SchemaLookup,
};

/// Runs the capability engine once per target of a guarded type.
///
/// The type-wide constraints form the outer layer of every check; checks on
/// a named attribute, relationship or operation add the constraints naming
/// that member as the inner layer.
pub struct Assembler<'a, S> {
    schema: &'a S,
    registry: &'a AccessRegistry,
}

impl<'a, S: SchemaLookup> Assembler<'a, S> {
    pub fn new(schema: &'a S, registry: &'a AccessRegistry) -> Self {
        Self { schema, registry }
    }

    fn entity(&self, type_name: &str) -> Result<&'a Entity> {
        self.schema
            .entity(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    fn engine(&self) -> CapabilityEngine<'a> {
        CapabilityEngine::new(self.registry.hierarchy())
    }

    /// Capabilities over the type itself and its type-level operations.
    pub fn entity_capabilities(&self, type_name: &str, roles: &[Role]) -> Result<EntityCapabilities> {
        let entity = self.entity(type_name)?;
        let Some(access) = self.registry.get(type_name) else {
            debug!(type_name, "no access control, all entity capabilities");
            return Ok(open_entity_capabilities(entity));
        };

        let engine = self.engine();
        let outer = access.entity_layer();
        let capabilities = EntityCapabilities {
            entity: to_names(engine.compute(
                None,
                roles,
                &[CapabilityTarget::Entity],
                slice::from_ref(&outer),
            )?),
            queries: self.operations(
                &engine,
                None,
                roles,
                access,
                &outer,
                entity.static_operations(OperationKind::Finder).map(|o| o.name.as_str()),
            )?,
            static_actions: self.operations(
                &engine,
                None,
                roles,
                access,
                &outer,
                entity.static_operations(OperationKind::Action).map(|o| o.name.as_str()),
            )?,
        };
        debug!(type_name, entity = ?capabilities.entity, "entity capabilities");
        Ok(capabilities)
    }

    /// Capabilities over one instance and its members.
    ///
    /// `instance` is handed to access predicates.
    pub fn instance_capabilities(
        &self,
        type_name: &str,
        instance: Option<&Instance>,
        roles: &[Role],
    ) -> Result<InstanceCapabilities> {
        let entity = self.entity(type_name)?;
        let Some(access) = self.registry.get(type_name) else {
            debug!(type_name, "no access control, all instance capabilities");
            return Ok(open_instance_capabilities(entity));
        };

        let engine = self.engine();
        let outer = access.entity_layer();
        let data = |names: &[String], target: CapabilityTarget| {
            names
                .iter()
                .map(|name| -> Result<(String, CapabilityNames)> {
                    let inner = access.data_layer(name);
                    let caps = engine.compute(instance, roles, &[target], &[outer.clone(), inner])?;
                    Ok((name.clone(), to_names(caps)))
                })
                .collect::<Result<BTreeMap<_, _>>>()
        };

        let capabilities = InstanceCapabilities {
            instance: to_names(engine.compute(
                instance,
                roles,
                &[CapabilityTarget::Instance],
                slice::from_ref(&outer),
            )?),
            attributes: data(&entity.properties, CapabilityTarget::Property)?,
            relationships: data(&entity.relationships, CapabilityTarget::Relationship)?,
            actions: self.operations(
                &engine,
                instance,
                roles,
                access,
                &outer,
                entity.instance_actions().map(|o| o.name.as_str()),
            )?,
        };
        debug!(type_name, instance = ?capabilities.instance, "instance capabilities");
        Ok(capabilities)
    }

    fn operations<'n>(
        &self,
        engine: &CapabilityEngine<'_>,
        instance: Option<&Instance>,
        roles: &[Role],
        access: &AccessControl,
        outer: &ConstraintLayer<'_>,
        names: impl Iterator<Item = &'n str>,
    ) -> Result<BTreeMap<String, CapabilityNames>> {
        names
            .map(|name| -> Result<(String, CapabilityNames)> {
                let layers = [outer.clone(), access.behavior_layer(name)];
                let caps = engine.compute(instance, roles, &[CapabilityTarget::Operation], &layers)?;
                Ok((name.to_string(), to_names(caps)))
            })
            .collect()
    }

    /// Fail with [`Error::AccessDenied`] unless `capability` is held on the type.
    pub fn require_entity_capability(
        &self,
        type_name: &str,
        roles: &[Role],
        capability: Capability,
    ) -> Result<()> {
        if self.entity_capabilities(type_name, roles)?.allows(capability) {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                capability,
                target: type_name.to_string(),
            })
        }
    }

    /// Fail with [`Error::AccessDenied`] unless `capability` is held on the instance.
    pub fn require_instance_capability(
        &self,
        type_name: &str,
        instance: Option<&Instance>,
        roles: &[Role],
        capability: Capability,
    ) -> Result<()> {
        if self
            .instance_capabilities(type_name, instance, roles)?
            .allows(capability)
        {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                capability,
                target: match instance {
                    Some(i) => format!("{type_name} {}", i.id),
                    None => type_name.to_string(),
                },
            })
        }
    }
}

fn all_for(target: CapabilityTarget) -> CapabilityNames {
    to_names(capabilities_for_targets(&[target]))
}

fn open_entity_capabilities(entity: &Entity) -> EntityCapabilities {
    let operations = |kind: OperationKind| -> BTreeMap<String, CapabilityNames> {
        entity
            .static_operations(kind)
            .map(|o| (o.name.clone(), all_for(CapabilityTarget::Operation)))
            .collect()
    };
    EntityCapabilities {
        entity: all_for(CapabilityTarget::Entity),
        queries: operations(OperationKind::Finder),
        static_actions: operations(OperationKind::Action),
    }
}

fn open_instance_capabilities(entity: &Entity) -> InstanceCapabilities {
    let members = |names: &[String], target: CapabilityTarget| -> BTreeMap<String, CapabilityNames> {
        names
            .iter()
            .map(|name| (name.clone(), all_for(target)))
            .collect()
    };
    InstanceCapabilities {
        instance: all_for(CapabilityTarget::Instance),
        attributes: members(&entity.properties, CapabilityTarget::Property),
        relationships: members(&entity.relationships, CapabilityTarget::Relationship),
        actions: entity
            .instance_actions()
            .map(|o| (o.name.clone(), all_for(CapabilityTarget::Operation)))
            .collect(),
    }
}
