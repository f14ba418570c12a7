//! Shape of the guarded types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A query returning instances.
    Finder,
    /// An action with side effects.
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    /// Invoked on an instance rather than on the type.
    #[serde(default)]
    pub instance: bool,
}

impl Operation {
    pub fn finder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OperationKind::Finder,
            instance: false,
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OperationKind::Action,
            instance: false,
        }
    }

    pub fn on_instance(mut self) -> Self {
        self.instance = true;
        self
    }
}

/// A guarded type as declared in the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_relationships<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    pub fn has_relationship(&self, name: &str) -> bool {
        self.relationships.iter().any(|r| r == name)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.name == name)
    }

    /// Type-level operations of the given kind.
    pub fn static_operations(&self, kind: OperationKind) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(move |o| o.kind == kind && !o.instance)
    }

    /// Instance-level actions.
    pub fn instance_actions(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|o| o.kind == OperationKind::Action && o.instance)
    }
}

/// Answers questions about the declared shape of guarded types.
pub trait SchemaLookup {
    fn entity(&self, name: &str) -> Option<&Entity>;
}

/// In-memory schema keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: BTreeMap<String, Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity.
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.insert(entity);
        self
    }

    /// Build from a name → entity table, as found in configuration.
    ///
    /// Entity names are taken from the table keys.
    pub fn from_table(table: BTreeMap<String, Entity>) -> Self {
        let entities = table
            .into_iter()
            .map(|(name, mut entity)| {
                entity.name = name.clone();
                (name, entity)
            })
            .collect();
        Self { entities }
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

impl SchemaLookup for Schema {
    fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_partitions() {
        let entity = Entity::new("Customer")
            .with_operation(Operation::finder("allCustomers"))
            .with_operation(Operation::action("import"))
            .with_operation(Operation::action("suspend").on_instance());

        let finders: Vec<_> = entity
            .static_operations(OperationKind::Finder)
            .map(|o| o.name.as_str())
            .collect();
        let actions: Vec<_> = entity
            .static_operations(OperationKind::Action)
            .map(|o| o.name.as_str())
            .collect();
        let instance: Vec<_> = entity.instance_actions().map(|o| o.name.as_str()).collect();

        assert_eq!(finders, vec!["allCustomers"]);
        assert_eq!(actions, vec!["import"]);
        assert_eq!(instance, vec!["suspend"]);
    }

    #[test]
    fn test_from_table_names_entities() {
        let table: BTreeMap<String, Entity> = toml::from_str(
            r#"
[Customer]
properties = ["name", "email"]
relationships = ["orders"]
operations = [{ name = "allCustomers", kind = "finder" }]
"#,
        )
        .unwrap();
        let schema = Schema::from_table(table);
        let customer = schema.entity("Customer").unwrap();
        assert_eq!(customer.name, "Customer");
        assert!(customer.has_property("email"));
        assert!(customer.has_relationship("orders"));
        assert_eq!(
            customer.operation("allCustomers").map(|o| o.kind),
            Some(OperationKind::Finder)
        );
        assert!(schema.entity("Order").is_none());
    }
}
