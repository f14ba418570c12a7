//! Configuration loading from capgate.toml.

use access::{AccessRegistry, Entity, Schema};
use policy::{AccessControl, ConstraintDecl, RoleHierarchy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Role types, each with the role types it extends.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,

    /// Guarded type shapes, keyed by type name.
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,

    /// Access constraints, keyed by guarded type name.
    #[serde(default)]
    pub access: BTreeMap<String, Vec<ConstraintDecl>>,
}

/// Everything needed to answer capability queries.
#[derive(Debug)]
pub struct Bootstrap {
    pub schema: Schema,
    pub registry: AccessRegistry,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the role hierarchy.
    pub fn hierarchy(&self) -> Result<RoleHierarchy, ConfigError> {
        let builder = self
            .roles
            .iter()
            .fold(RoleHierarchy::builder(), |b, (role, parents)| {
                b.role(role.as_str(), parents.iter().map(String::as_str))
            });
        Ok(builder.build()?)
    }

    /// Resolve roles, schema and access control, and validate them together.
    pub fn bootstrap(self) -> Result<Bootstrap, ConfigError> {
        let hierarchy = self.hierarchy()?;
        let schema = Schema::from_table(self.entities);

        let mut registry = AccessRegistry::new(hierarchy);
        for (type_name, decls) in self.access {
            let access_control = AccessControl::from_decls(decls)?;
            registry.register(type_name, access_control)?;
        }
        registry.validate(&schema)?;

        Ok(Bootstrap { schema, registry })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error(transparent)]
    Access(#[from] access::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use access::Assembler;
    use policy::{Instance, Role};

    const EXAMPLE: &str = include_str!("../capgate.example.toml");

    #[test]
    fn test_example_bootstraps() {
        let config = Config::parse(EXAMPLE).unwrap();
        assert_eq!(config.roles.len(), 3);
        assert_eq!(config.entities.len(), 3);

        let Bootstrap { schema, registry } = config.bootstrap().unwrap();
        assert!(registry.get("Customer").is_some());
        assert!(registry.get("Category").is_none());

        let assembler = Assembler::new(&schema, &registry);
        let caps = assembler
            .entity_capabilities("Customer", &[Role::new("Employee", "e1")])
            .unwrap();
        assert!(caps.entity.contains("Create"));
        assert!(caps.queries["allCustomers"].contains("Call"));

        let own = Instance::new("Customer", "c1");
        let caps = assembler
            .instance_capabilities("Customer", Some(&own), &[Role::new("Customer", "c1")])
            .unwrap();
        assert!(caps.instance.contains("Update"));
        assert!(caps.attributes["email"].is_empty());
    }

    #[test]
    fn test_employee_gets_all_on_orders() {
        let Bootstrap { schema, registry } = Config::parse(EXAMPLE).unwrap().bootstrap().unwrap();
        let assembler = Assembler::new(&schema, &registry);
        let order = Instance::new("Order", "o1").with_attribute("customer", "c9");
        let caps = assembler
            .instance_capabilities("Order", Some(&order), &[Role::new("Employee", "e1")])
            .unwrap();
        let instance: Vec<_> = caps.instance.iter().map(String::as_str).collect();
        assert_eq!(instance, vec!["Delete", "Read", "Update"]);
    }

    #[test]
    fn test_unknown_role_in_access_rejected() {
        let toml = r#"
[roles]
Employee = []

[entities.Customer]

[[access.Customer]]
roles = ["Manager"]
can = ["Read"]
"#;
        let err = Config::parse(toml).unwrap().bootstrap().unwrap_err();
        assert!(matches!(err, ConfigError::Access(access::Error::Configuration(_))));
    }

    #[test]
    fn test_unknown_parent_role_rejected() {
        let toml = "[roles]\nCustomer = [\"Person\"]\n";
        let err = Config::parse(toml).unwrap().bootstrap().unwrap_err();
        assert!(matches!(err, ConfigError::Policy(policy::Error::Configuration(_))));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            Config::parse("[backend]\nmodel = \"x\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
