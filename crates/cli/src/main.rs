mod config;
mod error;

use std::path::{Path, PathBuf};

use access::{Assembler, RoleResolver, StaticRoleResolver};
use clap::{Parser, Subcommand};
use policy::{Instance, Role};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use config::{Bootstrap, Config};
use error::{Error, Result};

const CONFIG_FILE: &str = "capgate.toml";
const LOG_ENV: &str = "CAPGATE_LOG";

#[derive(Parser)]
#[command(name = "capgate")]
#[command(about = "Capability checks for guarded types", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration
    Check,
    /// Show what the actor may do with a type
    Entity {
        /// Guarded type name
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Role held by the actor, as TYPE:ID (repeatable)
        #[arg(short, long = "role", value_parser = parse_role)]
        roles: Vec<Role>,
    },
    /// Show what the actor may do with an instance
    Instance {
        /// Guarded type name
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Instance id
        #[arg(long)]
        id: Option<String>,
        /// Instance attribute, as NAME=VALUE (repeatable)
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, Value)>,
        /// Role held by the actor, as TYPE:ID (repeatable)
        #[arg(short, long = "role", value_parser = parse_role)]
        roles: Vec<Role>,
    },
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let bootstrap = load(&cli.config)?;

    match cli.command {
        Commands::Check => cmd_check(&bootstrap),
        Commands::Entity { type_name, roles } => {
            cmd_entity(&bootstrap, &type_name, &resolver(roles))
        }
        Commands::Instance {
            type_name,
            id,
            attributes,
            roles,
        } => {
            let instance = match id {
                Some(id) => Some(attributes.into_iter().fold(
                    Instance::new(&type_name, id),
                    |instance, (name, value)| instance.with_attribute(name, value),
                )),
                None if !attributes.is_empty() => {
                    return Err(Error::InvalidArgument("--attr requires --id".to_string()));
                }
                None => None,
            };
            cmd_instance(
                &bootstrap,
                &type_name,
                instance.as_ref(),
                &resolver(roles),
            )
        }
    }
}

/// Without `--role` the actor holds no roles at all.
fn resolver(roles: Vec<Role>) -> StaticRoleResolver {
    if roles.is_empty() {
        StaticRoleResolver::anonymous()
    } else {
        StaticRoleResolver::new(roles)
    }
}

fn load(path: &Path) -> Result<Bootstrap> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(Config::load(path)?.bootstrap()?)
}

fn cmd_check(bootstrap: &Bootstrap) -> Result<()> {
    let hierarchy = bootstrap.registry.hierarchy();
    println!("roles:         {}", hierarchy.role_types().count());
    println!("entities:      {}", bootstrap.schema.entities().count());
    println!("guarded types: {}", bootstrap.registry.type_names().count());
    println!("configuration OK");
    Ok(())
}

fn cmd_entity(bootstrap: &Bootstrap, type_name: &str, resolver: &impl RoleResolver) -> Result<()> {
    let roles = actor_roles(bootstrap, resolver)?;
    let assembler = Assembler::new(&bootstrap.schema, &bootstrap.registry);
    print_json(&assembler.entity_capabilities(type_name, &roles)?)
}

fn cmd_instance(
    bootstrap: &Bootstrap,
    type_name: &str,
    instance: Option<&Instance>,
    resolver: &impl RoleResolver,
) -> Result<()> {
    let roles = actor_roles(bootstrap, resolver)?;
    let assembler = Assembler::new(&bootstrap.schema, &bootstrap.registry);
    print_json(&assembler.instance_capabilities(type_name, instance, &roles)?)
}

fn actor_roles(bootstrap: &Bootstrap, resolver: &impl RoleResolver) -> Result<Vec<Role>> {
    let roles = resolver.current_roles()?;
    let hierarchy = bootstrap.registry.hierarchy();
    for role in roles.iter().filter(|r| !hierarchy.contains(&r.role_type)) {
        warn!(role = %role.role_type, "role type is not declared in [roles]");
    }
    Ok(roles)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `TYPE:ID`; a bare `TYPE` gets an empty id.
fn parse_role(s: &str) -> std::result::Result<Role, String> {
    let (role_type, id) = s.split_once(':').unwrap_or((s, ""));
    if role_type.is_empty() {
        return Err(format!("missing role type in '{s}'"));
    }
    Ok(Role::new(role_type, id))
}

/// Parse `NAME=VALUE`; values that are valid JSON are taken as JSON.
fn parse_attribute(s: &str) -> std::result::Result<(String, Value), String> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("Customer:c1").unwrap(), Role::new("Customer", "c1"));
        assert_eq!(parse_role("Employee").unwrap(), Role::new("Employee", ""));
        assert!(parse_role(":c1").is_err());
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("total=12").unwrap(),
            ("total".to_string(), Value::from(12))
        );
        assert_eq!(
            parse_attribute("customer=c1").unwrap(),
            ("customer".to_string(), Value::from("c1"))
        );
        assert!(parse_attribute("customer").is_err());
    }

    #[test]
    fn test_no_role_flag_is_anonymous() {
        let cli = Cli::try_parse_from(["capgate", "entity", "-t", "Customer"]).unwrap();
        let Commands::Entity { roles, .. } = cli.command else {
            panic!("expected entity command");
        };
        assert!(resolver(roles).current_roles().unwrap().is_empty());

        let roles = vec![Role::new("Employee", "e1")];
        assert_eq!(resolver(roles.clone()).current_roles().unwrap(), roles);
    }

    #[test]
    fn test_parse_instance_command() {
        let cli = Cli::try_parse_from([
            "capgate", "instance", "-t", "Order", "--id", "o1", "--attr", "customer=c1", "-r",
            "Customer:c1",
        ])
        .unwrap();
        match cli.command {
            Commands::Instance {
                type_name,
                id,
                attributes,
                roles,
            } => {
                assert_eq!(type_name, "Order");
                assert_eq!(id.as_deref(), Some("o1"));
                assert_eq!(attributes.len(), 1);
                assert_eq!(roles, vec![Role::new("Customer", "c1")]);
            }
            _ => panic!("expected instance command"),
        }
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }
}
