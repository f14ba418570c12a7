//! Capability assembly for guarded types.
//!
//! This crate sits between the schema of a backend and the [`policy`]
//! engine: it knows which types are guarded, what members they declare, and
//! how to turn their constraints into the capability sets clients consume.
//!
//! # Core Concepts
//!
//! ## AccessRegistry
//!
//! The [`AccessRegistry`] maps guarded type names to their
//! [`policy::AccessControl`]. It is populated once at bootstrap and
//! validated against the role hierarchy and the schema. Types without an
//! entry are open.
//!
//! ## Assembler
//!
//! The [`Assembler`] evaluates one authorization query: it calls the engine
//! for the type itself, each of its attributes, relationships and
//! operations, and packages the results as [`EntityCapabilities`] or
//! [`InstanceCapabilities`].
//!
//! ## SchemaLookup
//!
//! [`SchemaLookup`] answers "does this type declare that member". The
//! in-memory [`Schema`] implements it.
//!
//! # Example
//!
//! ```
//! use access::{AccessRegistry, Assembler, Entity, Operation, Schema};
//! use policy::{can, constraint, roles, AccessControl, Capability, Constraint, Role, RoleHierarchy};
//!
//! let schema = Schema::new().with_entity(
//!     Entity::new("Customer")
//!         .with_properties(["name"])
//!         .with_operation(Operation::finder("allCustomers")),
//! );
//! let registry = AccessRegistry::new(RoleHierarchy::flat(["Employee", "Customer"])).with(
//!     "Customer",
//!     AccessControl::new(vec![
//!         constraint(roles(["Employee"]), can([Capability::Create, Capability::List])),
//!         Constraint::behavior("allCustomers", roles(["Employee"]), can([Capability::Call])),
//!     ]),
//! )?;
//! registry.validate(&schema)?;
//!
//! let assembler = Assembler::new(&schema, &registry);
//! let caps = assembler.entity_capabilities("Customer", &[Role::new("Employee", "e1")])?;
//! assert!(caps.allows(Capability::Create));
//! assert!(caps.queries["allCustomers"].contains("Call"));
//! # Ok::<(), access::Error>(())
//! ```

mod assembler;
mod capabilities;
mod error;
mod registry;
mod resolver;
mod schema;

pub use assembler::Assembler;
pub use capabilities::{CapabilityNames, EntityCapabilities, InstanceCapabilities};
pub use error::{Error, Result};
pub use registry::AccessRegistry;
pub use resolver::{RoleResolver, StaticRoleResolver};
pub use schema::{Entity, Operation, OperationKind, Schema, SchemaLookup};
