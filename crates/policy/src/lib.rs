//! Capability-based access control.
//!
//! Core principle: **a guarded type with constraints grants nothing that is
//! not explicitly granted.** A type without any constraints is open.
//!
//! # Overview
//!
//! - [`Capability`] / [`CapabilityTarget`]: the fixed permission vocabulary
//!   and the kinds of element each permission applies to.
//! - [`Constraint`] / [`AccessControl`]: immutable declarations of which
//!   role types may do what, optionally gated by an [`AccessPredicate`].
//! - [`RoleHierarchy`]: the static role-type table used for subtype matching.
//! - [`CapabilityEngine`]: merges constraint layers (outer to inner, inner
//!   replaces outer per role) and returns the permitted capabilities.
//!
//! # Example
//!
//! ```
//! use policy::{
//!     can, compute_capabilities, constraint, roles, Capability, CapabilityTarget,
//!     ConstraintLayer, Role, RoleHierarchy,
//! };
//!
//! let hierarchy = RoleHierarchy::flat(["Employee", "Customer"]);
//! let outer = [constraint(roles(["Employee"]), can([Capability::Read, Capability::Update]))];
//! let inner = [constraint(roles(["Employee"]), can([Capability::Read]))];
//!
//! let caps = compute_capabilities(
//!     &hierarchy,
//!     None,
//!     &[Role::new("Employee", "e1")],
//!     &[CapabilityTarget::Property],
//!     &[ConstraintLayer::new(&outer), ConstraintLayer::new(&inner)],
//! )?;
//! assert_eq!(caps.into_iter().collect::<Vec<_>>(), vec![Capability::Read]);
//! # Ok::<(), policy::Error>(())
//! ```

mod capability;
mod config;
mod constraint;
mod engine;
mod error;
pub mod grant;
mod instance;
mod predicate;
mod role;

pub use capability::{Capability, CapabilityTarget, all_capabilities, capabilities_for_targets};
pub use config::ConstraintDecl;
pub use constraint::{
    AccessControl, Constraint, ConstraintLayer, ConstraintScope, Effect, Permission, can,
    constraint, deny, roles,
};
pub use engine::{CapabilityEngine, compute_capabilities};
pub use error::{Error, Result};
pub use instance::Instance;
pub use predicate::{
    AccessPredicate, AttributeEquals, FnPredicate, PredicateDecl, PredicateError, SameIdentity,
    provided,
};
pub use role::{Role, RoleHierarchy, RoleHierarchyBuilder, RoleType};
