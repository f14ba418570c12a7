//! Access error types.

use policy::Capability;
use thiserror::Error;

/// Access errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Access declarations do not fit the role hierarchy or the schema.
    #[error("invalid access configuration: {0}")]
    Configuration(String),

    /// The guarded type is not declared in the schema.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The requested capability is not among the computed ones.
    #[error("access denied: {capability} on {target}")]
    AccessDenied {
        capability: Capability,
        target: String,
    },

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
