//! Policy error types.

use thiserror::Error;

use crate::predicate::PredicateError;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An access declaration is malformed or references an unknown role type.
    #[error("invalid access configuration: {0}")]
    Configuration(String),

    /// An access predicate failed while being evaluated.
    ///
    /// Never interpreted as a grant: the whole evaluation fails.
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

pub type Result<T> = std::result::Result<T, Error>;
