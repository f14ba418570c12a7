//! Instance-level access predicates.
//!
//! A predicate is evaluated only after role matching succeeded, against the
//! instance being checked (if any) and one matching role of the actor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::{Instance, Role};

/// A predicate failed to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("predicate '{predicate}' failed: {message}")]
pub struct PredicateError {
    pub predicate: String,
    pub message: String,
}

impl PredicateError {
    pub fn new(predicate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            message: message.into(),
        }
    }
}

/// Fine-grained check over a specific instance and role.
pub trait AccessPredicate: fmt::Debug + Send + Sync {
    /// Stable name, used in logs and error reports.
    fn name(&self) -> &str;

    /// Evaluate the predicate. `instance` is absent for type-level checks.
    fn evaluate(&self, instance: Option<&Instance>, role: &Role) -> Result<bool, PredicateError>;
}

/// The instance is the role object itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameIdentity;

impl AccessPredicate for SameIdentity {
    fn name(&self) -> &str {
        "same_identity"
    }

    fn evaluate(&self, instance: Option<&Instance>, role: &Role) -> Result<bool, PredicateError> {
        Ok(instance.is_some_and(|i| i.id == role.id))
    }
}

/// An instance attribute references the role object.
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    pub attribute: String,
}

impl AttributeEquals {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl AccessPredicate for AttributeEquals {
    fn name(&self) -> &str {
        "attribute_equals"
    }

    fn evaluate(&self, instance: Option<&Instance>, role: &Role) -> Result<bool, PredicateError> {
        let Some(instance) = instance else {
            return Ok(false);
        };
        let value = instance.attribute(&self.attribute).ok_or_else(|| {
            PredicateError::new(
                self.name(),
                format!(
                    "{} '{}' has no attribute '{}'",
                    instance.type_name, instance.id, self.attribute
                ),
            )
        })?;
        match value {
            Value::Null => Ok(false),
            Value::String(s) => Ok(*s == role.id),
            Value::Number(n) => Ok(n.to_string() == role.id),
            other => Err(PredicateError::new(
                self.name(),
                format!("attribute '{}' is not a reference: {other}", self.attribute),
            )),
        }
    }
}

/// A named closure.
pub struct FnPredicate<F> {
    name: String,
    check: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(Option<&Instance>, &Role) -> Result<bool, PredicateError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate").field("name", &self.name).finish()
    }
}

impl<F> AccessPredicate for FnPredicate<F>
where
    F: Fn(Option<&Instance>, &Role) -> Result<bool, PredicateError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, instance: Option<&Instance>, role: &Role) -> Result<bool, PredicateError> {
        (self.check)(instance, role)
    }
}

/// Wrap an infallible closure as a named predicate.
pub fn provided<F>(name: impl Into<String>, check: F) -> Arc<dyn AccessPredicate>
where
    F: Fn(Option<&Instance>, &Role) -> bool + Send + Sync + 'static,
{
    Arc::new(FnPredicate::new(
        name,
        move |instance: Option<&Instance>, role: &Role| -> Result<bool, PredicateError> {
            Ok(check(instance, role))
        },
    ))
}

/// Predicates available to TOML declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateDecl {
    SameIdentity,
    AttributeEquals { attribute: String },
}

impl PredicateDecl {
    pub fn into_predicate(self) -> Arc<dyn AccessPredicate> {
        match self {
            PredicateDecl::SameIdentity => Arc::new(SameIdentity),
            PredicateDecl::AttributeEquals { attribute } => Arc::new(AttributeEquals::new(attribute)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_identity() {
        let role = Role::new("Customer", "c1");
        let own = Instance::new("Customer", "c1");
        let other = Instance::new("Customer", "c2");
        assert!(SameIdentity.evaluate(Some(&own), &role).unwrap());
        assert!(!SameIdentity.evaluate(Some(&other), &role).unwrap());
        assert!(!SameIdentity.evaluate(None, &role).unwrap());
    }

    #[test]
    fn test_attribute_equals() {
        let role = Role::new("Customer", "7");
        let pred = AttributeEquals::new("customer");
        let order = Instance::new("Order", "o1").with_attribute("customer", 7);
        assert!(pred.evaluate(Some(&order), &role).unwrap());

        let order = Instance::new("Order", "o2").with_attribute("customer", "8");
        assert!(!pred.evaluate(Some(&order), &role).unwrap());

        let order = Instance::new("Order", "o3").with_attribute("customer", Value::Null);
        assert!(!pred.evaluate(Some(&order), &role).unwrap());
    }

    #[test]
    fn test_attribute_equals_missing_attribute_fails() {
        let pred = AttributeEquals::new("customer");
        let order = Instance::new("Order", "o1");
        let err = pred
            .evaluate(Some(&order), &Role::new("Customer", "7"))
            .unwrap_err();
        assert_eq!(err.predicate, "attribute_equals");
        assert!(err.message.contains("customer"));
    }

    #[test]
    fn test_provided_closure() {
        let pred = provided("vip", |_, role| role.id.starts_with("vip-"));
        assert_eq!(pred.name(), "vip");
        assert!(pred.evaluate(None, &Role::new("Customer", "vip-1")).unwrap());
        assert!(!pred.evaluate(None, &Role::new("Customer", "c-1")).unwrap());
    }

    #[test]
    fn test_decl_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            provided: PredicateDecl,
        }
        let w: Wrapper =
            toml::from_str("provided = { kind = \"attribute_equals\", attribute = \"owner\" }")
                .unwrap();
        assert_eq!(
            w.provided,
            PredicateDecl::AttributeEquals {
                attribute: "owner".to_string()
            }
        );
        assert_eq!(w.provided.into_predicate().name(), "attribute_equals");
    }
}
