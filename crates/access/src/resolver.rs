//! Resolution of the acting user's roles.

use policy::Role;

use crate::Result;

/// Provides the concrete role objects held by the current actor.
pub trait RoleResolver {
    fn current_roles(&self) -> Result<Vec<Role>>;
}

/// A fixed list of roles.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleResolver {
    roles: Vec<Role>,
}

impl StaticRoleResolver {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    /// No roles at all.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl RoleResolver for StaticRoleResolver {
    fn current_roles(&self) -> Result<Vec<Role>> {
        Ok(self.roles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_roles() {
        let resolver = StaticRoleResolver::new(vec![Role::new("Customer", "c1")]);
        assert_eq!(resolver.current_roles().unwrap(), vec![Role::new("Customer", "c1")]);
        assert!(StaticRoleResolver::anonymous().current_roles().unwrap().is_empty());
    }
}
