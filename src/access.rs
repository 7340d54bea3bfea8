//! Caller identity as resolved by the authentication layer in front of us.
//!
//! Every operation that touches a specific order goes through
//! [`Caller::authorize_order`]: owners see their own orders, `ADMIN` sees all.

use std::str::FromStr;
use crate::domain::value_objects::UserId;
use crate::{BackofficeError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl FromStr for Role {
    type Err = BackofficeError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            other => Err(BackofficeError::Validation(format!("unknown role {other}"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    user_id: Option<UserId>,
    roles: Vec<Role>,
}

impl Caller {
    pub fn anonymous() -> Self { Self::default() }
    pub fn user(id: UserId) -> Self { Self { user_id: Some(id), roles: vec![Role::User] } }
    pub fn admin(id: UserId) -> Self { Self { user_id: Some(id), roles: vec![Role::Admin] } }

    pub fn new(user_id: Option<UserId>, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut caller = Self { user_id, roles: vec![] };
        for role in roles { caller = caller.with_role(role); }
        caller
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) { self.roles.push(role); }
        self
    }

    pub fn current_user(&self) -> Option<&UserId> { self.user_id.as_ref() }
    pub fn has_role(&self, role: Role) -> bool { self.roles.contains(&role) }

    pub fn require_user(&self) -> Result<&UserId> {
        self.user_id.as_ref().ok_or(BackofficeError::Unauthenticated)
    }

    pub fn require_admin(&self) -> Result<&UserId> {
        let id = self.require_user()?;
        if self.has_role(Role::Admin) { Ok(id) } else { Err(BackofficeError::Forbidden) }
    }

    /// Owner-or-admin check shared by every order read and mutation.
    pub fn authorize_order(&self, owner: &UserId) -> Result<()> {
        let id = self.require_user()?;
        if id == owner || self.has_role(Role::Admin) { Ok(()) } else { Err(BackofficeError::Forbidden) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId { UserId::new(s).unwrap() }

    #[test]
    fn test_owner_or_admin() {
        let owner = uid("alice");
        assert!(Caller::user(uid("alice")).authorize_order(&owner).is_ok());
        assert!(Caller::admin(uid("root")).authorize_order(&owner).is_ok());
        assert!(matches!(Caller::user(uid("bob")).authorize_order(&owner), Err(BackofficeError::Forbidden)));
        assert!(matches!(Caller::anonymous().authorize_order(&owner), Err(BackofficeError::Unauthenticated)));
    }

    #[test]
    fn test_require_admin() {
        assert!(Caller::admin(uid("root")).require_admin().is_ok());
        assert!(matches!(Caller::user(uid("bob")).require_admin(), Err(BackofficeError::Forbidden)));
        // A role without an identity is still anonymous.
        let roleless = Caller::new(None, [Role::Admin]);
        assert!(matches!(roleless.require_admin(), Err(BackofficeError::Unauthenticated)));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_roles_deduplicated() {
        let caller = Caller::new(Some(uid("a")), [Role::User, Role::User, Role::Admin]);
        assert!(caller.has_role(Role::Admin));
        assert_eq!(caller.roles.len(), 2);
    }
}
