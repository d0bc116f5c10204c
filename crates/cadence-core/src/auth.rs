//! Authorization seam. The engine never decides who a caller is; it receives an
//! [`Actor`] and asks an [`AccessPolicy`] for a yes/no answer.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid role: {0} (expected admin or user)")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn user(id: Uuid) -> Self {
        Self::new(id, Role::User)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub trait AccessPolicy: Send + Sync {
    fn can_view(&self, actor: &Actor, owner_id: Uuid) -> bool;
    fn can_manage(&self, actor: &Actor, owner_id: Uuid) -> bool;
}

/// Admins may see and change everything, users only what they own.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrAdmin;

impl AccessPolicy for OwnerOrAdmin {
    fn can_view(&self, actor: &Actor, owner_id: Uuid) -> bool {
        actor.is_admin() || actor.id == owner_id
    }

    fn can_manage(&self, actor: &Actor, owner_id: Uuid) -> bool {
        actor.is_admin() || actor.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_or_admin() {
        let owner = Uuid::now_v7();
        let policy = OwnerOrAdmin;

        assert!(policy.can_manage(&Actor::user(owner), owner));
        assert!(policy.can_view(&Actor::user(owner), owner));
        assert!(!policy.can_manage(&Actor::user(Uuid::now_v7()), owner));
        assert!(!policy.can_view(&Actor::user(Uuid::now_v7()), owner));
        assert!(policy.can_manage(&Actor::admin(Uuid::now_v7()), owner));
        assert!(policy.can_view(&Actor::admin(Uuid::now_v7()), owner));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }
}
