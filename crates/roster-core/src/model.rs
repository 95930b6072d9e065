//! # Domain Model
//!
//! Records as they are stored. Identifiers are newtypes over `Uuid` so a
//! company id can never be passed where an employee id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// The storage key for this identifier.
            #[must_use]
            pub fn as_u128(&self) -> u128 {
                self.0.as_u128()
            }

            #[must_use]
            pub const fn from_u128(raw: u128) -> Self {
                Self(Uuid::from_u128(raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a [`Company`].
    CompanyId
);
id_type!(
    /// Identifier of an [`Employee`].
    EmployeeId
);
id_type!(
    /// Identifier of a [`User`].
    UserId
);

/// A company. Owns zero or more employees; deleting it deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: String,
    pub country: String,
}

/// An employee of exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub age: u32,
    pub position: String,
    pub company_id: CompanyId,
}

/// Roles a user can be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Manager,
    Administrator,
}

impl Role {
    /// Every role seeded into a fresh store.
    pub const ALL: [Role; 2] = [Role::Manager, Role::Administrator];

    /// Display name, as carried in tokens.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::Administrator => "Administrator",
        }
    }

    /// Uppercased name used as the lookup key.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(self.name())
    }
}

/// A registered API user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    /// `base64(salt)$base64(hash)`, see [`crate::security`].
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Case-folding used for user names, emails and role names.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_u128() {
        let id = CompanyId::new_v4();
        assert_eq!(CompanyId::from_u128(id.as_u128()), id);
    }

    #[test]
    fn ids_serialize_as_plain_uuid() {
        let id = EmployeeId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn role_names_normalize_to_uppercase() {
        assert_eq!(Role::Manager.normalized(), "MANAGER");
        assert_eq!(normalize("  admin@Example.com "), "ADMIN@EXAMPLE.COM");
    }
}
