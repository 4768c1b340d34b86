//! Role model for workshop staff and clients.

use serde::{Deserialize, Serialize};

/// Roles a user can hold. `Cliente` is the default for self-registered
/// accounts; `Admin` gates the user-management endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Mecanico,
    Recepcionista,
    Cliente,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mecanico => "mecanico",
            Role::Recepcionista => "recepcionista",
            Role::Cliente => "cliente",
        }
    }

    /// Parse a role name. Unknown names yield `None`, letting callers fall
    /// back to `Role::Cliente` the way account creation does.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "mecanico" => Some(Role::Mecanico),
            "recepcionista" => Some(Role::Recepcionista),
            "cliente" => Some(Role::Cliente),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Cliente
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_every_role() {
        for role in [
            Role::Admin,
            Role::Mecanico,
            Role::Recepcionista,
            Role::Cliente,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(Role::parse("gerente"), None);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Mecanico).unwrap(), "\"mecanico\"");
    }
}
