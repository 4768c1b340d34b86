use serde::{Deserialize, Serialize};

use tallerhub_auth::Role;
use tallerhub_core::{DomainError, DomainResult};

/// A staff member or client. The password hash lives only in storage and in
/// the write path; it is never part of this struct, so it cannot leak into
/// a response by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
}

/// The subset of user fields embedded in repair responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Unknown or absent roles fall back to `Role::Cliente`.
    pub role: Option<Role>,
    pub phone: String,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
        {
            return Err(DomainError::validation(
                "Nombre, email y password son campos requeridos",
            ));
        }
        validate_email(&self.email)
    }

    /// Email as stored: lowercase.
    pub fn normalized_email(&self) -> String {
        self.email.to_lowercase()
    }

    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or_default()
    }
}

/// Partial update for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email.as_ref().map(|e| e.to_lowercase())
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    if !is_valid_email(email) {
        return Err(DomainError::validation(
            "El formato del email no es válido",
        ));
    }
    Ok(())
}

/// Shape check: something@domain.tld, no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            name: "Ana Pérez".to_string(),
            email: "Ana@Taller.com".to_string(),
            password: "s3creta".to_string(),
            role: None,
            phone: "555-0101".to_string(),
        }
    }

    #[test]
    fn valid_user_passes_and_normalizes_email() {
        let user = new_user();
        assert!(user.validate().is_ok());
        assert_eq!(user.normalized_email(), "ana@taller.com");
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut user = new_user();
        user.password.clear();
        assert!(matches!(user.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["sin-arroba", "dos@@arrobas.com", "con espacios@x.com", "a@b"] {
            let mut user = new_user();
            user.email = email.to_string();
            assert!(user.validate().is_err(), "{email} should be invalid");
        }
    }

    #[test]
    fn role_defaults_to_cliente() {
        assert_eq!(new_user().effective_role(), Role::Cliente);
        let mut user = new_user();
        user.role = Some(Role::Mecanico);
        assert_eq!(user.effective_role(), Role::Mecanico);
    }

    #[test]
    fn patch_validates_email_when_present() {
        let patch = UserPatch {
            email: Some("nueva@direccion".to_string()),
            ..UserPatch::default()
        };
        assert!(patch.validate().is_err());
        assert!(UserPatch::default().validate().is_ok());
    }
}
