use tallerhub_auth::{Claims, Role};

/// Authenticated identity for a request, derived from the bearer token.
///
/// This is immutable and present on all protected routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: i64,
    role: Role,
}

impl CurrentUser {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.rol,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
