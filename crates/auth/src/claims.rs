//! JWT claims model (transport-agnostic).

use serde::{Deserialize, Serialize};

use crate::Role;

/// The minimal set of claims TallerHub expects inside a bearer token.
///
/// `sub` is the user id; the role travels in the token so the HTTP layer can
/// gate admin endpoints without a database round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / user identifier.
    pub sub: i64,

    /// Role granted to the user.
    pub rol: Role,

    /// Issued-at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}
