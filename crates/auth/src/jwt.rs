//! HS256 token signing and verification.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{Claims, Role};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Symmetric signing material derived from `JWT_SECRET`.
///
/// Verification is what the API middleware needs; `encode` exists for tests
/// and operational tooling (the login service that issues tokens is a
/// separate deployment).
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for a user, valid for `ttl_secs` from now.
    pub fn encode(&self, user_id: i64, rol: Role, ttl_secs: i64) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            rol,
            iat: now,
            exp: now + ttl_secs,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and extract its claims. Expiration is enforced.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_preserves_claims() {
        let keys = JwtKeys::new(b"test-secret");
        let token = keys.encode(42, Role::Mecanico, 600).unwrap();

        let claims = keys.decode(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.rol, Role::Mecanico);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new(b"test-secret");
        let token = keys.encode(7, Role::Cliente, -120).unwrap();

        assert!(keys.decode(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = JwtKeys::new(b"test-secret");
        let other = JwtKeys::new(b"another-secret");
        let token = other.encode(7, Role::Admin, 600).unwrap();

        assert!(keys.decode(&token).is_err());
    }
}
