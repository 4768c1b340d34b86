//! `tallerhub-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! to hash/verify passwords, sign/verify bearer tokens and reason about
//! roles, and nothing else. Token issuance endpoints live outside this
//! repository.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod roles;

pub use claims::Claims;
pub use jwt::{JwtKeys, TokenError};
pub use password::{hash_password, verify_password};
pub use roles::Role;
