//! `taxtally-auth` — credential hashing and token issuance/verification.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! to hash/check passwords and how to mint/verify identity tokens, nothing
//! about where users live or how requests arrive.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{TOKEN_TTL_SECONDS, TokenClaims};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::{TokenError, TokenService};
