//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and the password policy.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
pub mod password;
