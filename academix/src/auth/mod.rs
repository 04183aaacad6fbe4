//! Authentication primitives: signed session tokens, password hashing and
//! the one-time secrets used for email verification and password resets.

pub mod jwt;
pub mod password;
pub mod secrets;

pub use jwt::{Claims, JwtUtils};
pub use password::{hash_password, validate_new_password, verify_password, MIN_PASSWORD_LENGTH};
pub use secrets::{generate_otp, generate_reset_token, sha256_hex};
