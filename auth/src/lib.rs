//! Authentication primitives shared by the account service and the dashboard.
//!
//! Nothing in here talks to a database or an HTTP framework. Services wire
//! these building blocks into their own ports:
//! - Password hashing (Argon2id) and the password length policy
//! - Opaque session and verification tokens, stored only as SHA-256 digests
//! - The session cookie contract (name, attributes, lookup)
//! - Short-lived HS256 JWTs derived from a session
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{PasswordHasher, PasswordPolicy};
//!
//! let policy = PasswordPolicy::new(8, 128);
//! policy.check("correct horse").unwrap();
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("correct horse").unwrap();
//! assert!(hasher.verify("correct horse", &hash).unwrap());
//! ```
//!
//! ## Opaque Tokens
//! ```
//! use auth::token;
//!
//! let raw = token::generate().unwrap();
//! let digest = token::digest(&raw);
//! assert_eq!(digest, token::digest(&raw));
//! ```
//!
//! ## Session Cookie
//! ```
//! use auth::SessionCookie;
//!
//! let cookie = SessionCookie::new("better-auth", false, 3600);
//! assert_eq!(cookie.name(), "better-auth.session_token");
//! assert_eq!(
//!     SessionCookie::find("theme=dark; better-auth.session_token=abc", cookie.name()),
//!     Some("abc")
//! );
//! ```

pub mod cookie;
pub mod jwt;
pub mod password;
pub mod token;

pub use cookie::SessionCookie;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SessionClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use token::TokenError;
