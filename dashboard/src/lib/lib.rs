//! Front-end logic of the account dashboard and the edge server that hosts it.
//!
//! The edge server only checks whether a session cookie is present before
//! serving pages; every real authorization decision is made by the account
//! service.

pub mod client;
pub mod config;
pub mod forms;
pub mod guard;
pub mod router;
pub mod strength;
pub mod toast;
pub mod users;
