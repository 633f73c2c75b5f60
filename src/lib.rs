//! Identity provisioning backend library crate.
//!
//! Provisions OAuth2/OIDC clients, API scopes, and API resources, and
//! orchestrates registration of the user accounts that authenticate against
//! those clients.

pub mod config;
pub mod errors;
pub mod http;
pub mod identity;
pub mod storage;
