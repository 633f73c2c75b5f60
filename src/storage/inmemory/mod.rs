//! In-memory credential store implementation
//!
//! This module provides in-memory implementations for the identity storage
//! traits, used as the default backend and as the test double.

mod identity;

pub use identity::MemoryIdentityStorage;
