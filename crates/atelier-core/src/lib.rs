//! Atelier Core - Foundational types for the Atelier pipeline
//!
//! This crate provides the types that all other Atelier crates depend on:
//! - `ContentHash` - SHA-256 based content hashing for artifact provenance
//! - Error types and Result alias

mod error;
mod hash;

pub use error::{AtelierError, Result};
pub use hash::ContentHash;
