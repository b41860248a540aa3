//! StyleSync Core - Foundational types for the StyleSync wardrobe engine
//!
//! This crate provides the core types that all other StyleSync crates depend on:
//! - `ItemId`, `OutfitId` - Stable record identifiers
//! - `ContentHash` - SHA-256 based content hashing for image blobs
//! - Error types and Result alias

mod error;
mod hash;
mod id;

pub use error::{Result, StyleSyncError};
pub use hash::ContentHash;
pub use id::{ItemId, OutfitId};
