//! StyleSync Studio - virtual try-on engine
//!
//! Keeps a wardrobe of person and garment photos, plans the garment pairs
//! a person has not tried on yet, and renders them one at a time through a
//! pluggable image generator (Gemini, Mock) on a dedicated worker thread.
//! State persists to a JSON library with content-addressed image blobs.

pub mod blob;
pub mod combinations;
pub mod config;
pub mod demo;
pub mod encode;
pub mod item;
pub mod library;
pub mod mixer;
pub mod outfit;
pub mod params;
pub mod provider;
pub mod providers;
pub mod queue;
pub mod studio;
pub mod worker;

#[cfg(test)]
mod testing;

pub use combinations::{pending_combinations, PendingCombination};
pub use config::StyleSyncConfig;
pub use item::{ImageRef, ItemKind, ItemStore, WardrobeItem};
pub use library::Library;
pub use mixer::Mixer;
pub use outfit::{Outfit, OutfitStatus, OutfitStore};
pub use params::{GenerationParams, Resolution};
pub use provider::{GenerationError, ImageGenerator, OutfitRequest, ProviderStatus};
pub use queue::{DrainOutcome, GenerationQueue, QueueState, StudioEvent};
pub use studio::Studio;
pub use worker::{StudioHandle, StudioWorker};
