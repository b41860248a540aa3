//! CLI command implementations

pub mod generate;
pub mod init;
pub mod item;
pub mod key;
pub mod outfit;

use anyhow::{Context, Result};
use std::sync::mpsc;
use stylesync_core::ItemId;
use stylesync_studio::providers::create_provider;
use stylesync_studio::{
    GenerationParams, Library, OutfitStatus, ProviderStatus, Resolution, Studio, StudioEvent,
    StudioHandle, StudioWorker, StyleSyncConfig,
};

/// Load the project library
pub fn open_library() -> Result<(Library, Studio)> {
    let library = Library::default_library();
    let studio = library.load()?;
    Ok((library, studio))
}

/// Load config, falling back to defaults when no file is readable
pub fn load_config() -> StyleSyncConfig {
    StyleSyncConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config: {}", e);
        StyleSyncConfig::default()
    })
}

/// Generation params from CLI flags, falling back to config defaults
pub fn resolve_params(
    config: &StyleSyncConfig,
    model: Option<&str>,
    resolution: Option<&str>,
) -> Result<GenerationParams> {
    let resolution = resolution
        .map(|r| {
            Resolution::parse(r)
                .with_context(|| format!("Unknown resolution '{}'. Use: 1K, 2K, 4K", r))
        })
        .transpose()?;

    let params = match (model, resolution) {
        (Some(model), resolution) => GenerationParams::from_parts(model, resolution)?,
        (None, Some(resolution)) => GenerationParams::from_parts("pro", Some(resolution))?,
        (None, None) => config.default_params()?,
    };
    Ok(params)
}

/// Spawn a worker over the studio, run `f` against it, then drain and take the studio back.
///
/// Status events are printed as they arrive.
pub fn with_worker<T>(
    studio: Studio,
    provider: Option<&str>,
    f: impl FnOnce(&StudioHandle) -> stylesync_core::Result<T>,
) -> Result<(T, Studio)> {
    let config = load_config();
    let provider_name = provider.unwrap_or_else(|| config.default_provider()).to_string();
    let generator = create_provider(&provider_name, &config)?;

    match generator.health_check() {
        ProviderStatus::Available => {}
        ProviderStatus::NoApiKey => tracing::warn!(
            "No API key for '{}'. Set one with `stylesync key set <key>` or GEMINI_API_KEY.",
            provider_name
        ),
        ProviderStatus::Unavailable(reason) => {
            tracing::warn!("Provider '{}' unavailable: {}", provider_name, reason)
        }
    }

    let (tx, rx) = mpsc::channel();
    let (handle, worker) = StudioWorker::new(studio, generator).with_events(tx).spawn();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if let StudioEvent::StatusChanged { outfit_id, status } = event {
                match status {
                    OutfitStatus::Pending => println!("  queued      {}", outfit_id),
                    OutfitStatus::Generating => println!("  generating  {}", outfit_id),
                    OutfitStatus::Completed => println!("  completed   {}", outfit_id),
                    OutfitStatus::Failed => println!("  FAILED      {}", outfit_id),
                }
            }
        }
    });

    let outcome = f(&handle);
    let studio = handle.shutdown()?;
    if worker.join().is_err() || printer.join().is_err() {
        anyhow::bail!("Studio worker panicked");
    }

    Ok((outcome?, studio))
}

/// Short display name for an item id, or the id itself when the item is gone
pub fn item_label(studio: &Studio, id: &ItemId) -> String {
    studio
        .items()
        .get(id)
        .map(|i| i.name.trim().to_string())
        .unwrap_or_else(|| format!("<missing {}>", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_params_flags() {
        let config = StyleSyncConfig::default();
        assert_eq!(
            resolve_params(&config, None, None).unwrap(),
            GenerationParams::Flash
        );
        assert_eq!(
            resolve_params(&config, None, Some("4k")).unwrap(),
            GenerationParams::Pro {
                resolution: Resolution::Ultra
            }
        );
        assert_eq!(
            resolve_params(&config, Some("pro"), None).unwrap(),
            GenerationParams::Pro {
                resolution: Resolution::Standard
            }
        );
        assert!(resolve_params(&config, Some("flash"), Some("2K")).is_err());
        assert!(resolve_params(&config, None, Some("8K")).is_err());
    }

    #[test]
    fn test_item_label_for_missing_item() {
        let studio = Studio::new();
        assert_eq!(item_label(&studio, &ItemId::from("gone")), "<missing gone>");
    }
}
