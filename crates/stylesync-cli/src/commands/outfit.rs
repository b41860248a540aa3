//! Outfit record commands

use super::{item_label, load_config, open_library, with_worker};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;
use stylesync_core::{ItemId, OutfitId};
use stylesync_studio::encode::{resolve_bytes, sniff_extension};
use stylesync_studio::{Outfit, OutfitStatus, Studio};

#[derive(Subcommand)]
pub enum OutfitCommands {
    /// List outfit records
    List {
        /// Only show outfits for this person
        #[arg(long)]
        person: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Delete an outfit record
    Delete {
        /// Outfit ID
        id: String,
    },

    /// Render a failed outfit again
    Retry {
        /// Outfit ID
        id: String,

        /// Provider to use (gemini, mock)
        #[arg(long)]
        provider: Option<String>,
    },

    /// Write a completed outfit's image to a file
    Export {
        /// Outfit ID
        id: String,

        /// Output path; the extension is picked from the image when missing
        path: String,
    },
}

pub fn run(cmd: OutfitCommands) -> Result<()> {
    match cmd {
        OutfitCommands::List { person, format } => run_list(person.as_deref(), &format),
        OutfitCommands::Delete { id } => run_delete(&id),
        OutfitCommands::Retry { id, provider } => run_retry(&id, provider.as_deref()),
        OutfitCommands::Export { id, path } => run_export(&id, &path),
    }
}

fn run_list(person: Option<&str>, format: &str) -> Result<()> {
    let (_, studio) = open_library()?;
    let person = person.map(ItemId::from);
    let outfits: Vec<&Outfit> = studio
        .outfits()
        .iter()
        .filter(|o| person.as_ref().map_or(true, |p| &o.person_id == p))
        .collect();

    match format {
        "json" => {
            let rows: Vec<serde_json::Value> = outfits
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "id": o.id,
                        "status": o.status(),
                        "person_id": o.person_id,
                        "upper_id": o.upper_id,
                        "lower_id": o.lower_id,
                        "model": o.model_id(),
                        "params": o.params.to_string(),
                        "failure": o.failure(),
                        "image": o.result_image().map(|i| i.describe()),
                        "created_at": o.created_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "text" => {
            if outfits.is_empty() {
                println!("No outfits.");
                return Ok(());
            }
            println!("Outfits ({}):", outfits.len());
            for outfit in outfits {
                println!("{}", describe_outfit(&studio, outfit));
            }
        }
        _ => anyhow::bail!("Unknown format '{}'. Use: text, json", format),
    }
    Ok(())
}

fn describe_outfit(studio: &Studio, outfit: &Outfit) -> String {
    let mut line = format!(
        "  {:<38} {:<11} {} wearing {} + {} [{}]",
        outfit.id.as_str(),
        outfit.status().to_string(),
        item_label(studio, &outfit.person_id),
        item_label(studio, &outfit.upper_id),
        item_label(studio, &outfit.lower_id),
        outfit.model_id()
    );
    if let Some(reason) = outfit.failure() {
        line.push_str(&format!("\n      error: {}", reason));
    }
    line
}

fn run_delete(id: &str) -> Result<()> {
    let (library, mut studio) = open_library()?;
    let removed = studio.delete_outfit(&OutfitId::from(id))?;
    library.save(&studio)?;

    println!(
        "Deleted outfit {} ({} + {})",
        removed.id,
        item_label(&studio, &removed.upper_id),
        item_label(&studio, &removed.lower_id)
    );
    Ok(())
}

fn run_retry(id: &str, provider: Option<&str>) -> Result<()> {
    let (library, studio) = open_library()?;
    let id = OutfitId::from(id);

    let (retried, studio) = with_worker(studio, provider, |handle| {
        let outfit = handle.retry_outfit(&id)?;
        handle.wait_idle()?;
        Ok(outfit)
    })?;
    library.save(&studio)?;

    match studio.outfits().get(&retried.id) {
        Some(outfit) if outfit.status() == OutfitStatus::Completed => {
            println!("Outfit {} completed", outfit.id)
        }
        Some(outfit) => println!(
            "Outfit {} {}: {}",
            outfit.id,
            outfit.status(),
            outfit.failure().unwrap_or("no result")
        ),
        None => println!("Outfit {} was removed before it rendered", retried.id),
    }
    Ok(())
}

fn run_export(id: &str, path: &str) -> Result<()> {
    let (_, studio) = open_library()?;
    let id = OutfitId::from(id);
    let outfit = studio
        .outfits()
        .get(&id)
        .with_context(|| format!("Outfit not found: {}", id))?;

    let Some(image) = outfit.result_image() else {
        anyhow::bail!("Outfit {} is {}, nothing to export", id, outfit.status());
    };

    let config = load_config();
    let bytes = resolve_bytes(image, config.request_timeout())?;
    let path = export_path(Path::new(path), &bytes);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn export_path(path: &Path, bytes: &[u8]) -> std::path::PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(sniff_extension(bytes))
    }
}
