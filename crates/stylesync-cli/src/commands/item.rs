//! Wardrobe item commands

use super::{open_library, with_worker};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;
use stylesync_core::ItemId;
use stylesync_studio::encode::InlineImage;
use stylesync_studio::{ImageRef, ItemKind, WardrobeItem};

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add a person or garment photo
    Add {
        /// Item kind: person, upper, lower
        #[arg(value_parser = parse_kind)]
        kind: ItemKind,

        /// Image file path, http(s) URL, or data URI
        source: String,

        /// Display name (defaults to "<kind> <n>")
        #[arg(long)]
        name: Option<String>,

        /// Category label (e.g. Tops, Pants)
        #[arg(long)]
        category: Option<String>,

        /// Color, used in the generation prompt
        #[arg(long)]
        color: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List wardrobe items
    List {
        /// Only show one kind: person, upper, lower
        #[arg(long, value_parser = parse_kind)]
        kind: Option<ItemKind>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Remove an item
    Remove {
        /// Item ID
        id: String,
    },

    /// Edit an item's photo with an AI instruction, saving the result as a new item
    Edit {
        /// Item ID
        id: String,

        /// What to change (e.g. "make it red")
        #[arg(long, short)]
        prompt: String,

        /// Provider to use (gemini, mock)
        #[arg(long)]
        provider: Option<String>,
    },
}

fn parse_kind(s: &str) -> Result<ItemKind, String> {
    ItemKind::parse(s).ok_or_else(|| format!("unknown item kind '{}'; use person, upper, lower", s))
}

pub fn run(cmd: ItemCommands) -> Result<()> {
    match cmd {
        ItemCommands::Add {
            kind,
            source,
            name,
            category,
            color,
            notes,
        } => run_add(kind, &source, name, category, color, notes),
        ItemCommands::List { kind, format } => run_list(kind, &format),
        ItemCommands::Remove { id } => run_remove(&id),
        ItemCommands::Edit {
            id,
            prompt,
            provider,
        } => run_edit(&id, &prompt, provider.as_deref()),
    }
}

/// Read a local file as bytes; anything else must be a URL or inline base64
fn load_source(source: &str) -> Result<ImageRef> {
    let path = Path::new(source);
    if path.is_file() {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        return Ok(ImageRef::Bytes(bytes));
    }

    let image = ImageRef::parse(source);
    if let ImageRef::DataUri(text) = &image {
        if !text.starts_with("data:") && looks_like_path(text) {
            anyhow::bail!("Image file not found: {}", source);
        }
        InlineImage::from_data_uri(text).with_context(|| {
            format!("'{}' is not an image file, http(s) URL, or base64 image", source)
        })?;
    }
    Ok(image)
}

/// Base64 never contains these, so their presence means a file path
fn looks_like_path(text: &str) -> bool {
    text.contains(['.', '\\', '~'])
}

fn run_add(
    kind: ItemKind,
    source: &str,
    name: Option<String>,
    category: Option<String>,
    color: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let (library, mut studio) = open_library()?;
    let image = load_source(source)?;

    let name = match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => studio.default_item_name(kind),
    };
    let mut item = WardrobeItem::new(kind, name, image);
    item.category = category;
    item.color = color;
    item.notes = notes;
    studio.insert_item(item.clone())?;

    library.save(&studio)?;
    println!("Added {} '{}' ({})", item.kind, item.name, item.id);
    Ok(())
}

fn run_list(kind: Option<ItemKind>, format: &str) -> Result<()> {
    let (_, studio) = open_library()?;
    let items: Vec<&WardrobeItem> = studio
        .items()
        .iter()
        .filter(|i| kind.map_or(true, |k| i.kind == k))
        .collect();

    match format {
        "json" => {
            let rows: Vec<serde_json::Value> = items
                .iter()
                .map(|i| {
                    serde_json::json!({
                        "id": i.id,
                        "kind": i.kind,
                        "name": i.name,
                        "category": i.category,
                        "color": i.color,
                        "notes": i.notes,
                        "image": i.image.describe(),
                        "created_at": i.created_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "text" => {
            if items.is_empty() {
                println!("No items.");
                return Ok(());
            }
            println!("Items ({}):", items.len());
            for item in items {
                let mut line = format!(
                    "  {:<38} {:<14} {}",
                    item.id.as_str(),
                    item.kind.to_string(),
                    item.name.trim()
                );
                if let Some(color) = &item.color {
                    line.push_str(&format!(" [{}]", color));
                }
                if let Some(category) = &item.category {
                    line.push_str(&format!(" ({})", category));
                }
                println!("{}", line);
            }
        }
        _ => anyhow::bail!("Unknown format '{}'. Use: text, json", format),
    }
    Ok(())
}

fn run_remove(id: &str) -> Result<()> {
    let (library, mut studio) = open_library()?;
    let id = ItemId::from(id);

    let removed = studio.remove_item(&id)?;
    let orphaned = studio.outfits().iter().filter(|o| o.references(&id)).count();
    library.save(&studio)?;

    println!("Removed {} '{}'", removed.kind, removed.name);
    if orphaned > 0 {
        println!(
            "  {} outfit(s) still reference it; pending ones will fail with a missing reference",
            orphaned
        );
    }
    Ok(())
}

fn run_edit(id: &str, prompt: &str, provider: Option<&str>) -> Result<()> {
    let (library, studio) = open_library()?;
    let id = ItemId::from(id);

    println!("Editing '{}': {}", super::item_label(&studio, &id), prompt);
    let (edited, studio) = with_worker(studio, provider, |handle| handle.edit_item(&id, prompt))?;
    library.save(&studio)?;

    println!("Added {} '{}' ({})", edited.kind, edited.name, edited.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_aliases() {
        assert_eq!(parse_kind("person").unwrap(), ItemKind::Person);
        assert_eq!(parse_kind("Top").unwrap(), ItemKind::UpperGarment);
        assert_eq!(parse_kind("lower").unwrap(), ItemKind::LowerGarment);
        assert!(parse_kind("shoes").is_err());
    }

    #[test]
    fn test_load_source_reads_files() {
        let dir = std::env::temp_dir().join(format!("stylesync_cli_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("shirt.png");
        std::fs::write(&file, b"png bytes").unwrap();

        assert_eq!(
            load_source(file.to_str().unwrap()).unwrap(),
            ImageRef::Bytes(b"png bytes".to_vec())
        );
        assert_eq!(
            load_source("https://example.com/a.jpg").unwrap(),
            ImageRef::Url("https://example.com/a.jpg".to_string())
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_source_rejects_missing_file() {
        let err = load_source("./does/not/exist/me.jpg").unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(load_source("me.jgp").is_err());
        assert!(load_source("/tmp/photo").is_err());
        assert!(load_source("data:image/png;base64,%%%").is_err());

        assert_eq!(
            load_source("iVBORw0KGgo=").unwrap(),
            ImageRef::DataUri("iVBORw0KGgo=".to_string())
        );
    }
}
