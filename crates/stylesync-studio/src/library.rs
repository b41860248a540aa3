//! On-disk library: `.stylesync/library.json` plus image blobs
//!
//! Raw image bytes go to the [`BlobStore`] and the JSON refers to them by
//! hash; URLs and data URIs are stored inline. A record saved while
//! Generating was interrupted mid-request and comes back Failed.

use crate::blob::BlobStore;
use crate::config::PROJECT_DIR;
use crate::encode::sniff_extension;
use crate::item::{ImageRef, ItemKind, ItemStore, WardrobeItem};
use crate::outfit::{Outfit, OutfitStatus, OutfitStore};
use crate::params::GenerationParams;
use crate::studio::Studio;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use stylesync_core::{ContentHash, ItemId, OutfitId, Result, StyleSyncError};

pub const LIBRARY_FILE: &str = "library.json";
pub const BLOB_DIR: &str = "blobs";
/// Failure text for records that were mid-generation when the library was saved
pub const INTERRUPTED: &str = "interrupted";

const LIBRARY_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoredImage {
    Blob { hash: String, ext: String },
    Url { url: String },
    DataUri { data: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    id: ItemId,
    kind: ItemKind,
    name: String,
    image: StoredImage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredOutfit {
    id: OutfitId,
    person_id: ItemId,
    upper_id: ItemId,
    lower_id: ItemId,
    params: GenerationParams,
    status: OutfitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_image: Option<StoredImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    #[serde(default)]
    items: Vec<StoredItem>,
    #[serde(default)]
    outfits: Vec<StoredOutfit>,
}

/// File-based studio storage in `.stylesync/`
pub struct Library {
    root: PathBuf,
    blobs: BlobStore,
}

impl Library {
    /// Create a library rooted at the given directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let blobs = BlobStore::new(root.join(BLOB_DIR));
        Self { root, blobs }
    }

    /// Default library location in the current project
    pub fn default_library() -> Self {
        Self::new(PROJECT_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn library_path(&self) -> PathBuf {
        self.root.join(LIBRARY_FILE)
    }

    pub fn exists(&self) -> bool {
        self.library_path().exists()
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Write the studio to disk and drop blobs nothing refers to any more
    pub fn save(&self, studio: &Studio) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let mut referenced = HashSet::new();

        let items = studio
            .items()
            .iter()
            .map(|item| -> Result<StoredItem> {
                Ok(StoredItem {
                    id: item.id.clone(),
                    kind: item.kind,
                    name: item.name.clone(),
                    image: self.store_image(&item.image, &mut referenced)?,
                    category: item.category.clone(),
                    color: item.color.clone(),
                    notes: item.notes.clone(),
                    created_at: item.created_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let outfits = studio
            .outfits()
            .iter()
            .map(|outfit| -> Result<StoredOutfit> {
                let result_image = outfit
                    .result_image()
                    .map(|img| self.store_image(img, &mut referenced))
                    .transpose()?;
                Ok(StoredOutfit {
                    id: outfit.id.clone(),
                    person_id: outfit.person_id.clone(),
                    upper_id: outfit.upper_id.clone(),
                    lower_id: outfit.lower_id.clone(),
                    params: outfit.params,
                    status: outfit.status(),
                    result_image,
                    failure: outfit.failure().map(str::to_string),
                    created_at: outfit.created_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let file = LibraryFile {
            version: LIBRARY_VERSION,
            items,
            outfits,
        };
        let content = serde_json::to_string_pretty(&file)?;

        // The library file is replaced whole, never written in place
        let path = self.library_path();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;

        let pruned = self.blobs.retain(&referenced)?;
        tracing::debug!(
            path = %path.display(),
            items = file.items.len(),
            outfits = file.outfits.len(),
            pruned,
            "saved library"
        );
        Ok(())
    }

    /// Read the studio back from disk
    pub fn load(&self) -> Result<Studio> {
        let path = self.library_path();
        if !path.exists() {
            return Err(StyleSyncError::LibraryError(format!(
                "No library at {}. Run `stylesync init` first.",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let file: LibraryFile = serde_json::from_str(&content).map_err(|e| {
            StyleSyncError::LibraryError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if file.version != LIBRARY_VERSION {
            return Err(StyleSyncError::LibraryError(format!(
                "Unsupported library version {} (expected {})",
                file.version, LIBRARY_VERSION
            )));
        }

        let mut items = ItemStore::new();
        for stored in file.items {
            items.insert(WardrobeItem {
                id: stored.id,
                kind: stored.kind,
                image: self.load_image(stored.image)?,
                name: stored.name,
                category: stored.category,
                color: stored.color,
                notes: stored.notes,
                created_at: stored.created_at,
            })?;
        }

        let mut outfits = OutfitStore::new();
        for stored in file.outfits {
            let (status, failure) = match stored.status {
                OutfitStatus::Generating => {
                    tracing::warn!(outfit = %stored.id, "outfit was interrupted mid-generation");
                    (OutfitStatus::Failed, Some(INTERRUPTED.to_string()))
                }
                status => (status, stored.failure),
            };
            let result_image = stored
                .result_image
                .map(|img| self.load_image(img))
                .transpose()?;
            outfits.insert(Outfit::restore(
                stored.id,
                stored.person_id,
                stored.upper_id,
                stored.lower_id,
                stored.params,
                stored.created_at,
                status,
                result_image,
                failure,
            )?)?;
        }

        Ok(Studio::from_parts(items, outfits))
    }

    fn store_image(
        &self,
        image: &ImageRef,
        referenced: &mut HashSet<ContentHash>,
    ) -> Result<StoredImage> {
        Ok(match image {
            ImageRef::Bytes(bytes) => {
                let ext = sniff_extension(bytes);
                let hash = self.blobs.store(bytes, ext)?;
                referenced.insert(hash);
                StoredImage::Blob {
                    hash: hash.to_prefixed_hex(),
                    ext: ext.to_string(),
                }
            }
            ImageRef::Url(url) => StoredImage::Url { url: url.clone() },
            ImageRef::DataUri(data) => StoredImage::DataUri { data: data.clone() },
        })
    }

    fn load_image(&self, stored: StoredImage) -> Result<ImageRef> {
        Ok(match stored {
            StoredImage::Blob { hash, ext } => {
                let parsed = ContentHash::from_prefixed_hex(&hash).ok_or_else(|| {
                    StyleSyncError::LibraryError(format!("Invalid blob hash '{}'", hash))
                })?;
                ImageRef::Bytes(self.blobs.load(&parsed, &ext)?)
            }
            StoredImage::Url { url } => ImageRef::Url(url),
            StoredImage::DataUri { data } => ImageRef::DataUri(data),
        })
    }
}
