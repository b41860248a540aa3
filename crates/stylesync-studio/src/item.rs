//! Wardrobe items and the item store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use stylesync_core::{ItemId, Result, StyleSyncError};

/// What a wardrobe item depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Person,
    UpperGarment,
    LowerGarment,
}

impl ItemKind {
    /// Human-readable label used for default item names
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Person => "Person Profile",
            ItemKind::UpperGarment => "Upper Wear",
            ItemKind::LowerGarment => "Lower Wear",
        }
    }

    /// Parse a CLI-style kind name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "person" | "profile" => Some(ItemKind::Person),
            "upper" | "upper_garment" | "top" => Some(ItemKind::UpperGarment),
            "lower" | "lower_garment" | "bottom" => Some(ItemKind::LowerGarment),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Person => write!(f, "person"),
            ItemKind::UpperGarment => write!(f, "upper garment"),
            ItemKind::LowerGarment => write!(f, "lower garment"),
        }
    }
}

/// An opaque reference to an image.
///
/// Generators normalize every variant to inline base64 before sending it
/// to their backend (see [`crate::encode`]).
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Raw encoded image file bytes (PNG, JPEG, ...)
    Bytes(Vec<u8>),
    /// A remote `http`/`https` URL, fetched at generation time
    Url(String),
    /// A `data:<mime>;base64,` URI or a bare base64 payload
    DataUri(String),
}

impl ImageRef {
    /// Classify a textual image reference
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.starts_with("data:") {
            ImageRef::DataUri(trimmed.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ImageRef::Url(trimmed.to_string())
        } else {
            ImageRef::DataUri(trimmed.to_string())
        }
    }

    /// Short description for listings
    pub fn describe(&self) -> String {
        match self {
            ImageRef::Bytes(bytes) => format!("{} bytes", bytes.len()),
            ImageRef::Url(url) => url.clone(),
            ImageRef::DataUri(data) => format!("inline ({} chars)", data.len()),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Bytes(bytes) => write!(f, "ImageRef::Bytes({} bytes)", bytes.len()),
            ImageRef::Url(url) => write!(f, "ImageRef::Url({})", url),
            ImageRef::DataUri(data) => write!(f, "ImageRef::DataUri({} chars)", data.len()),
        }
    }
}

/// A person photo or garment photo in the wardrobe
#[derive(Debug, Clone, PartialEq)]
pub struct WardrobeItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub image: ImageRef,
    pub name: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WardrobeItem {
    /// Create a new item with a fresh id
    pub fn new(kind: ItemKind, name: impl Into<String>, image: ImageRef) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            image,
            name: name.into(),
            category: None,
            color: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = id;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_garment(&self) -> bool {
        matches!(self.kind, ItemKind::UpperGarment | ItemKind::LowerGarment)
    }
}

/// Ordered collection of wardrobe items with unique ids
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<WardrobeItem>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item; ids must be unique
    pub fn insert(&mut self, item: WardrobeItem) -> Result<()> {
        if self.contains(&item.id) {
            return Err(StyleSyncError::DuplicateId(item.id.to_string()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove an item, returning it if it existed
    pub fn remove(&mut self, id: &ItemId) -> Option<WardrobeItem> {
        let pos = self.items.iter().position(|i| &i.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, id: &ItemId) -> Option<&WardrobeItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Look up an item and check its kind
    pub fn get_kind(&self, id: &ItemId, kind: ItemKind) -> Result<&WardrobeItem> {
        let item = self
            .get(id)
            .ok_or_else(|| StyleSyncError::ItemNotFound(id.to_string()))?;
        if item.kind != kind {
            return Err(StyleSyncError::InvalidItemKind {
                id: id.to_string(),
                expected: kind.to_string(),
                got: item.kind.to_string(),
            });
        }
        Ok(item)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }

    /// All items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &WardrobeItem> {
        self.items.iter()
    }

    /// Items of one kind, in insertion order
    pub fn of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &WardrobeItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }

    pub fn people(&self) -> Vec<&WardrobeItem> {
        self.of_kind(ItemKind::Person).collect()
    }

    pub fn uppers(&self) -> Vec<&WardrobeItem> {
        self.of_kind(ItemKind::UpperGarment).collect()
    }

    pub fn lowers(&self) -> Vec<&WardrobeItem> {
        self.of_kind(ItemKind::LowerGarment).collect()
    }

    /// Ids of one kind, in insertion order
    pub fn ids_of_kind(&self, kind: ItemKind) -> Vec<ItemId> {
        self.of_kind(kind).map(|i| i.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ItemKind, id: &str) -> WardrobeItem {
        WardrobeItem::new(kind, id, ImageRef::Bytes(vec![1, 2, 3])).with_id(ItemId::from_raw(id))
    }

    #[test]
    fn test_partition_by_kind_keeps_order() {
        let mut store = ItemStore::new();
        store.insert(item(ItemKind::UpperGarment, "u1")).unwrap();
        store.insert(item(ItemKind::Person, "p1")).unwrap();
        store.insert(item(ItemKind::LowerGarment, "l1")).unwrap();
        store.insert(item(ItemKind::UpperGarment, "u2")).unwrap();

        let uppers = store.ids_of_kind(ItemKind::UpperGarment);
        assert_eq!(uppers, vec![ItemId::from("u1"), ItemId::from("u2")]);
        assert_eq!(store.people().len(), 1);
        assert_eq!(store.lowers()[0].id.as_str(), "l1");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = ItemStore::new();
        store.insert(item(ItemKind::Person, "p1")).unwrap();
        let err = store.insert(item(ItemKind::Person, "p1")).unwrap_err();
        assert!(matches!(err, StyleSyncError::DuplicateId(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_kind_mismatch() {
        let mut store = ItemStore::new();
        store.insert(item(ItemKind::LowerGarment, "l1")).unwrap();
        let err = store
            .get_kind(&ItemId::from("l1"), ItemKind::UpperGarment)
            .unwrap_err();
        assert!(matches!(err, StyleSyncError::InvalidItemKind { .. }));
        assert!(matches!(
            store.get_kind(&ItemId::from("nope"), ItemKind::Person),
            Err(StyleSyncError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut store = ItemStore::new();
        store.insert(item(ItemKind::Person, "p1")).unwrap();
        assert!(store.remove(&ItemId::from("p1")).is_some());
        assert!(store.remove(&ItemId::from("p1")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_image_ref_parse() {
        assert!(matches!(
            ImageRef::parse("https://example.com/shirt.jpg"),
            ImageRef::Url(_)
        ));
        assert!(matches!(
            ImageRef::parse("data:image/png;base64,AAAA"),
            ImageRef::DataUri(_)
        ));
        assert!(matches!(ImageRef::parse("iVBORw0KGgo="), ImageRef::DataUri(_)));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ItemKind::parse("Person"), Some(ItemKind::Person));
        assert_eq!(ItemKind::parse("upper"), Some(ItemKind::UpperGarment));
        assert_eq!(ItemKind::parse("bottom"), Some(ItemKind::LowerGarment));
        assert_eq!(ItemKind::parse("hat"), None);
    }
}
