//! Demo wardrobe: one profile and two garments of each kind, all remote photos

use crate::item::{ImageRef, ItemKind, WardrobeItem};
use stylesync_core::ItemId;

const DEMO_ITEMS: &[(&str, ItemKind, &str, &str, &str)] = &[
    (
        "def-person-1",
        ItemKind::Person,
        "(Demo Profile)",
        "Model",
        "https://images.unsplash.com/photo-1584273143981-41c073dfe8f8?q=80&w=687&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
    ),
    (
        "def-upper-1",
        ItemKind::UpperGarment,
        "White Linen Shirt(Example)",
        "Tops",
        "https://images.unsplash.com/photo-1598033129183-c4f50c736f10?q=80&w=1000&auto=format&fit=crop",
    ),
    (
        "def-upper-2",
        ItemKind::UpperGarment,
        " Loose Soft Kaftan(Example)",
        "Outerwear",
        "https://images.unsplash.com/photo-1753192104240-209f3fb568ef?q=80&w=687&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
    ),
    (
        "def-lower-1",
        ItemKind::LowerGarment,
        "Classic Blue Jeans(Example)",
        "Pants",
        "https://images.unsplash.com/photo-1541099649105-f69ad21f3246?q=80&w=1000&auto=format&fit=crop",
    ),
    (
        "def-lower-2",
        ItemKind::LowerGarment,
        "Pleated Skirt(Example)",
        "Skirts",
        "https://images.unsplash.com/photo-1624378439575-d8705ad7ae80?q=80&w=697&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
    ),
];

/// The demo items, in display order
pub fn demo_items() -> Vec<WardrobeItem> {
    DEMO_ITEMS
        .iter()
        .map(|(id, kind, name, category, url)| {
            WardrobeItem::new(*kind, *name, ImageRef::Url(url.to_string()))
                .with_id(ItemId::from(*id))
                .with_category(*category)
        })
        .collect()
}
