//! The studio: owner of the wardrobe and the outfit records
//!
//! Every user action is a method here. Nothing in this module talks to a
//! generator; records created here start Pending and are handed to the
//! [`GenerationQueue`](crate::queue::GenerationQueue) by the caller.

use crate::combinations::{pending_combinations, PendingCombination};
use crate::demo::demo_items;
use crate::item::{ImageRef, ItemKind, ItemStore, WardrobeItem};
use crate::outfit::{Outfit, OutfitStatus, OutfitStore};
use crate::params::GenerationParams;
use stylesync_core::{ItemId, OutfitId, Result, StyleSyncError};

/// Wardrobe items plus outfit records
#[derive(Debug, Clone, Default)]
pub struct Studio {
    items: ItemStore,
    outfits: OutfitStore,
}

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a studio from loaded stores
    pub fn from_parts(items: ItemStore, outfits: OutfitStore) -> Self {
        Self { items, outfits }
    }

    /// A studio seeded with the demo profile and garments
    pub fn with_demo_wardrobe() -> Result<Self> {
        let mut studio = Self::new();
        for item in demo_items() {
            studio.items.insert(item)?;
        }
        Ok(studio)
    }

    pub fn items(&self) -> &ItemStore {
        &self.items
    }

    pub fn outfits(&self) -> &OutfitStore {
        &self.outfits
    }

    pub(crate) fn outfits_mut(&mut self) -> &mut OutfitStore {
        &mut self.outfits
    }

    /// Name given to an unnamed item: "<kind label> <n>"
    pub fn default_item_name(&self, kind: ItemKind) -> String {
        format!("{} {}", kind.label(), self.items.of_kind(kind).count() + 1)
    }

    /// Add a new item. A blank name gets [`Studio::default_item_name`].
    pub fn add_item(&mut self, kind: ItemKind, name: &str, image: ImageRef) -> Result<WardrobeItem> {
        let name = if name.trim().is_empty() {
            self.default_item_name(kind)
        } else {
            name.to_string()
        };
        let item = WardrobeItem::new(kind, name, image);
        self.insert_item(item.clone())?;
        Ok(item)
    }

    /// Insert a fully built item; duplicate ids are rejected
    pub fn insert_item(&mut self, item: WardrobeItem) -> Result<()> {
        tracing::debug!(id = %item.id, kind = %item.kind, "adding wardrobe item");
        self.items.insert(item)
    }

    /// Remove an item. Outfit records that reference it are kept.
    pub fn remove_item(&mut self, id: &ItemId) -> Result<WardrobeItem> {
        self.items
            .remove(id)
            .ok_or_else(|| StyleSyncError::ItemNotFound(id.to_string()))
    }

    /// The first person in the wardrobe
    pub fn default_person(&self) -> Option<&WardrobeItem> {
        self.items.of_kind(ItemKind::Person).next()
    }

    /// The explicitly chosen person, or the default one
    pub fn resolve_person(&self, person: Option<&ItemId>) -> Result<ItemId> {
        match person {
            Some(id) if !id.is_empty() => {
                Ok(self.items.get_kind(id, ItemKind::Person)?.id.clone())
            }
            _ => self
                .default_person()
                .map(|p| p.id.clone())
                .ok_or(StyleSyncError::NoPersonSelected),
        }
    }

    /// Garment pairs with no outfit record for this person yet
    pub fn plan_batch(&self, person: &ItemId) -> Vec<PendingCombination> {
        pending_combinations(
            person,
            &self.items.ids_of_kind(ItemKind::UpperGarment),
            &self.items.ids_of_kind(ItemKind::LowerGarment),
            self.outfits.as_slice(),
        )
    }

    /// Create a Pending record for every planned pair, in plan order
    pub fn create_batch(&mut self, person: &ItemId, params: GenerationParams) -> Result<Vec<Outfit>> {
        self.check_person(person)?;

        let created: Vec<Outfit> = self
            .plan_batch(person)
            .into_iter()
            .map(|pair| Outfit::pending(person.clone(), pair.upper_id, pair.lower_id, params))
            .collect();

        for outfit in &created {
            self.outfits.insert(outfit.clone())?;
        }
        tracing::info!(person = %person, count = created.len(), %params, "created outfit batch");
        Ok(created)
    }

    /// Create one Pending record for an explicit pair, even if the pair was tried before
    pub fn create_single(
        &mut self,
        person: &ItemId,
        upper: &ItemId,
        lower: &ItemId,
        params: GenerationParams,
    ) -> Result<Outfit> {
        self.check_person(person)?;
        self.items.get_kind(upper, ItemKind::UpperGarment)?;
        self.items.get_kind(lower, ItemKind::LowerGarment)?;

        let outfit = Outfit::pending(person.clone(), upper.clone(), lower.clone(), params);
        self.outfits.insert(outfit.clone())?;
        Ok(outfit)
    }

    pub fn delete_outfit(&mut self, id: &OutfitId) -> Result<Outfit> {
        self.outfits
            .remove(id)
            .ok_or_else(|| StyleSyncError::OutfitNotFound(id.to_string()))
    }

    /// Replace a Failed record with a fresh Pending one for the same triple
    pub fn retry_outfit(&mut self, id: &OutfitId) -> Result<Outfit> {
        let failed = self
            .outfits
            .get(id)
            .ok_or_else(|| StyleSyncError::OutfitNotFound(id.to_string()))?;
        if failed.status() != OutfitStatus::Failed {
            return Err(StyleSyncError::InvalidTransition {
                id: id.to_string(),
                from: failed.status().to_string(),
                to: OutfitStatus::Pending.to_string(),
            });
        }

        let retry = Outfit::pending(
            failed.person_id.clone(),
            failed.upper_id.clone(),
            failed.lower_id.clone(),
            failed.params,
        );
        self.outfits.remove(id);
        self.outfits.insert(retry.clone())?;
        tracing::debug!(old = %id, new = %retry.id, "retrying failed outfit");
        Ok(retry)
    }

    /// Store the result of an AI edit as a new item next to its source
    pub fn add_edited_item(
        &mut self,
        source: &ItemId,
        image: ImageRef,
        instruction: &str,
    ) -> Result<WardrobeItem> {
        let original = self
            .items
            .get(source)
            .ok_or_else(|| StyleSyncError::ItemNotFound(source.to_string()))?;

        let mut edited = WardrobeItem::new(
            original.kind,
            format!("{} (Edited)", original.name),
            image,
        )
        .with_notes(format!("Edited with prompt: {}", instruction));
        edited.category = original.category.clone();
        edited.color = original.color.clone();

        self.insert_item(edited.clone())?;
        Ok(edited)
    }

    /// First outfit record for the exact triple
    pub fn outfit_for(&self, person: &ItemId, upper: &ItemId, lower: &ItemId) -> Option<&Outfit> {
        self.outfits.find_triple(person, upper, lower)
    }

    /// Clear both stores
    pub fn reset(&mut self) {
        self.items.clear();
        self.outfits.clear();
    }

    fn check_person(&self, person: &ItemId) -> Result<()> {
        if person.is_empty() {
            return Err(StyleSyncError::NoPersonSelected);
        }
        self.items.get_kind(person, ItemKind::Person)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Resolution;

    fn img() -> ImageRef {
        ImageRef::Bytes(vec![1, 2, 3])
    }

    fn studio() -> (Studio, ItemId, Vec<ItemId>, Vec<ItemId>) {
        let mut studio = Studio::new();
        let person = studio.add_item(ItemKind::Person, "Me", img()).unwrap().id;
        let uppers = ["Shirt", "Kaftan"]
            .iter()
            .map(|n| studio.add_item(ItemKind::UpperGarment, n, img()).unwrap().id)
            .collect();
        let lowers = ["Jeans", "Skirt"]
            .iter()
            .map(|n| studio.add_item(ItemKind::LowerGarment, n, img()).unwrap().id)
            .collect();
        (studio, person, uppers, lowers)
    }

    #[test]
    fn test_blank_name_gets_default() {
        let mut studio = Studio::new();
        let first = studio.add_item(ItemKind::UpperGarment, "  ", img()).unwrap();
        let second = studio.add_item(ItemKind::UpperGarment, "", img()).unwrap();
        assert_eq!(first.name, "Upper Wear 1");
        assert_eq!(second.name, "Upper Wear 2");
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut studio = Studio::new();
        let item = WardrobeItem::new(ItemKind::Person, "Me", img()).with_id(ItemId::from("p"));
        studio.insert_item(item.clone()).unwrap();
        assert!(matches!(
            studio.insert_item(item),
            Err(StyleSyncError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_batch_creates_pending_in_plan_order() {
        let (mut studio, person, uppers, lowers) = studio();
        let batch = studio.create_batch(&person, GenerationParams::Flash).unwrap();

        let pairs: Vec<_> = batch
            .iter()
            .map(|o| (o.upper_id.clone(), o.lower_id.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (uppers[0].clone(), lowers[0].clone()),
                (uppers[0].clone(), lowers[1].clone()),
                (uppers[1].clone(), lowers[0].clone()),
                (uppers[1].clone(), lowers[1].clone()),
            ]
        );
        assert!(batch.iter().all(|o| o.status() == OutfitStatus::Pending));
        assert_eq!(studio.outfits().len(), 4);

        // Second batch has nothing left to plan
        assert!(studio.create_batch(&person, GenerationParams::Flash).unwrap().is_empty());
    }

    #[test]
    fn test_batch_requires_person() {
        let (mut studio, _, uppers, _) = studio();
        assert!(matches!(
            studio.create_batch(&ItemId::from(""), GenerationParams::Flash),
            Err(StyleSyncError::NoPersonSelected)
        ));
        assert!(matches!(
            studio.create_batch(&uppers[0], GenerationParams::Flash),
            Err(StyleSyncError::InvalidItemKind { .. })
        ));
        assert!(matches!(
            studio.create_batch(&ItemId::from("ghost"), GenerationParams::Flash),
            Err(StyleSyncError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_single_allows_regeneration() {
        let (mut studio, person, uppers, lowers) = studio();
        let params = GenerationParams::Pro {
            resolution: Resolution::High,
        };
        let a = studio.create_single(&person, &uppers[0], &lowers[0], params).unwrap();
        let b = studio.create_single(&person, &uppers[0], &lowers[0], params).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(studio.outfits().len(), 2);
        assert_eq!(b.params, params);
    }

    #[test]
    fn test_single_checks_garment_kinds() {
        let (mut studio, person, uppers, lowers) = studio();
        assert!(matches!(
            studio.create_single(&person, &lowers[0], &uppers[0], GenerationParams::Flash),
            Err(StyleSyncError::InvalidItemKind { .. })
        ));
        assert!(studio.outfits().is_empty());
    }

    #[test]
    fn test_retry_only_from_failed() {
        let (mut studio, person, uppers, lowers) = studio();
        let outfit = studio
            .create_single(&person, &uppers[0], &lowers[1], GenerationParams::Flash)
            .unwrap();

        assert!(matches!(
            studio.retry_outfit(&outfit.id),
            Err(StyleSyncError::InvalidTransition { .. })
        ));

        studio.outfits_mut().mark_generating(&outfit.id).unwrap();
        studio.outfits_mut().mark_failed(&outfit.id, "boom").unwrap();

        let retry = studio.retry_outfit(&outfit.id).unwrap();
        assert_ne!(retry.id, outfit.id);
        assert_eq!(retry.status(), OutfitStatus::Pending);
        assert!(retry.matches(&person, &uppers[0], &lowers[1]));
        assert!(studio.outfits().get(&outfit.id).is_none());
        assert_eq!(studio.outfits().len(), 1);
    }

    #[test]
    fn test_resolve_person_defaults_to_first() {
        let (studio, person, uppers, _) = studio();
        assert_eq!(studio.resolve_person(None).unwrap(), person);
        assert!(studio.resolve_person(Some(&uppers[0])).is_err());
        assert!(matches!(
            Studio::new().resolve_person(None),
            Err(StyleSyncError::NoPersonSelected)
        ));
    }

    #[test]
    fn test_edited_item_copies_source() {
        let mut studio = Studio::new();
        let shirt = studio
            .add_item(ItemKind::UpperGarment, "Shirt", img())
            .unwrap();
        let edited = studio
            .add_edited_item(&shirt.id, ImageRef::Bytes(vec![9]), "make it red")
            .unwrap();
        assert_eq!(edited.name, "Shirt (Edited)");
        assert_eq!(edited.kind, ItemKind::UpperGarment);
        assert_eq!(edited.notes.as_deref(), Some("Edited with prompt: make it red"));
        assert_eq!(studio.items().len(), 2);
    }

    #[test]
    fn test_remove_item_and_reset() {
        let (mut studio, person, uppers, lowers) = studio();
        studio
            .create_single(&person, &uppers[0], &lowers[0], GenerationParams::Flash)
            .unwrap();
        studio.remove_item(&uppers[0]).unwrap();
        assert!(matches!(
            studio.remove_item(&uppers[0]),
            Err(StyleSyncError::ItemNotFound(_))
        ));
        assert_eq!(studio.outfits().len(), 1);

        studio.reset();
        assert!(studio.items().is_empty());
        assert!(studio.outfits().is_empty());
    }

    #[test]
    fn test_demo_wardrobe_plans_four_outfits() {
        let studio = Studio::with_demo_wardrobe().unwrap();
        let person = studio.default_person().unwrap().id.clone();
        assert_eq!(person.as_str(), "def-person-1");
        assert_eq!(studio.plan_batch(&person).len(), 4);
    }
}
