//! Outfit records and the outfit store
//!
//! An outfit pairs one person with one upper and one lower garment. Its
//! status only moves forward (pending, generating, then completed or
//! failed), and the rendered image exists exactly when it is completed.

use crate::item::ImageRef;
use crate::params::GenerationParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use stylesync_core::{ItemId, OutfitId, Result, StyleSyncError};

/// Status of an outfit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl OutfitStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutfitStatus::Completed | OutfitStatus::Failed)
    }
}

impl fmt::Display for OutfitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutfitStatus::Pending => write!(f, "pending"),
            OutfitStatus::Generating => write!(f, "generating"),
            OutfitStatus::Completed => write!(f, "completed"),
            OutfitStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A generated-or-pending composite of a person with two garments
#[derive(Debug, Clone, PartialEq)]
pub struct Outfit {
    pub id: OutfitId,
    pub person_id: ItemId,
    pub upper_id: ItemId,
    pub lower_id: ItemId,
    pub params: GenerationParams,
    pub created_at: DateTime<Utc>,
    status: OutfitStatus,
    result_image: Option<ImageRef>,
    failure: Option<String>,
}

impl Outfit {
    /// Create a pending outfit with a fresh id
    pub fn pending(
        person_id: ItemId,
        upper_id: ItemId,
        lower_id: ItemId,
        params: GenerationParams,
    ) -> Self {
        Self {
            id: OutfitId::new(),
            person_id,
            upper_id,
            lower_id,
            params,
            created_at: Utc::now(),
            status: OutfitStatus::Pending,
            result_image: None,
            failure: None,
        }
    }

    /// Rebuild a record from persisted parts, checking the status/result invariant
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OutfitId,
        person_id: ItemId,
        upper_id: ItemId,
        lower_id: ItemId,
        params: GenerationParams,
        created_at: DateTime<Utc>,
        status: OutfitStatus,
        result_image: Option<ImageRef>,
        failure: Option<String>,
    ) -> Result<Self> {
        if (status == OutfitStatus::Completed) != result_image.is_some() {
            return Err(StyleSyncError::ValidationError(format!(
                "outfit {} is {} but {} a result image",
                id,
                status,
                if result_image.is_some() { "has" } else { "lacks" }
            )));
        }
        let failure = if status == OutfitStatus::Failed {
            failure
        } else {
            None
        };
        Ok(Self {
            id,
            person_id,
            upper_id,
            lower_id,
            params,
            created_at,
            status,
            result_image,
            failure,
        })
    }

    pub fn status(&self) -> OutfitStatus {
        self.status
    }

    /// The rendered image, present only when completed
    pub fn result_image(&self) -> Option<&ImageRef> {
        self.result_image.as_ref()
    }

    /// Why the record failed, present only when failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn model_id(&self) -> &'static str {
        self.params.model_id()
    }

    /// Whether this record is for the given (person, upper, lower) triple
    pub fn matches(&self, person: &ItemId, upper: &ItemId, lower: &ItemId) -> bool {
        &self.person_id == person && &self.upper_id == upper && &self.lower_id == lower
    }

    /// Whether this record references the item in any slot
    pub fn references(&self, item: &ItemId) -> bool {
        &self.person_id == item || &self.upper_id == item || &self.lower_id == item
    }

    fn transition(&mut self, to: OutfitStatus) -> Result<()> {
        let allowed = matches!(
            (self.status, to),
            (OutfitStatus::Pending, OutfitStatus::Generating)
                | (OutfitStatus::Generating, OutfitStatus::Completed)
                | (OutfitStatus::Generating, OutfitStatus::Failed)
        );
        if !allowed {
            return Err(StyleSyncError::InvalidTransition {
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn mark_generating(&mut self) -> Result<()> {
        self.transition(OutfitStatus::Generating)
    }

    pub fn mark_completed(&mut self, image: ImageRef) -> Result<()> {
        self.transition(OutfitStatus::Completed)?;
        self.result_image = Some(image);
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(OutfitStatus::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }
}

/// Ordered collection of outfit records with unique ids
#[derive(Debug, Clone, Default)]
pub struct OutfitStore {
    outfits: Vec<Outfit>,
}

impl OutfitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; ids must be unique
    pub fn insert(&mut self, outfit: Outfit) -> Result<()> {
        if self.get(&outfit.id).is_some() {
            return Err(StyleSyncError::DuplicateId(outfit.id.to_string()));
        }
        self.outfits.push(outfit);
        Ok(())
    }

    pub fn get(&self, id: &OutfitId) -> Option<&Outfit> {
        self.outfits.iter().find(|o| &o.id == id)
    }

    pub fn get_mut(&mut self, id: &OutfitId) -> Option<&mut Outfit> {
        self.outfits.iter_mut().find(|o| &o.id == id)
    }

    fn require_mut(&mut self, id: &OutfitId) -> Result<&mut Outfit> {
        self.get_mut(id)
            .ok_or_else(|| StyleSyncError::OutfitNotFound(id.to_string()))
    }

    pub fn mark_generating(&mut self, id: &OutfitId) -> Result<()> {
        self.require_mut(id)?.mark_generating()
    }

    pub fn mark_completed(&mut self, id: &OutfitId, image: ImageRef) -> Result<()> {
        self.require_mut(id)?.mark_completed(image)
    }

    pub fn mark_failed(&mut self, id: &OutfitId, reason: impl Into<String>) -> Result<()> {
        self.require_mut(id)?.mark_failed(reason)
    }

    /// Remove a record, returning it if it existed
    pub fn remove(&mut self, id: &OutfitId) -> Option<Outfit> {
        let pos = self.outfits.iter().position(|o| &o.id == id)?;
        Some(self.outfits.remove(pos))
    }

    /// First record for the exact (person, upper, lower) triple
    pub fn find_triple(&self, person: &ItemId, upper: &ItemId, lower: &ItemId) -> Option<&Outfit> {
        self.outfits.iter().find(|o| o.matches(person, upper, lower))
    }

    pub fn for_person<'a>(&'a self, person: &'a ItemId) -> impl Iterator<Item = &'a Outfit> {
        self.outfits.iter().filter(move |o| &o.person_id == person)
    }

    pub fn with_status(&self, status: OutfitStatus) -> impl Iterator<Item = &Outfit> {
        self.outfits.iter().filter(move |o| o.status == status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outfit> {
        self.outfits.iter()
    }

    pub fn as_slice(&self) -> &[Outfit] {
        &self.outfits
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }

    pub fn clear(&mut self) {
        self.outfits.clear();
    }
}
