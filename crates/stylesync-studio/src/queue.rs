//! Sequential outfit generation queue
//!
//! Holds outfit ids in FIFO order and renders them one at a time. The queue
//! never retries and never runs two requests at once; a failed request
//! marks its record Failed and the queue moves on.

use crate::outfit::{Outfit, OutfitStatus};
use crate::provider::{ImageGenerator, OutfitRequest};
use crate::studio::Studio;
use std::collections::VecDeque;
use stylesync_core::OutfitId;

/// Failure text recorded when an outfit points at a deleted item
pub const MISSING_REFERENCE: &str = "missing reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Draining,
}

/// Published whenever a queued record changes status, and when the queue empties
#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    StatusChanged {
        outfit_id: OutfitId,
        status: OutfitStatus,
    },
    Idle,
}

/// What one drain step did with the head of the worklist
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// Deleted while queued, or no longer Pending
    Skipped(OutfitId),
    Completed(OutfitId),
    Failed { outfit_id: OutfitId, reason: String },
}

#[derive(Debug)]
pub struct GenerationQueue {
    worklist: VecDeque<OutfitId>,
    state: QueueState,
}

impl Default for GenerationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self {
            worklist: VecDeque::new(),
            state: QueueState::Idle,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.worklist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worklist.is_empty()
    }

    pub fn contains(&self, id: &OutfitId) -> bool {
        self.worklist.contains(id)
    }

    /// Append records to the tail, in order. Returns how many were added.
    pub fn enqueue<'a, I>(&mut self, outfits: I) -> usize
    where
        I: IntoIterator<Item = &'a Outfit>,
    {
        let before = self.worklist.len();
        self.worklist.extend(outfits.into_iter().map(|o| o.id.clone()));
        let added = self.worklist.len() - before;
        if added > 0 {
            self.state = QueueState::Draining;
            tracing::debug!(added, queued = self.worklist.len(), "enqueued outfits");
        }
        added
    }

    /// Process the head of the worklist. Returns `None` when there was nothing to do.
    pub fn drain_step(
        &mut self,
        studio: &mut Studio,
        generator: &dyn ImageGenerator,
        on_event: &mut dyn FnMut(StudioEvent),
    ) -> Option<DrainOutcome> {
        let id = self.worklist.pop_front()?;
        let outcome = process(id, studio, generator, on_event);

        if self.worklist.is_empty() {
            self.state = QueueState::Idle;
            tracing::debug!("generation queue idle");
            on_event(StudioEvent::Idle);
        }
        Some(outcome)
    }

    /// Run drain steps until the queue is idle
    pub fn drain(
        &mut self,
        studio: &mut Studio,
        generator: &dyn ImageGenerator,
        on_event: &mut dyn FnMut(StudioEvent),
    ) -> Vec<DrainOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.drain_step(studio, generator, on_event) {
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn process(
    id: OutfitId,
    studio: &mut Studio,
    generator: &dyn ImageGenerator,
    on_event: &mut dyn FnMut(StudioEvent),
) -> DrainOutcome {
    let is_pending = studio
        .outfits()
        .get(&id)
        .is_some_and(|o| o.status() == OutfitStatus::Pending);
    if !is_pending {
        tracing::debug!(outfit = %id, "skipping outfit that is gone or not pending");
        return DrainOutcome::Skipped(id);
    }

    if let Err(e) = studio.outfits_mut().mark_generating(&id) {
        tracing::warn!(outfit = %id, error = %e, "could not start outfit");
        return DrainOutcome::Skipped(id);
    }
    on_event(StudioEvent::StatusChanged {
        outfit_id: id.clone(),
        status: OutfitStatus::Generating,
    });

    let result = match studio.outfits().get(&id) {
        Some(outfit) => {
            let items = studio.items();
            match (
                items.get(&outfit.person_id),
                items.get(&outfit.upper_id),
                items.get(&outfit.lower_id),
            ) {
                (Some(person), Some(upper), Some(lower)) => {
                    tracing::info!(
                        outfit = %id,
                        upper = %upper.name,
                        lower = %lower.name,
                        model = outfit.model_id(),
                        "generating outfit"
                    );
                    let request = OutfitRequest {
                        person,
                        upper,
                        lower,
                        params: &outfit.params,
                    };
                    generator.generate(&request).map_err(|e| e.to_string())
                }
                _ => Err(MISSING_REFERENCE.to_string()),
            }
        }
        None => Err(MISSING_REFERENCE.to_string()),
    };

    match result {
        Ok(image) => {
            if let Err(e) = studio.outfits_mut().mark_completed(&id, image) {
                tracing::warn!(outfit = %id, error = %e, "could not record result");
            }
            tracing::info!(outfit = %id, "outfit completed");
            on_event(StudioEvent::StatusChanged {
                outfit_id: id.clone(),
                status: OutfitStatus::Completed,
            });
            DrainOutcome::Completed(id)
        }
        Err(reason) => {
            tracing::warn!(outfit = %id, %reason, "outfit generation failed");
            if let Err(e) = studio.outfits_mut().mark_failed(&id, reason.clone()) {
                tracing::warn!(outfit = %id, error = %e, "could not record failure");
            }
            on_event(StudioEvent::StatusChanged {
                outfit_id: id.clone(),
                status: OutfitStatus::Failed,
            });
            DrainOutcome::Failed {
                outfit_id: id,
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ImageRef, ItemKind};
    use crate::params::GenerationParams;
    use crate::testing::ScriptedGenerator;
    use stylesync_core::ItemId;

    struct Fixture {
        studio: Studio,
        person: ItemId,
        uppers: Vec<ItemId>,
        lowers: Vec<ItemId>,
    }

    fn fixture() -> Fixture {
        let mut studio = Studio::new();
        let img = || ImageRef::Bytes(vec![0]);
        let person = studio.add_item(ItemKind::Person, "Me", img()).unwrap().id;
        let uppers = vec![
            studio.add_item(ItemKind::UpperGarment, "A", img()).unwrap().id,
            studio.add_item(ItemKind::UpperGarment, "B", img()).unwrap().id,
        ];
        let lowers = vec![
            studio.add_item(ItemKind::LowerGarment, "X", img()).unwrap().id,
            studio.add_item(ItemKind::LowerGarment, "Y", img()).unwrap().id,
        ];
        Fixture {
            studio,
            person,
            uppers,
            lowers,
        }
    }

    fn status_of(studio: &Studio, id: &OutfitId) -> OutfitStatus {
        studio.outfits().get(id).unwrap().status()
    }

    #[test]
    fn test_drains_batch_in_fifo_order() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new();
        let calls = generator.calls();

        let batch = f.studio.create_batch(&f.person, GenerationParams::Flash).unwrap();
        let mut queue = GenerationQueue::new();
        assert_eq!(queue.enqueue(&batch), 4);
        assert_eq!(queue.state(), QueueState::Draining);

        let mut events = Vec::new();
        let outcomes = queue.drain(&mut f.studio, &generator, &mut |e| events.push(e));

        assert_eq!(outcomes.len(), 4);
        assert_eq!(queue.state(), QueueState::Idle);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (f.uppers[0].clone(), f.lowers[0].clone()),
                (f.uppers[0].clone(), f.lowers[1].clone()),
                (f.uppers[1].clone(), f.lowers[0].clone()),
                (f.uppers[1].clone(), f.lowers[1].clone()),
            ]
        );
        for outfit in &batch {
            let stored = f.studio.outfits().get(&outfit.id).unwrap();
            assert_eq!(stored.status(), OutfitStatus::Completed);
            assert!(stored.result_image().is_some());
        }

        // Generating then Completed per record, then a single Idle
        assert_eq!(events.len(), 9);
        assert_eq!(
            events[0],
            StudioEvent::StatusChanged {
                outfit_id: batch[0].id.clone(),
                status: OutfitStatus::Generating,
            }
        );
        assert_eq!(
            events[1],
            StudioEvent::StatusChanged {
                outfit_id: batch[0].id.clone(),
                status: OutfitStatus::Completed,
            }
        );
        assert_eq!(events[8], StudioEvent::Idle);
    }

    #[test]
    fn test_failure_does_not_stop_queue() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new().failing_on(&f.uppers[0]);

        let batch = f.studio.create_batch(&f.person, GenerationParams::Flash).unwrap();
        let mut queue = GenerationQueue::new();
        queue.enqueue(&batch);
        let outcomes = queue.drain(&mut f.studio, &generator, &mut |_| {});

        assert!(matches!(outcomes[0], DrainOutcome::Failed { .. }));
        assert!(matches!(outcomes[1], DrainOutcome::Failed { .. }));
        assert_eq!(outcomes[2], DrainOutcome::Completed(batch[2].id.clone()));
        assert_eq!(outcomes[3], DrainOutcome::Completed(batch[3].id.clone()));

        let failed = f.studio.outfits().get(&batch[0].id).unwrap();
        assert_eq!(failed.status(), OutfitStatus::Failed);
        assert!(failed.result_image().is_none());
        assert!(failed.failure().unwrap().contains("500"));
    }

    #[test]
    fn test_missing_reference_fails_without_calling_generator() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new();
        let calls = generator.calls();

        let outfit = f
            .studio
            .create_single(&f.person, &f.uppers[0], &f.lowers[0], GenerationParams::Flash)
            .unwrap();
        f.studio.remove_item(&f.lowers[0]).unwrap();

        let mut queue = GenerationQueue::new();
        queue.enqueue([&outfit]);
        let outcomes = queue.drain(&mut f.studio, &generator, &mut |_| {});

        assert_eq!(
            outcomes,
            vec![DrainOutcome::Failed {
                outfit_id: outfit.id.clone(),
                reason: MISSING_REFERENCE.to_string(),
            }]
        );
        assert_eq!(status_of(&f.studio, &outfit.id), OutfitStatus::Failed);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_upper_fails_only_its_own_record() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new();
        let calls = generator.calls();

        let pairs = [
            (&f.uppers[0], &f.lowers[0]),
            (&f.uppers[1], &f.lowers[0]),
            (&f.uppers[0], &f.lowers[1]),
        ];
        let outfits: Vec<Outfit> = pairs
            .iter()
            .map(|(upper, lower)| {
                f.studio
                    .create_single(&f.person, upper, lower, GenerationParams::Flash)
                    .unwrap()
            })
            .collect();
        f.studio.remove_item(&f.uppers[1]).unwrap();

        let mut queue = GenerationQueue::new();
        assert_eq!(queue.enqueue(&outfits), 3);
        let mut events = Vec::new();
        queue.drain(&mut f.studio, &generator, &mut |e| events.push(e));

        let statuses: Vec<OutfitStatus> =
            outfits.iter().map(|o| status_of(&f.studio, &o.id)).collect();
        assert_eq!(
            statuses,
            vec![
                OutfitStatus::Completed,
                OutfitStatus::Failed,
                OutfitStatus::Completed
            ]
        );
        assert_eq!(
            f.studio.outfits().get(&outfits[1].id).unwrap().failure(),
            Some(MISSING_REFERENCE)
        );
        assert_eq!(queue.state(), QueueState::Idle);
        assert_eq!(calls.lock().unwrap().len(), 2);

        let generating: Vec<OutfitId> = events
            .iter()
            .filter_map(|e| match e {
                StudioEvent::StatusChanged {
                    outfit_id,
                    status: OutfitStatus::Generating,
                } => Some(outfit_id.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<OutfitId> = outfits.iter().map(|o| o.id.clone()).collect();
        assert_eq!(generating, expected);
        assert_eq!(events.last(), Some(&StudioEvent::Idle));
    }

    #[test]
    fn test_deleted_record_is_skipped() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new();

        let batch = f.studio.create_batch(&f.person, GenerationParams::Flash).unwrap();
        let mut queue = GenerationQueue::new();
        queue.enqueue(&batch);
        f.studio.delete_outfit(&batch[1].id).unwrap();

        let outcomes = queue.drain(&mut f.studio, &generator, &mut |_| {});
        assert_eq!(outcomes[1], DrainOutcome::Skipped(batch[1].id.clone()));
        assert_eq!(f.studio.outfits().len(), 3);
        assert!(f
            .studio
            .outfits()
            .iter()
            .all(|o| o.status() == OutfitStatus::Completed));
    }

    #[test]
    fn test_fifo_across_enqueues() {
        let mut f = fixture();
        let generator = ScriptedGenerator::new();
        let calls = generator.calls();

        let first = f
            .studio
            .create_single(&f.person, &f.uppers[1], &f.lowers[1], GenerationParams::Flash)
            .unwrap();
        let second = f
            .studio
            .create_single(&f.person, &f.uppers[0], &f.lowers[0], GenerationParams::Flash)
            .unwrap();

        let mut queue = GenerationQueue::new();
        queue.enqueue([&first]);
        queue.drain_step(&mut f.studio, &generator, &mut |_| {});
        assert_eq!(queue.state(), QueueState::Idle);

        queue.enqueue([&second]);
        queue.enqueue([&first]);
        let outcomes = queue.drain(&mut f.studio, &generator, &mut |_| {});

        // The re-enqueued record is already Completed
        assert_eq!(outcomes[1], DrainOutcome::Skipped(first.id.clone()));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (f.uppers[1].clone(), f.lowers[1].clone()),
                (f.uppers[0].clone(), f.lowers[0].clone()),
            ]
        );
    }

    #[test]
    fn test_empty_enqueue_stays_idle() {
        let mut f = fixture();
        let mut queue = GenerationQueue::new();
        assert_eq!(queue.enqueue(&Vec::<Outfit>::new()), 0);
        assert_eq!(queue.state(), QueueState::Idle);
        assert!(queue
            .drain_step(&mut f.studio, &ScriptedGenerator::new(), &mut |_| {})
            .is_none());
    }
}
