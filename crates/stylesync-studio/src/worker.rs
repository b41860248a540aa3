//! Studio worker thread
//!
//! One thread owns the [`Studio`], the [`GenerationQueue`] and the
//! generator. Callers talk to it through a cloneable [`StudioHandle`];
//! each command carries its own reply channel. While the queue is draining
//! the worker handles every waiting command between generation steps, so
//! snapshots and deletes never wait for the whole batch.

use crate::item::WardrobeItem;
use crate::outfit::{Outfit, OutfitStatus};
use crate::params::GenerationParams;
use crate::provider::{ImageGenerator, ProviderStatus};
use crate::queue::{GenerationQueue, StudioEvent};
use crate::studio::Studio;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use stylesync_core::{ItemId, OutfitId, Result, StyleSyncError};

type Reply<T> = Sender<Result<T>>;

enum Command {
    AddItem {
        item: WardrobeItem,
        reply: Reply<WardrobeItem>,
    },
    RemoveItem {
        id: ItemId,
        reply: Reply<WardrobeItem>,
    },
    GenerateBatch {
        person: Option<ItemId>,
        params: GenerationParams,
        reply: Reply<Vec<Outfit>>,
    },
    GeneratePair {
        person: Option<ItemId>,
        upper: ItemId,
        lower: ItemId,
        params: GenerationParams,
        reply: Reply<Outfit>,
    },
    RetryOutfit {
        id: OutfitId,
        reply: Reply<Outfit>,
    },
    DeleteOutfit {
        id: OutfitId,
        reply: Reply<Outfit>,
    },
    ResumePending {
        reply: Reply<usize>,
    },
    EditItem {
        id: ItemId,
        instruction: String,
        reply: Reply<WardrobeItem>,
    },
    Snapshot {
        reply: Sender<Studio>,
    },
    WaitIdle {
        reply: Sender<()>,
    },
    Shutdown {
        reply: Sender<Studio>,
    },
}

/// Cloneable handle to a running studio worker
#[derive(Clone)]
pub struct StudioHandle {
    tx: Sender<Command>,
}

impl StudioHandle {
    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = mpsc::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| StyleSyncError::WorkerStopped)?;
        response.recv().map_err(|_| StyleSyncError::WorkerStopped)
    }

    pub fn add_item(&self, item: WardrobeItem) -> Result<WardrobeItem> {
        self.request(|reply| Command::AddItem { item, reply })?
    }

    pub fn remove_item(&self, id: &ItemId) -> Result<WardrobeItem> {
        let id = id.clone();
        self.request(|reply| Command::RemoveItem { id, reply })?
    }

    /// Plan and enqueue every untried pair for the person (or the default person)
    pub fn generate_batch(
        &self,
        person: Option<&ItemId>,
        params: GenerationParams,
    ) -> Result<Vec<Outfit>> {
        let person = person.cloned();
        self.request(|reply| Command::GenerateBatch {
            person,
            params,
            reply,
        })?
    }

    /// Enqueue one explicit pair
    pub fn generate_pair(
        &self,
        person: Option<&ItemId>,
        upper: &ItemId,
        lower: &ItemId,
        params: GenerationParams,
    ) -> Result<Outfit> {
        let (person, upper, lower) = (person.cloned(), upper.clone(), lower.clone());
        self.request(|reply| Command::GeneratePair {
            person,
            upper,
            lower,
            params,
            reply,
        })?
    }

    /// Replace a failed record with a new pending one and enqueue it
    pub fn retry_outfit(&self, id: &OutfitId) -> Result<Outfit> {
        let id = id.clone();
        self.request(|reply| Command::RetryOutfit { id, reply })?
    }

    pub fn delete_outfit(&self, id: &OutfitId) -> Result<Outfit> {
        let id = id.clone();
        self.request(|reply| Command::DeleteOutfit { id, reply })?
    }

    /// Enqueue every Pending record not already queued. Returns how many were added.
    pub fn resume_pending(&self) -> Result<usize> {
        self.request(|reply| Command::ResumePending { reply })?
    }

    /// Run an AI edit on an item and store the result as a new item
    pub fn edit_item(&self, id: &ItemId, instruction: &str) -> Result<WardrobeItem> {
        let id = id.clone();
        let instruction = instruction.to_string();
        self.request(|reply| Command::EditItem {
            id,
            instruction,
            reply,
        })?
    }

    /// A copy of the studio as it is right now
    pub fn snapshot(&self) -> Result<Studio> {
        self.request(|reply| Command::Snapshot { reply })
    }

    /// Block until the queue is empty
    pub fn wait_idle(&self) -> Result<()> {
        self.request(|reply| Command::WaitIdle { reply })
    }

    /// Drain the queue, stop the worker and take back the studio
    pub fn shutdown(self) -> Result<Studio> {
        self.request(|reply| Command::Shutdown { reply })
    }
}

pub struct StudioWorker {
    studio: Studio,
    queue: GenerationQueue,
    generator: Box<dyn ImageGenerator>,
    events: Option<Sender<StudioEvent>>,
    idle_waiters: Vec<Sender<()>>,
}

impl StudioWorker {
    pub fn new(studio: Studio, generator: Box<dyn ImageGenerator>) -> Self {
        Self {
            studio,
            queue: GenerationQueue::new(),
            generator,
            events: None,
            idle_waiters: Vec::new(),
        }
    }

    /// Publish status events on this channel
    pub fn with_events(mut self, events: Sender<StudioEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Start the worker thread
    pub fn spawn(self) -> (StudioHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let thread = std::thread::spawn(move || self.run(rx));
        (StudioHandle { tx }, thread)
    }

    fn run(mut self, rx: Receiver<Command>) {
        let mut shutdown: Option<Sender<Studio>> = None;
        let mut connected = true;

        loop {
            if self.queue.is_empty() {
                for waiter in self.idle_waiters.drain(..) {
                    let _ = waiter.send(());
                }
                if let Some(reply) = shutdown.take() {
                    tracing::debug!("studio worker shutting down");
                    let _ = reply.send(self.studio);
                    return;
                }
                if !connected {
                    tracing::debug!("all studio handles dropped");
                    return;
                }
                match rx.recv() {
                    Ok(cmd) => shutdown = self.handle(cmd),
                    Err(_) => connected = false,
                }
                continue;
            }

            while connected && shutdown.is_none() {
                match rx.try_recv() {
                    Ok(cmd) => shutdown = self.handle(cmd),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => connected = false,
                }
            }

            let events = &self.events;
            self.queue.drain_step(
                &mut self.studio,
                self.generator.as_ref(),
                &mut |event| publish(events, event),
            );
        }
    }

    /// Apply one command. Returns the reply channel if the command was a shutdown.
    fn handle(&mut self, cmd: Command) -> Option<Sender<Studio>> {
        match cmd {
            Command::AddItem { item, reply } => {
                let result = self.studio.insert_item(item.clone()).map(|_| item);
                let _ = reply.send(result);
            }
            Command::RemoveItem { id, reply } => {
                let _ = reply.send(self.studio.remove_item(&id));
            }
            Command::GenerateBatch {
                person,
                params,
                reply,
            } => {
                let result = self.ready_person(person.as_ref()).and_then(|person| {
                    let batch = self.studio.create_batch(&person, params)?;
                    self.enqueue(&batch);
                    Ok(batch)
                });
                let _ = reply.send(result);
            }
            Command::GeneratePair {
                person,
                upper,
                lower,
                params,
                reply,
            } => {
                let result = self.ready_person(person.as_ref()).and_then(|person| {
                    let outfit = self.studio.create_single(&person, &upper, &lower, params)?;
                    self.enqueue(std::slice::from_ref(&outfit));
                    Ok(outfit)
                });
                let _ = reply.send(result);
            }
            Command::RetryOutfit { id, reply } => {
                let result = self.check_generator().and_then(|_| {
                    let outfit = self.studio.retry_outfit(&id)?;
                    self.enqueue(std::slice::from_ref(&outfit));
                    Ok(outfit)
                });
                let _ = reply.send(result);
            }
            Command::DeleteOutfit { id, reply } => {
                let _ = reply.send(self.studio.delete_outfit(&id));
            }
            Command::ResumePending { reply } => {
                let result = self.check_generator().map(|_| {
                    let pending: Vec<Outfit> = self
                        .studio
                        .outfits()
                        .with_status(OutfitStatus::Pending)
                        .filter(|o| !self.queue.contains(&o.id))
                        .cloned()
                        .collect();
                    self.enqueue(&pending)
                });
                let _ = reply.send(result);
            }
            Command::EditItem {
                id,
                instruction,
                reply,
            } => {
                let _ = reply.send(self.edit_item(&id, &instruction));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.studio.clone());
            }
            Command::WaitIdle { reply } => {
                if self.queue.is_empty() {
                    let _ = reply.send(());
                } else {
                    self.idle_waiters.push(reply);
                }
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    fn enqueue(&mut self, outfits: &[Outfit]) -> usize {
        let added = self.queue.enqueue(outfits);
        for outfit in outfits {
            publish(
                &self.events,
                StudioEvent::StatusChanged {
                    outfit_id: outfit.id.clone(),
                    status: outfit.status(),
                },
            );
        }
        added
    }

    fn check_generator(&self) -> Result<()> {
        match self.generator.health_check() {
            ProviderStatus::Available => Ok(()),
            ProviderStatus::NoApiKey => Err(StyleSyncError::MissingCredential(
                self.generator.name().to_string(),
            )),
            ProviderStatus::Unavailable(reason) => Err(StyleSyncError::GenerationError(reason)),
        }
    }

    /// Credential first, then person: nothing is created unless both hold
    fn ready_person(&self, person: Option<&ItemId>) -> Result<ItemId> {
        self.check_generator()?;
        self.studio.resolve_person(person)
    }

    fn edit_item(&mut self, id: &ItemId, instruction: &str) -> Result<WardrobeItem> {
        self.check_generator()?;
        if instruction.trim().is_empty() {
            return Err(StyleSyncError::ValidationError(
                "edit instruction is empty".to_string(),
            ));
        }
        let source = self
            .studio
            .items()
            .get(id)
            .ok_or_else(|| StyleSyncError::ItemNotFound(id.to_string()))?;

        tracing::info!(item = %id, "editing wardrobe item");
        let image = self.generator.edit(&source.image, instruction)?;
        self.studio.add_edited_item(id, image, instruction)
    }
}

fn publish(events: &Option<Sender<StudioEvent>>, event: StudioEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
