//! Test support: a generator whose answers are scripted per garment

use crate::item::ImageRef;
use crate::provider::*;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stylesync_core::ItemId;

/// Records every call and fails any request whose upper garment is in `fail_on`
pub(crate) struct ScriptedGenerator {
    pub calls: Arc<Mutex<Vec<(ItemId, ItemId)>>>,
    pub fail_on: Vec<ItemId>,
    pub status: ProviderStatus,
    pub delay: Option<Duration>,
    gate: Option<(Sender<()>, Receiver<()>)>,
}

/// Test-side end of a gated generator: each `generate` call announces
/// itself and then blocks until the test lets it through
pub(crate) struct StepGate {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl StepGate {
    /// Block until the generator is inside a call
    pub fn wait_entered(&self) {
        self.entered.recv().unwrap();
    }

    pub fn release(&self) {
        self.release.send(()).unwrap();
    }

    /// Let exactly one call run to completion
    pub fn step(&self) {
        self.wait_entered();
        self.release();
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Vec::new(),
            status: ProviderStatus::Available,
            delay: None,
            gate: None,
        }
    }

    pub fn failing_on(mut self, upper: &ItemId) -> Self {
        self.fail_on.push(upper.clone());
        self
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every `generate` call until the returned gate releases it
    pub fn gated(mut self) -> (Self, StepGate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.gate = Some((entered_tx, release_rx));
        let gate = StepGate {
            entered: entered_rx,
            release: release_tx,
        };
        (self, gate)
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(ItemId, ItemId)>>> {
        Arc::clone(&self.calls)
    }
}

impl ImageGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn health_check(&self) -> ProviderStatus {
        self.status.clone()
    }

    fn generate(&self, request: &OutfitRequest<'_>) -> Result<ImageRef, GenerationError> {
        if let Some((entered, release)) = &self.gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        self.calls
            .lock()
            .unwrap()
            .push((request.upper.id.clone(), request.lower.id.clone()));
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_on.contains(&request.upper.id) {
            return Err(GenerationError::Backend { status: 500 });
        }
        Ok(ImageRef::Bytes(
            format!("{}+{}", request.upper.id, request.lower.id).into_bytes(),
        ))
    }

    fn edit(&self, _image: &ImageRef, instruction: &str) -> Result<ImageRef, GenerationError> {
        Ok(ImageRef::Bytes(instruction.as_bytes().to_vec()))
    }
}
