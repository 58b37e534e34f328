#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(
    clippy::use_self,
    rust_2018_idioms,
    missing_debug_implementations
)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    sync::{
        mpsc::{self, Receiver},
        Arc,
    },
    thread::JoinHandle,
};

pub mod alarm;
pub mod command;
pub mod communication;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod error;
/// reader-preferring lock guarding the registry
pub mod gate;
pub mod intake;
pub mod notifier;
pub mod registry;

pub use alarm::{AlarmKind, AlarmNumber, AlarmRequest};
pub use communication::{Event, EventKind};
pub use error::{Error, Result};
pub use registry::{InsertOutcome, Registry};

use config::Config;
use dispatcher::Dispatcher;
use intake::Intake;

/// A running registry: the producer handle, the event stream and the
/// dispatcher thread.
#[derive(Debug)]
pub struct AlarmCore {
    pub intake: Intake,
    pub events: Receiver<Event>,
    pub dispatcher: JoinHandle<()>,
}

impl AlarmCore {
    /// Creates an empty registry and starts its dispatcher thread.
    ///
    /// `events` holds at most `config.event_buffer` undelivered events;
    /// drain it from a thread that does not also submit.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the dispatcher thread couldn't be created.
    pub fn start(config: &Config) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let (events_tx, events) = mpsc::sync_channel(config.event_buffer);
        let (wake_tx, wake) = mpsc::channel();

        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            events_tx.clone(),
            wake,
            config.dispatcher.idle_wait(),
        )
        .spawn()?;

        Ok(Self {
            intake: Intake::new(registry, events_tx, wake_tx),
            events,
            dispatcher,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        self.intake.registry()
    }
}
