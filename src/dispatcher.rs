use std::{
    sync::{
        mpsc::{Receiver, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    alarm::AlarmKind,
    communication::{emit, Event, EventKind, EventSender},
    error::{Error, Result},
    notifier::Notifier,
    registry::{Claim, Registry},
};

/// What one dispatcher step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// started a notifier for a new standard alarm
    NotifierLaunched(Claim),
    /// removed a cancellation marker and its standard alarm
    PairRemoved(Claim),
}

/// Claims new entries and reacts to them: a notifier for every new
/// standard alarm, structural removal for every new cancellation.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    events: EventSender,
    wake: Receiver<()>,
    idle_wait: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        events: EventSender,
        wake: Receiver<()>,
        idle_wait: Duration,
    ) -> Self {
        Self {
            registry,
            events,
            wake,
            idle_wait,
        }
    }

    /// Runs the dispatcher loop on its own thread. The loop never ends on
    /// its own; it lives as long as the process.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the thread couldn't be created.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || self.run())
            .map_err(|source| Error::Spawn {
                name: "dispatcher",
                source,
            })
    }

    pub fn run(self) {
        log::info!("dispatcher started");
        loop {
            if self.step().is_none() {
                self.idle();
            }
        }
    }

    /// Scans once and handles whatever was claimed.
    pub fn step(&self) -> Option<Dispatched> {
        let list = self.registry.read();
        let claim = list.scan_for_unprocessed()?;
        log::debug!("claimed {} {} ({})", claim.kind, claim.number, claim.id);

        match claim.kind {
            AlarmKind::Standard => {
                drop(list);
                self.processed(&claim);
                Notifier::new(Arc::clone(&self.registry), self.events.clone(), claim.clone())
                    .spawn();
                Some(Dispatched::NotifierLaunched(claim))
            }
            AlarmKind::Cancellation => {
                drop(list);
                let mut list = self.registry.write();
                match list.remove_matched_pair(claim.id) {
                    Some(removed) => log::debug!(
                        "removed alarm {} (standard {}), list now {:?}",
                        claim.number,
                        if removed.standard.is_some() { "found" } else { "missing" },
                        list.numbers()
                    ),
                    None => log::warn!("cancellation {} vanished before removal", claim.id),
                }
                drop(list);
                self.processed(&claim);
                Some(Dispatched::PairRemoved(claim))
            }
        }
    }

    fn processed(&self, claim: &Claim) {
        emit(
            &self.events,
            Event::new(EventKind::RequestProcessed, claim.number, claim.message.as_str()),
        );
    }

    /// Waits for intake to signal a new entry, or for the idle timeout.
    fn idle(&self) {
        match self.wake.recv_timeout(self.idle_wait) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            // nobody can submit any more, fall back to plain polling
            Err(RecvTimeoutError::Disconnected) => thread::sleep(self.idle_wait),
        }
    }
}
