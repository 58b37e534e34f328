use std::{sync::Arc, thread, time::Duration};

use crate::{
    alarm::{AlarmNumber, Liveness},
    communication::{emit, Event, EventKind, EventSender},
    error::fatal,
    registry::{Claim, EntryId, Registry},
};

/// Result of one notifier cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    /// still linked, sleep this long before the next cycle
    Active(Duration),
    /// the entry was unlinked, the notifier is done
    Exiting,
}

/// Periodically announces one standard alarm until it is unlinked.
#[derive(Debug)]
pub struct Notifier {
    registry: Arc<Registry>,
    events: EventSender,
    entry: EntryId,
    number: AlarmNumber,
    liveness: Liveness,
    announced_replacement: bool,
    last_message: String,
}

impl Notifier {
    #[must_use]
    pub fn new(registry: Arc<Registry>, events: EventSender, claim: Claim) -> Self {
        Self {
            registry,
            events,
            entry: claim.id,
            number: claim.number,
            liveness: claim.liveness,
            announced_replacement: false,
            last_message: claim.message,
        }
    }

    /// Runs the notifier on its own detached thread.
    pub fn spawn(self) {
        let name = format!("notifier-{}", self.number);
        if let Err(e) = thread::Builder::new().name(name).spawn(move || self.run()) {
            fatal("create notifier thread", e);
        }
    }

    pub fn run(mut self) {
        log::debug!("notifier for alarm {} started", self.number);
        while let NotifierState::Active(period) = self.tick() {
            thread::sleep(period);
        }
        log::debug!("notifier for alarm {} finished", self.number);
    }

    /// One cycle without the trailing sleep.
    pub fn tick(&mut self) -> NotifierState {
        let (event, state) = self.observe();
        // the guard is gone by now, a full event buffer only stalls this thread
        emit(&self.events, event);
        state
    }

    /// Reads the entry under shared access and decides what to report.
    fn observe(&mut self) -> (Event, NotifierState) {
        let list = self.registry.read();

        let entry = self
            .liveness
            .is_linked()
            .then(|| list.get(self.entry))
            .flatten();
        let Some(entry) = entry else {
            let event = Event::new(
                EventKind::NotifierExiting,
                self.number,
                self.last_message.as_str(),
            );
            return (event, NotifierState::Exiting);
        };

        let kind = match (entry.is_modified(), self.announced_replacement) {
            (false, _) => EventKind::Displayed,
            (true, true) => EventKind::ReplacementDisplayed,
            (true, false) => {
                self.announced_replacement = true;
                EventKind::ReplacedNotice
            }
        };
        self.last_message.clone_from(&entry.message);
        (
            Event::new(kind, self.number, entry.message()),
            NotifierState::Active(Duration::from_secs(entry.interval())),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::{
        alarm::{AlarmEntry, AlarmRequest},
        registry::InsertOutcome,
    };

    fn claimed(registry: &Registry, number: AlarmNumber, message: &str) -> Claim {
        registry.submit(AlarmRequest::standard(number, 3, message));
        registry.read().scan_for_unprocessed().unwrap()
    }

    #[test]
    fn announces_replacement_once() {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::sync_channel(8);
        let claim = claimed(&registry, 1, "first");
        let mut notifier = Notifier::new(Arc::clone(&registry), tx, claim);

        assert_eq!(notifier.tick(), NotifierState::Active(Duration::from_secs(3)));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::Displayed);

        registry.submit(AlarmRequest::standard(1, 4, "second"));
        assert_eq!(notifier.tick(), NotifierState::Active(Duration::from_secs(4)));
        let replaced = rx.try_recv().unwrap();
        assert_eq!(replaced.kind, EventKind::ReplacedNotice);
        assert_eq!(replaced.message, "second");

        notifier.tick();
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ReplacementDisplayed);
    }

    #[test]
    fn exits_once_unlinked() {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::sync_channel(8);
        let claim = claimed(&registry, 2, "going");
        let mut notifier = Notifier::new(Arc::clone(&registry), tx, claim);
        notifier.tick();
        rx.try_recv().unwrap();

        let InsertOutcome::CancellationQueued(marker) =
            registry.submit(AlarmRequest::cancel(2))
        else {
            panic!("expected cancellation");
        };
        registry.write().remove_matched_pair(marker);

        assert_eq!(notifier.tick(), NotifierState::Exiting);
        let exiting = rx.try_recv().unwrap();
        assert_eq!(exiting.kind, EventKind::NotifierExiting);
        assert_eq!(exiting.alarm_number, 2);
        assert_eq!(exiting.message, "going");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn keeps_running_without_a_receiver() {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::sync_channel(8);
        drop(rx);
        let claim = claimed(&registry, 3, "unheard");
        let mut notifier = Notifier::new(registry, tx, claim);
        assert!(matches!(notifier.tick(), NotifierState::Active(_)));
    }

    #[test]
    fn zero_interval_stalls_on_a_full_buffer() {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::sync_channel(4);
        let claim = claimed(&registry, 5, "spin");
        let mut notifier = Notifier::new(Arc::clone(&registry), tx, claim);
        notifier.tick();
        rx.recv().unwrap();
        registry.submit(AlarmRequest::standard(5, 0, "spin"));
        let worker = thread::spawn(move || notifier.run());

        thread::sleep(Duration::from_millis(100));
        // a blocked notifier holds no guard, so the writer gets in
        let mut list = registry.write();
        let InsertOutcome::CancellationQueued(marker) =
            list.insert_or_replace(AlarmEntry::new(AlarmRequest::cancel(5)))
        else {
            panic!("expected cancellation");
        };
        list.remove_matched_pair(marker);
        drop(list);

        // buffered events, at most one already built, then the exit notice
        let kinds: Vec<_> = rx.iter().map(|event| event.kind).collect();
        worker.join().unwrap();
        assert!(kinds.len() <= 6, "{} events for a 4 slot buffer", kinds.len());
        assert_eq!(kinds.last(), Some(&EventKind::NotifierExiting));
    }
}
