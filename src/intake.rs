use std::sync::{mpsc::Sender, Arc};

use crate::{
    alarm::{AlarmEntry, AlarmRequest},
    communication::{emit, Event, EventKind, EventSender},
    registry::{InsertOutcome, Registry},
};

/// The single producer side of the registry.
///
/// Every request is applied in one exclusive section, and its outcome is
/// reported before that section ends, so a request is always reported as
/// received before the dispatcher can report it processed. Whoever drains
/// the events must not also be submitting, or a full buffer stalls intake.
#[derive(Debug)]
pub struct Intake {
    registry: Arc<Registry>,
    events: EventSender,
    wake: Sender<()>,
}

impl Intake {
    #[must_use]
    pub const fn new(registry: Arc<Registry>, events: EventSender, wake: Sender<()>) -> Self {
        Self {
            registry,
            events,
            wake,
        }
    }

    pub fn submit(&self, request: AlarmRequest) -> InsertOutcome {
        let number = request.number;
        let message = request.message.clone();

        let mut list = self.registry.write();
        let outcome = list.insert_or_replace(AlarmEntry::new(request));
        let kind = match outcome {
            InsertOutcome::Inserted(_) => EventKind::RequestReceived,
            InsertOutcome::Replaced(_) => EventKind::RequestReplaced,
            InsertOutcome::CancellationQueued(_) => EventKind::RequestCancelled,
            InsertOutcome::NothingToCancel => EventKind::CancelRejectedNotFound,
            InsertOutcome::DuplicateCancellation => EventKind::CancelRejectedDuplicate,
        };
        // the event consumer never takes a registry guard, so a full buffer
        // only delays this write section
        emit(&self.events, Event::new(kind, number, message));
        log::debug!("alarm list after {kind:?}: {:?}", list.numbers());
        drop(list);

        match outcome {
            InsertOutcome::Inserted(_) | InsertOutcome::CancellationQueued(_) => {
                if self.wake.send(()).is_err() {
                    log::trace!("dispatcher gone, alarm {number} not signalled");
                }
            }
            InsertOutcome::NothingToCancel | InsertOutcome::DuplicateCancellation => {
                log::warn!("rejected request for alarm {number}: {kind:?}");
            }
            InsertOutcome::Replaced(_) => {}
        }
        outcome
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
