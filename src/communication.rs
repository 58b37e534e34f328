use std::sync::mpsc::SyncSender;

use chrono::{DateTime, Local};

use crate::alarm::AlarmNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// a new standard alarm was linked
    RequestReceived,
    /// an existing standard alarm took over new content
    RequestReplaced,
    /// a cancellation marker was linked
    RequestCancelled,
    CancelRejectedNotFound,
    CancelRejectedDuplicate,
    /// the dispatcher claimed and handled an entry
    RequestProcessed,
    Displayed,
    /// periodic display after the replacement was announced
    ReplacementDisplayed,
    /// first display after a replacement
    ReplacedNotice,
    NotifierExiting,
}

/// Something the registry core reports to whoever renders output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub alarm_number: AlarmNumber,
    pub message: String,
    pub at: DateTime<Local>,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, alarm_number: AlarmNumber, message: impl Into<String>) -> Self {
        Self {
            kind,
            alarm_number,
            message: message.into(),
            at: Local::now(),
        }
    }
}

/// Bounded, so a consumer that falls behind holds up the producers instead
/// of letting events pile up without limit.
pub type EventSender = SyncSender<Event>;

/// Sends `event`, waiting while the buffer is full. Callers must not hold a
/// registry guard here unless the consumer never takes one.
///
/// A hung-up receiver only means nobody renders output any more (the
/// process is shutting down), so the event is dropped.
pub fn emit(sender: &EventSender, event: Event) {
    if let Err(e) = sender.send(event) {
        log::trace!("event receiver gone, dropped {:?}", e.0.kind);
    }
}
