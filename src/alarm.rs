use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Duration, Local};

/// External identity of an alarm, shared by its create, replace and cancel
/// requests.
pub type AlarmNumber = u32;

/// Longest message an alarm keeps, in bytes.
pub const MAX_MESSAGE_LEN: usize = 63;

/// Message carried by every cancellation request.
pub const CANCEL_MESSAGE: &str = "Cancel command";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    /// creates or updates a recurring notification
    Standard,
    /// asks for the standard alarm with the same number to be removed
    Cancellation,
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "alarm"),
            Self::Cancellation => write!(f, "cancellation"),
        }
    }
}

/// A request that has already been parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRequest {
    pub kind: AlarmKind,
    pub number: AlarmNumber,
    /// seconds between displays, zero for cancellations
    pub interval: u64,
    pub message: String,
}

impl AlarmRequest {
    /// The message is cut down to [`MAX_MESSAGE_LEN`] bytes.
    #[must_use]
    pub fn standard(number: AlarmNumber, interval: u64, message: &str) -> Self {
        Self {
            kind: AlarmKind::Standard,
            number,
            interval,
            message: truncate_message(message).to_owned(),
        }
    }

    #[must_use]
    pub fn cancel(number: AlarmNumber) -> Self {
        Self {
            kind: AlarmKind::Cancellation,
            number,
            interval: 0,
            message: CANCEL_MESSAGE.to_owned(),
        }
    }
}

/// Longest prefix of `message` that fits in [`MAX_MESSAGE_LEN`] bytes
/// without splitting a character.
#[must_use]
pub fn truncate_message(message: &str) -> &str {
    if message.len() <= MAX_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Whether an entry is still reachable from the registry.
///
/// The registry flips the token when it unlinks the entry; a notifier keeps
/// a clone and polls it once per cycle, which is its only stop signal.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn linked() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn unlink(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One node of the registry.
#[derive(Debug)]
pub struct AlarmEntry {
    pub(crate) number: AlarmNumber,
    pub(crate) kind: AlarmKind,
    pub(crate) interval: u64,
    pub(crate) due: DateTime<Local>,
    pub(crate) message: String,
    pub(crate) modified: bool,
    unprocessed: AtomicBool,
    liveness: Liveness,
    pub(crate) serial: u64,
}

impl AlarmEntry {
    #[must_use]
    pub fn new(request: AlarmRequest) -> Self {
        Self {
            number: request.number,
            kind: request.kind,
            interval: request.interval,
            due: due_after(request.interval),
            message: request.message,
            modified: false,
            unprocessed: AtomicBool::new(true),
            liveness: Liveness::linked(),
            serial: 0,
        }
    }

    #[must_use]
    pub const fn number(&self) -> AlarmNumber {
        self.number
    }

    #[must_use]
    pub const fn kind(&self) -> AlarmKind {
        self.kind
    }

    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    #[must_use]
    pub const fn due(&self) -> DateTime<Local> {
        self.due
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub fn is_unprocessed(&self) -> bool {
        self.unprocessed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.liveness.is_linked()
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Clears the unprocessed flag, returning whether this call was the one
    /// that cleared it.
    ///
    /// Callers only hold shared access while scanning, so the flag is a
    /// test-and-clear on an atomic: of any number of racing claimers exactly
    /// one sees `true`.
    pub(crate) fn claim(&self) -> bool {
        self.unprocessed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Overwrites the content with `request`'s and marks the entry modified.
    pub(crate) fn replace_with(&mut self, request: Self) {
        self.message = request.message;
        self.interval = request.interval;
        self.due = request.due;
        self.modified = true;
    }

    pub(crate) fn unlink(&self) {
        self.liveness.unlink();
    }
}

fn due_after(interval: u64) -> DateTime<Local> {
    let now = Local::now();
    i64::try_from(interval)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(now)
}
