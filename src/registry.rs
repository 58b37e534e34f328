//! The shared, number-ordered list of alarm entries.
//!
//! Entries live in a slab arena and are addressed by [`EntryId`]; the list
//! order is kept as a vector of ids sorted by alarm number. Every operation
//! here assumes the caller already holds the right kind of access through
//! the [`Registry`] gate: `&AlarmList` for inspection, `&mut AlarmList` for
//! structural changes.

use std::fmt;

use slab::Slab;

use crate::{
    alarm::{AlarmEntry, AlarmKind, AlarmNumber, Liveness},
    gate::{Gate, ReadGuard, WriteGuard},
};

/// Stable handle to an entry.
///
/// The serial is unique per insertion, so a handle to an unlinked entry
/// never resolves to whatever entry later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    slot: usize,
    serial: u64,
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.slot, self.serial)
    }
}

/// What [`AlarmList::insert_or_replace`] did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// a new standard alarm was linked
    Inserted(EntryId),
    /// an existing standard alarm took over the new content in place
    Replaced(EntryId),
    /// a cancellation marker was linked
    CancellationQueued(EntryId),
    /// no standard alarm with that number exists
    NothingToCancel,
    /// a cancellation for that number is already pending
    DuplicateCancellation,
}

/// An entry the dispatcher has taken responsibility for.
#[derive(Debug, Clone)]
pub struct Claim {
    pub id: EntryId,
    pub kind: AlarmKind,
    pub number: AlarmNumber,
    pub message: String,
    pub liveness: Liveness,
}

// two claims are the same claim when they name the same entry
impl PartialEq for Claim {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Claim {}

/// The pair unlinked by [`AlarmList::remove_matched_pair`].
#[derive(Debug)]
pub struct RemovedPair {
    pub cancellation: AlarmEntry,
    pub standard: Option<AlarmEntry>,
}

#[derive(Debug, Default)]
pub struct AlarmList {
    entries: Slab<AlarmEntry>,
    order: Vec<EntryId>,
    next_serial: u64,
}

impl AlarmList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&AlarmEntry> {
        self.entries
            .get(id.slot)
            .filter(|entry| entry.serial == id.serial)
    }

    /// Linked entries in list order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &AlarmEntry)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.get(id).map(|entry| (id, entry)))
    }

    /// Numbers of the linked entries in list order.
    #[must_use]
    pub fn numbers(&self) -> Vec<AlarmNumber> {
        self.iter().map(|(_, entry)| entry.number).collect()
    }

    #[must_use]
    pub fn find(&self, kind: AlarmKind, number: AlarmNumber) -> Option<EntryId> {
        self.iter()
            .find(|(_, entry)| entry.kind == kind && entry.number == number)
            .map(|(id, _)| id)
    }

    /// Links `entry`, folds it into an existing standard alarm, or rejects
    /// it, depending on its kind and what is already linked.
    pub fn insert_or_replace(&mut self, entry: AlarmEntry) -> InsertOutcome {
        match entry.kind {
            AlarmKind::Standard => {
                if let Some(id) = self.find(AlarmKind::Standard, entry.number) {
                    // `find` only returns ids that resolve
                    if let Some(existing) = self.entries.get_mut(id.slot) {
                        existing.replace_with(entry);
                    }
                    InsertOutcome::Replaced(id)
                } else {
                    InsertOutcome::Inserted(self.link(entry))
                }
            }
            AlarmKind::Cancellation => {
                if self.find(AlarmKind::Standard, entry.number).is_none() {
                    InsertOutcome::NothingToCancel
                } else if self.find(AlarmKind::Cancellation, entry.number).is_some() {
                    InsertOutcome::DuplicateCancellation
                } else {
                    InsertOutcome::CancellationQueued(self.link(entry))
                }
            }
        }
    }

    /// Claims the first unprocessed entry in list order.
    ///
    /// Runs under shared access, so several scanners may race over the same
    /// entries. The claim itself is an atomic test-and-clear, which keeps
    /// delivery at most once per entry no matter how many scanners run.
    #[must_use]
    pub fn scan_for_unprocessed(&self) -> Option<Claim> {
        self.iter()
            .find(|(_, entry)| entry.claim())
            .map(|(id, entry)| Claim {
                id,
                kind: entry.kind,
                number: entry.number,
                message: entry.message.clone(),
                liveness: entry.liveness(),
            })
    }

    /// Unlinks the cancellation marker `cancellation` together with the
    /// standard alarm carrying the same number.
    ///
    /// Both leave the list before the caller gives up exclusive access, so a
    /// notifier never sees one without the other. Returns `None` when
    /// `cancellation` no longer resolves.
    pub fn remove_matched_pair(&mut self, cancellation: EntryId) -> Option<RemovedPair> {
        let cancellation = self.unlink(cancellation)?;
        let standard = self
            .find(AlarmKind::Standard, cancellation.number)
            .and_then(|id| self.unlink(id));
        Some(RemovedPair {
            cancellation,
            standard,
        })
    }

    /// Inserts before the first entry whose number is not smaller, keeping
    /// the list in non-decreasing order.
    fn link(&mut self, mut entry: AlarmEntry) -> EntryId {
        entry.serial = self.next_serial;
        self.next_serial += 1;
        let number = entry.number;
        let serial = entry.serial;
        let slot = self.entries.insert(entry);
        let id = EntryId { slot, serial };
        let position = self
            .order
            .partition_point(|&linked| self.entries[linked.slot].number < number);
        self.order.insert(position, id);
        id
    }

    fn unlink(&mut self, id: EntryId) -> Option<AlarmEntry> {
        let position = self.order.iter().position(|&linked| linked == id)?;
        self.order.remove(position);
        let entry = self.entries.remove(id.slot);
        entry.unlink();
        Some(entry)
    }
}

/// The process-wide alarm list behind its reader/writer gate.
#[derive(Debug, Default)]
pub struct Registry {
    gate: Gate<AlarmList>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access for traversal, scanning and notifier checks.
    pub fn read(&self) -> ReadGuard<'_, AlarmList> {
        self.gate.read()
    }

    /// Exclusive access for insertion, replacement and removal.
    pub fn write(&self) -> WriteGuard<'_, AlarmList> {
        self.gate.write()
    }
}

// production requests go through `Intake`, which also reports and wakes
#[cfg(test)]
impl Registry {
    pub(crate) fn submit(&self, request: crate::alarm::AlarmRequest) -> InsertOutcome {
        self.write().insert_or_replace(AlarmEntry::new(request))
    }
}
