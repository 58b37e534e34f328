//! Reader-preferring gate built from two plain mutexes.
//!
//! Readers are counted under a short-hold mutex. The first reader to arrive
//! takes the exclusive lock on behalf of every reader that follows, and the
//! last reader to leave gives it back. Writers take the exclusive lock
//! directly. A steady stream of overlapping readers can keep a writer
//! waiting indefinitely; writes here are rare next to reads, so that is
//! accepted.
//!
//! The exclusive lock is not a `std::sync::Mutex` because the thread that
//! releases it on behalf of the readers is whichever one leaves last, which
//! is usually not the one that acquired it.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Condvar, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::error::fatal;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex
        .lock()
        .unwrap_or_else(|e| fatal(&format!("lock {what}"), e))
}

/// Binary lock that any thread may release.
#[derive(Debug, Default)]
struct ExclusiveLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl ExclusiveLock {
    fn acquire(&self) {
        let mut held = lock(&self.held, "exclusive lock");
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|e| fatal("wait for exclusive lock", e));
        }
        *held = true;
    }

    fn release(&self) {
        let mut held = lock(&self.held, "exclusive lock");
        debug_assert!(*held, "released an exclusive lock nobody holds");
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}

/// Owns a value and hands out shared or exclusive access to it under the
/// first-reader-in / last-reader-out protocol.
///
/// The value sits in an `RwLock` so each guard can borrow it safely. The
/// gate protocol already keeps writers away from readers, so taking that
/// lock never waits.
pub struct Gate<T> {
    active_readers: Mutex<usize>,
    exclusive: ExclusiveLock,
    value: RwLock<T>,
}

impl<T> Gate<T> {
    pub fn new(value: T) -> Self {
        Self {
            active_readers: Mutex::new(0),
            exclusive: ExclusiveLock::default(),
            value: RwLock::new(value),
        }
    }

    /// Blocks until no writer holds the gate, then grants shared access.
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.enter_read();
        let pass = ReaderPass { gate: self };
        let value = self
            .value
            .read()
            .unwrap_or_else(|e| fatal("read gated value", e));
        ReadGuard { value, _pass: pass }
    }

    /// Blocks until neither readers nor another writer hold the gate.
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.enter_write();
        let pass = WriterPass { gate: self };
        let value = self
            .value
            .write()
            .unwrap_or_else(|e| fatal("write gated value", e));
        WriteGuard { value, _pass: pass }
    }

    /// Number of readers currently inside the gate.
    pub fn active_readers(&self) -> usize {
        *lock(&self.active_readers, "reader count")
    }

    pub fn into_inner(self) -> T {
        self.value
            .into_inner()
            .unwrap_or_else(|e| fatal("take gated value", e))
    }

    fn enter_read(&self) {
        let mut readers = lock(&self.active_readers, "reader count");
        *readers += 1;
        if *readers == 1 {
            // still holding the count, so later readers queue behind us
            // until the writer is gone
            self.exclusive.acquire();
        }
    }

    fn exit_read(&self) {
        let mut readers = lock(&self.active_readers, "reader count");
        *readers -= 1;
        if *readers == 0 {
            self.exclusive.release();
        }
    }

    fn enter_write(&self) {
        self.exclusive.acquire();
    }

    fn exit_write(&self) {
        self.exclusive.release();
    }
}

impl<T: Default> Default for Gate<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("active_readers", &self.active_readers())
            .finish_non_exhaustive()
    }
}

/// Leaves the gate as a reader when dropped.
struct ReaderPass<'a, T> {
    gate: &'a Gate<T>,
}

impl<T> Drop for ReaderPass<'_, T> {
    fn drop(&mut self) {
        self.gate.exit_read();
    }
}

/// Leaves the gate as the writer when dropped.
struct WriterPass<'a, T> {
    gate: &'a Gate<T>,
}

impl<T> Drop for WriterPass<'_, T> {
    fn drop(&mut self) {
        self.gate.exit_write();
    }
}

/// Shared access to a gated value. Dropping the last one open releases
/// waiting writers.
// fields drop in order: the value borrow ends before the gate is left
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct ReadGuard<'a, T> {
    value: RwLockReadGuard<'a, T>,
    _pass: ReaderPass<'a, T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Exclusive access to a gated value.
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct WriteGuard<'a, T> {
    value: RwLockWriteGuard<'a, T>,
    _pass: WriterPass<'a, T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
