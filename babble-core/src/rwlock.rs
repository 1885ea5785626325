//! A hand-rolled writer-preferring reader/writer lock.
//!
//! `std::sync::RwLock`'s starvation policy is platform-dependent (on Linux it
//! is backed by `pthread_rwlock_t` in its default, *reader*-preferring mode),
//! so it cannot be relied on to satisfy `spec.md` §4.A's requirement that a
//! waiting writer blocks all new readers. This is the same primitive the
//! original C server reaches for (`pthread_rwlock_t`) generalized into an
//! explicit, portable policy, per the re-implementation note in `spec.md` §9.
//!
//! The turnstile (mutex + two condvars) only ever guards the reader/writer
//! bookkeeping; the protected value lives in an `UnsafeCell` and is exposed
//! through RAII guards, mirroring how `std::sync::RwLock` itself is built.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

struct Turnstile {
    active_readers: u32,
    writer_active: bool,
    waiting_writers: u32,
}

/// A reader/writer lock where a pending writer blocks all new readers.
pub struct WriterPreferringLock<T> {
    turnstile: Mutex<Turnstile>,
    readers_may_proceed: Condvar,
    lock_is_free: Condvar,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is only ever granted through `ReadGuard`/`WriteGuard`,
// whose construction is gated by the turnstile's mutual exclusion. Multiple
// `ReadGuard`s can hand out `&T` to different threads at once, so `T` must
// already be `Sync` for that to be sound -- same bound `std::sync::RwLock` uses.
unsafe impl<T: Send> Send for WriterPreferringLock<T> {}
unsafe impl<T: Send + Sync> Sync for WriterPreferringLock<T> {}

impl<T> WriterPreferringLock<T> {
    pub fn new(value: T) -> Self {
        WriterPreferringLock {
            turnstile: Mutex::new(Turnstile {
                active_readers: 0,
                writer_active: false,
                waiting_writers: 0,
            }),
            readers_may_proceed: Condvar::new(),
            lock_is_free: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquire the lock for reading. Blocks while a writer holds the lock or
    /// while any writer is waiting, so a read-heavy workload cannot starve a
    /// writer indefinitely.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut gate = self.turnstile.lock().unwrap_or_else(|p| p.into_inner());
        while gate.writer_active || gate.waiting_writers > 0 {
            gate = self
                .readers_may_proceed
                .wait(gate)
                .unwrap_or_else(|p| p.into_inner());
        }
        gate.active_readers += 1;
        ReadGuard { lock: self }
    }

    /// Acquire the lock for writing. Mutually exclusive with readers and with
    /// other writers.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut gate = self.turnstile.lock().unwrap_or_else(|p| p.into_inner());
        gate.waiting_writers += 1;
        while gate.writer_active || gate.active_readers > 0 {
            gate = self
                .lock_is_free
                .wait(gate)
                .unwrap_or_else(|p| p.into_inner());
        }
        gate.waiting_writers -= 1;
        gate.writer_active = true;
        WriteGuard { lock: self }
    }
}

pub struct ReadGuard<'a, T> {
    lock: &'a WriterPreferringLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding a ReadGuard means no WriteGuard exists concurrently.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut gate = self
            .lock
            .turnstile
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        gate.active_readers -= 1;
        let last_reader = gate.active_readers == 0;
        drop(gate);
        if last_reader {
            self.lock.lock_is_free.notify_all();
        }
    }
}

pub struct WriteGuard<'a, T> {
    lock: &'a WriterPreferringLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: holding a WriteGuard means no other guard exists concurrently.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut gate = self
            .lock
            .turnstile
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        gate.writer_active = false;
        drop(gate);
        // Wake both: a waiting writer re-checks `waiting_writers`/`writer_active`
        // itself, so waking readers here cannot let them jump ahead of it.
        self.lock.lock_is_free.notify_all();
        self.lock.readers_may_proceed.notify_all();
    }
}
