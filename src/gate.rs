//! A binary semaphore ("gate") that blocks the calling thread.
//!
//! A [`Gate`] is a counting semaphore with a capacity of one. It is either
//! *open* (one permit available) or *closed* (the permit is held). Acquiring
//! a closed gate parks the calling thread on a condition variable until the
//! holder releases it; releasing wakes exactly one parked thread, if there is
//! one.
//!
//! Gates are the only synchronization primitive the readers-writer locks in
//! this crate are built from. See [`GateRwLock`](crate::GateRwLock) for how
//! four of them are combined.
use crate::{
    loom::sync::{Condvar, Mutex, MutexGuard},
    util::fmt,
};
use std::sync::PoisonError;

/// A blocking binary semaphore.
///
/// A `Gate` starts out open. [`acquire`] closes it, blocking until it is open
/// first if necessary, and returns a [`GatePermit`] that reopens the gate when
/// dropped.
///
/// # Fairness
///
/// When several threads are blocked on the same gate, a release wakes one of
/// them. Which one is up to the platform's condition variable; no FIFO order
/// is promised, and a thread calling [`acquire`] just after a release may
/// take the gate before the woken thread does.
///
/// # Poisoning
///
/// A `Gate` is never poisoned. The gate's internal mutex is only held while
/// its count is read or written, so a panic elsewhere cannot leave the count
/// inconsistent.
///
/// # Examples
///
/// ```
/// use rwgate::Gate;
///
/// let gate = Gate::new();
/// let permit = gate.acquire();
/// assert!(!gate.is_open());
/// assert!(gate.try_acquire().is_none());
///
/// drop(permit);
/// assert!(gate.is_open());
/// ```
///
/// [`acquire`]: Gate::acquire
pub struct Gate {
    avail: Mutex<usize>,
    waiters: Condvar,
}

/// An RAII permit for a closed [`Gate`]. When this structure is dropped, the
/// gate is released.
///
/// This structure is created by the [`acquire`] and [`try_acquire`] methods
/// on [`Gate`].
///
/// [`acquire`]: Gate::acquire
/// [`try_acquire`]: Gate::try_acquire
#[must_use = "if unused, the `Gate` will immediately reopen"]
pub struct GatePermit<'gate> {
    gate: &'gate Gate,
}

impl Gate {
    loom_const_fn! {
        /// Returns a new, open `Gate`.
        #[must_use]
        pub fn new() -> Self {
            Self {
                avail: Mutex::new(1),
                waiters: Condvar::new(),
            }
        }
    }

    /// Closes this gate, blocking the current thread until it is open.
    ///
    /// Returns an RAII permit which reopens the gate when dropped.
    #[cfg_attr(test, track_caller)]
    pub fn acquire(&self) -> GatePermit<'_> {
        self.acquire_raw();
        GatePermit { gate: self }
    }

    /// Attempts to close this gate without blocking.
    ///
    /// Returns [`None`] if the gate is currently closed.
    #[cfg_attr(test, track_caller)]
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        if self.try_acquire_raw() {
            Some(GatePermit { gate: self })
        } else {
            None
        }
    }

    /// Returns `true` if the gate is currently open.
    ///
    /// # Note
    ///
    /// This is a snapshot. The gate may be closed or reopened by another
    /// thread as soon as this method returns, so it must not be used for
    /// synchronization.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.lock_avail() > 0
    }

    /// Closes the gate without producing a permit. The caller becomes
    /// responsible for a matching [`Gate::release_raw`].
    #[cfg_attr(test, track_caller)]
    pub(crate) fn acquire_raw(&self) {
        let mut avail = self.lock_avail();
        while *avail == 0 {
            trace!(gate = ?fmt::ptr(self), "Gate::acquire: closed, waiting...");
            avail = self
                .waiters
                .wait(avail)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *avail -= 1;
        trace!(gate = ?fmt::ptr(self), "Gate::acquire: closed the gate");
    }

    #[cfg_attr(test, track_caller)]
    pub(crate) fn try_acquire_raw(&self) -> bool {
        let mut avail = self.lock_avail();
        if test_dbg!(*avail) == 0 {
            return false;
        }
        *avail -= 1;
        true
    }

    /// Reopens the gate and wakes one waiting thread.
    ///
    /// Must be paired with a previous [`Gate::acquire_raw`] or successful
    /// [`Gate::try_acquire_raw`].
    #[cfg_attr(test, track_caller)]
    pub(crate) fn release_raw(&self) {
        {
            let mut avail = self.lock_avail();
            debug_assert_eq!(*avail, 0, "released a gate that was already open");
            *avail += 1;
        }
        trace!(gate = ?fmt::ptr(self), "Gate::release: reopened, waking one waiter");
        self.waiters.notify_one();
    }

    fn lock_avail(&self) -> MutexGuard<'_, usize> {
        self.avail.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("open", &self.is_open())
            .finish()
    }
}

// === impl GatePermit ===

impl GatePermit<'_> {
    /// Returns the [`Gate`] this permit was acquired from.
    #[must_use]
    pub fn gate(&self) -> &Gate {
        self.gate
    }
}

impl Drop for GatePermit<'_> {
    #[inline]
    #[cfg_attr(test, track_caller)]
    fn drop(&mut self) {
        self.gate.release_raw();
    }
}

impl fmt::Debug for GatePermit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatePermit")
            .field("gate", self.gate)
            .finish()
    }
}
