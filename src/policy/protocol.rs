use crate::{
    gate::Gate,
    loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering::Relaxed},
    util::fmt,
};

/// The fixed state shared by every admission policy: four gates and two
/// counters.
///
/// `readers` is only modified while `readers_guard` is held, and `writers`
/// only while `writers_guard` is held. The counters are atomics so that
/// diagnostics can read them without taking a guard; the guard gate's mutex
/// orders every modification, so relaxed accesses are sufficient.
///
/// `exclusive` is only written by the exclusive owner, and is only read for
/// diagnostics.
pub struct Gates {
    /// Admission barrier. Closed by pending writers (writer priority) or held
    /// briefly by every acquirer while it enqueues (fair order).
    pub(crate) order: Gate,
    /// Closed while readers collectively, or one writer, own the lock.
    pub(crate) resource: Gate,
    pub(crate) readers_guard: Gate,
    pub(crate) writers_guard: Gate,
    readers: AtomicUsize,
    writers: AtomicUsize,
    exclusive: AtomicBool,
}

/// The acquire/release algorithms of an admission policy.
///
/// This trait is sealed: it is only reachable through the
/// [`Policy`](super::Policy) trait and cannot be implemented outside this
/// crate.
pub trait Admission {
    fn lock_shared(&self, gates: &Gates);

    fn try_lock_shared(&self, gates: &Gates) -> bool;

    /// # Safety
    ///
    /// A shared lock must be held in the current context.
    unsafe fn unlock_shared(&self, gates: &Gates);

    fn lock_exclusive(&self, gates: &Gates);

    fn try_lock_exclusive(&self, gates: &Gates) -> bool;

    /// # Safety
    ///
    /// An exclusive lock must be held in the current context.
    unsafe fn unlock_exclusive(&self, gates: &Gates);
}

impl Gates {
    loom_const_fn! {
        pub(crate) fn new() -> Self {
            Self {
                order: Gate::new(),
                resource: Gate::new(),
                readers_guard: Gate::new(),
                writers_guard: Gate::new(),
                readers: AtomicUsize::new(0),
                writers: AtomicUsize::new(0),
                exclusive: AtomicBool::new(false),
            }
        }
    }

    #[inline]
    pub(crate) fn reader_count(&self) -> usize {
        self.readers.load(Relaxed)
    }

    #[inline]
    pub(crate) fn writer_count(&self) -> usize {
        self.writers.load(Relaxed)
    }

    /// Returns `true` while a writer owns the resource gate. A reader that
    /// has registered but is still waiting for the resource gate does not
    /// affect this.
    #[inline]
    pub(crate) fn is_exclusive(&self) -> bool {
        self.exclusive.load(Relaxed)
    }

    /// Must only be called by the exclusive owner: with `true` once it has
    /// been admitted, and with `false` before it releases the resource gate.
    #[inline]
    pub(crate) fn set_exclusive(&self, exclusive: bool) {
        let prev = self.exclusive.swap(exclusive, Relaxed);
        debug_assert_ne!(prev, exclusive, "exclusive ownership flag out of sync");
    }

    /// Registers a reader, closing the resource gate if it is the first one.
    ///
    /// `readers_guard` must be held.
    pub(crate) fn enter_readers(&self) {
        let readers = self.readers.fetch_add(1, Relaxed) + 1;
        if readers == 1 {
            test_debug!(readers, "first reader waiting for the resource gate");
            self.resource.acquire_raw();
            test_debug!(readers, "first reader closed the resource gate");
        }
    }

    /// Like [`Gates::enter_readers`], but fails instead of waiting if the
    /// first reader would have to wait for the resource gate.
    ///
    /// `readers_guard` must be held.
    pub(crate) fn try_enter_readers(&self) -> bool {
        if self.readers.load(Relaxed) == 0 && !self.resource.try_acquire_raw() {
            return false;
        }
        self.readers.fetch_add(1, Relaxed);
        true
    }

    /// Deregisters a reader, reopening the resource gate if it was the last
    /// one. This is the release-shared path of every policy.
    pub(crate) fn leave_readers(&self) {
        let _guard = self.readers_guard.acquire();
        let prev = self.readers.fetch_sub(1, Relaxed);
        debug_assert_ne!(prev, 0, "released a shared lock that was not held");
        if prev == 1 {
            test_debug!("last reader reopening the resource gate");
            self.resource.release_raw();
        }
    }

    /// Registers a pending writer, returning the new writer count.
    ///
    /// `writers_guard` must be held.
    pub(crate) fn enter_writers(&self) -> usize {
        self.writers.fetch_add(1, Relaxed) + 1
    }

    /// Deregisters a writer, returning the new writer count.
    ///
    /// `writers_guard` must be held.
    pub(crate) fn leave_writers(&self) -> usize {
        let prev = self.writers.fetch_sub(1, Relaxed);
        debug_assert_ne!(prev, 0, "released an exclusive lock that was not held");
        prev - 1
    }
}

impl fmt::Debug for Gates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gates")
            .field("readers", &self.reader_count())
            .field("writers", &self.writer_count())
            .field("exclusive", &self.is_exclusive())
            .field("order_open", &self.order.is_open())
            .field("resource_open", &self.resource.is_open())
            .finish()
    }
}
