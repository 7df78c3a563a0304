//! Raw readers-writer locks.
//!
//! [`RawRwLock`] is the interface [`RwLock`](crate::RwLock) is built on, and
//! [`GateRwLock`] is the gate-based implementation of it.
use crate::{
    policy::{protocol::Gates, FairOrder, Policy, PolicyKind},
    util::fmt,
};

/// The four raw operations of a readers-writer lock.
///
/// [`RwLock`](crate::RwLock) pairs a `RawRwLock` with the data it protects,
/// and its guards are the safe way to call these methods. [`GateRwLock`] is
/// the implementation provided by this crate.
///
/// # Safety
///
/// An implementation must never admit an exclusive owner while any shared or
/// exclusive owner exists, and must never admit a shared owner while an
/// exclusive owner exists. `RwLock` hands out `&mut T` on the strength of
/// this.
pub unsafe trait RawRwLock {
    /// Whether guards over this lock may be sent to another thread. `()` if
    /// they may be.
    type GuardMarker;

    /// Blocks the current thread until it is admitted as a shared owner.
    fn lock_shared(&self);

    /// Attempts to become a shared owner without blocking.
    fn try_lock_shared(&self) -> bool;

    /// Gives up shared ownership.
    ///
    /// # Safety
    ///
    /// The caller must be a shared owner, admitted by a matching
    /// `lock_shared` or successful `try_lock_shared`.
    unsafe fn unlock_shared(&self);

    /// Blocks the current thread until it is admitted as the exclusive owner.
    fn lock_exclusive(&self);

    /// Attempts to become the exclusive owner without blocking.
    fn try_lock_exclusive(&self) -> bool;

    /// Gives up exclusive ownership.
    ///
    /// # Safety
    ///
    /// The caller must be the exclusive owner.
    unsafe fn unlock_exclusive(&self);

    /// Returns `true` if there is any owner.
    fn is_locked(&self) -> bool;

    /// Returns `true` if there is an exclusive owner.
    fn is_locked_exclusive(&self) -> bool;
}

/// A blocking [`RawRwLock`] built from four [`Gate`](crate::Gate)s, with the
/// order in which waiting readers and writers are admitted determined by an
/// admission [`Policy`].
///
/// A `GateRwLock` holds:
///
/// - the *resource gate*, closed while the lock is held, either by one writer
///   or collectively by all current readers;
/// - the *order gate*, an admission barrier in front of the resource gate
///   (used by [`WriterPriority`] and [`FairOrder`]);
/// - a count of current readers, and the *reader-count guard* gate
///   serializing updates to it;
/// - a count of waiting or active writers, and the *writer-count guard* gate
///   serializing updates to it (used by [`WriterPriority`]).
///
/// `GateRwLock` is a raw lock: it does not protect any data, and releasing it
/// is `unsafe`. Most code should use [`RwLock`](crate::RwLock), whose RAII
/// guards release the lock automatically.
///
/// # Examples
///
/// ```
/// use rwgate::{policy::ReaderPriority, GateRwLock, RawRwLock};
///
/// let lock = GateRwLock::with_policy(ReaderPriority);
///
/// lock.lock_shared();
/// lock.lock_shared();
/// assert_eq!(lock.reader_count(), 2);
/// assert!(!lock.try_lock_exclusive());
///
/// unsafe {
///     // Safety: two shared locks were acquired above.
///     lock.unlock_shared();
///     lock.unlock_shared();
/// }
///
/// assert!(lock.try_lock_exclusive());
/// unsafe {
///     // Safety: the exclusive lock was just acquired.
///     lock.unlock_exclusive();
/// }
/// ```
///
/// [`WriterPriority`]: crate::policy::WriterPriority
pub struct GateRwLock<P = FairOrder> {
    policy: P,
    gates: Gates,
}

impl GateRwLock {
    loom_const_fn! {
        /// Returns a new, unlocked `GateRwLock` using the [`FairOrder`]
        /// policy.
        #[must_use]
        pub fn new() -> Self {
            Self::with_policy(FairOrder)
        }
    }
}

impl<P: Policy> GateRwLock<P> {
    loom_const_fn! {
        /// Returns a new, unlocked `GateRwLock` using the given admission
        /// policy.
        #[must_use]
        pub fn with_policy(policy: P) -> Self {
            Self {
                policy,
                gates: Gates::new(),
            }
        }
    }

    /// Returns the admission policy this lock was constructed with.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Returns the number of readers that hold the lock or are in the middle
    /// of acquiring it.
    ///
    /// # Note
    ///
    /// This method is not synchronized with lock operations on other threads,
    /// and its value may become out of date as soon as it is read. This is
    /// **not** intended to be used for synchronization purposes! It is
    /// intended only for debugging purposes or for use as a heuristic.
    #[inline]
    #[must_use]
    pub fn reader_count(&self) -> usize {
        self.gates.reader_count()
    }

    /// Returns the number of writers that are waiting for or holding the
    /// lock. This is only tracked by the [`WriterPriority`] policy, and is
    /// always zero for the other policies.
    ///
    /// # Note
    ///
    /// Like [`reader_count`](Self::reader_count), this is only a heuristic.
    ///
    /// [`WriterPriority`]: crate::policy::WriterPriority
    #[inline]
    #[must_use]
    pub fn writer_count(&self) -> usize {
        self.gates.writer_count()
    }

    /// Returns `true` if the order gate is closed, meaning that newly arriving
    /// acquirers are queued behind an earlier one.
    ///
    /// Under [`WriterPriority`], this is the case while any writer is waiting
    /// or writing. Under [`FairOrder`], it is the case while an acquirer is
    /// waiting for the lock to be released. It is always `false` under
    /// [`ReaderPriority`].
    ///
    /// # Note
    ///
    /// Like [`reader_count`](Self::reader_count), this is only a heuristic.
    ///
    /// [`WriterPriority`]: crate::policy::WriterPriority
    /// [`ReaderPriority`]: crate::policy::ReaderPriority
    #[must_use]
    pub fn is_admission_blocked(&self) -> bool {
        !self.gates.order.is_open()
    }
}

unsafe impl<P: Policy> RawRwLock for GateRwLock<P> {
    type GuardMarker = ();

    #[cfg_attr(test, track_caller)]
    fn lock_shared(&self) {
        self.policy.lock_shared(&self.gates)
    }

    #[cfg_attr(test, track_caller)]
    fn try_lock_shared(&self) -> bool {
        test_dbg!(self.policy.try_lock_shared(&self.gates))
    }

    #[cfg_attr(test, track_caller)]
    unsafe fn unlock_shared(&self) {
        self.policy.unlock_shared(&self.gates)
    }

    #[cfg_attr(test, track_caller)]
    fn lock_exclusive(&self) {
        self.policy.lock_exclusive(&self.gates);
        self.gates.set_exclusive(true);
    }

    #[cfg_attr(test, track_caller)]
    fn try_lock_exclusive(&self) -> bool {
        let locked = test_dbg!(self.policy.try_lock_exclusive(&self.gates));
        if locked {
            self.gates.set_exclusive(true);
        }
        locked
    }

    #[cfg_attr(test, track_caller)]
    unsafe fn unlock_exclusive(&self) {
        // Cleared while the resource gate is still closed.
        self.gates.set_exclusive(false);
        self.policy.unlock_exclusive(&self.gates)
    }

    #[inline]
    fn is_locked(&self) -> bool {
        !self.gates.resource.is_open()
    }

    #[inline]
    fn is_locked_exclusive(&self) -> bool {
        self.gates.is_exclusive()
    }
}

impl<P: Policy + Default> Default for GateRwLock<P> {
    fn default() -> Self {
        Self::with_policy(P::default())
    }
}

impl<P: Policy> fmt::Debug for GateRwLock<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateRwLock")
            .field("policy", &self.policy)
            .field("gates", &self.gates)
            .finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::policy::{ReaderPriority, WriterPriority};

    fn each_policy(f: impl Fn(GateRwLock<PolicyKind>)) {
        for kind in PolicyKind::ALL {
            let _span = tracing::info_span!("policy", %kind).entered();
            f(GateRwLock::with_policy(kind));
        }
    }

    #[test]
    fn starts_unlocked() {
        let _trace = crate::util::test::trace_init();
        each_policy(|lock| {
            assert!(!lock.is_locked());
            assert!(!lock.is_locked_exclusive());
            assert!(!lock.is_admission_blocked());
            assert_eq!(lock.reader_count(), 0);
            assert_eq!(lock.writer_count(), 0);
        });
    }

    #[test]
    fn shared_locks_stack() {
        let _trace = crate::util::test::trace_init();
        each_policy(|lock| {
            lock.lock_shared();
            lock.lock_shared();
            assert!(lock.try_lock_shared());
            assert_eq!(lock.reader_count(), 3);
            assert!(lock.is_locked());
            assert!(!lock.is_locked_exclusive());
            assert!(!lock.try_lock_exclusive());

            unsafe {
                lock.unlock_shared();
                lock.unlock_shared();
            }
            assert_eq!(lock.reader_count(), 1);
            assert!(lock.is_locked());
            unsafe { lock.unlock_shared() }

            assert_eq!(lock.reader_count(), 0);
            assert!(!lock.is_locked());
        });
    }

    #[test]
    fn exclusive_excludes_everyone() {
        let _trace = crate::util::test::trace_init();
        each_policy(|lock| {
            lock.lock_exclusive();
            assert!(lock.is_locked_exclusive());
            assert!(!lock.try_lock_shared());
            assert!(!lock.try_lock_exclusive());
            assert_eq!(lock.reader_count(), 0);

            unsafe { lock.unlock_exclusive() }
            assert!(!lock.is_locked());
            assert!(!lock.is_admission_blocked());
            assert!(lock.try_lock_shared());
            unsafe { lock.unlock_shared() }
        });
    }

    #[test]
    fn writer_priority_counts_writers() {
        let _trace = crate::util::test::trace_init();
        let lock = GateRwLock::with_policy(WriterPriority);

        lock.lock_exclusive();
        assert_eq!(lock.writer_count(), 1);
        assert!(lock.is_admission_blocked());

        // A failed attempt must not leave a phantom writer behind.
        assert!(!lock.try_lock_exclusive());
        assert_eq!(lock.writer_count(), 1);

        unsafe { lock.unlock_exclusive() }
        assert_eq!(lock.writer_count(), 0);
        assert!(!lock.is_admission_blocked());

        lock.lock_shared();
        assert!(!lock.try_lock_exclusive());
        assert_eq!(lock.writer_count(), 0);
        assert!(!lock.is_admission_blocked());
        unsafe { lock.unlock_shared() }
    }

    #[test]
    fn reader_priority_never_blocks_admission() {
        let _trace = crate::util::test::trace_init();
        let lock = GateRwLock::with_policy(ReaderPriority);
        lock.lock_exclusive();
        assert!(!lock.is_admission_blocked());
        assert_eq!(lock.writer_count(), 0);
        unsafe { lock.unlock_exclusive() }
    }

    #[test]
    fn reports_policy() {
        assert_eq!(GateRwLock::new().policy(), PolicyKind::FairOrder);
        assert_eq!(
            GateRwLock::with_policy(ReaderPriority).policy(),
            PolicyKind::ReaderPriority
        );
        assert_eq!(
            GateRwLock::<WriterPriority>::default().policy(),
            PolicyKind::WriterPriority
        );
    }

    #[test]
    fn raw_lock_is_send_sync() {
        crate::util::test::assert_send_sync::<GateRwLock>();
        crate::util::test::assert_send_sync::<GateRwLock<PolicyKind>>();
    }
}
