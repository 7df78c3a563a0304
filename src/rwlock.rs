//! A blocking [readers-writer lock] protecting shared data.
//!
//! See the documentation for the [`RwLock`] type for more information.
//!
//! [readers-writer lock]: https://en.wikipedia.org/wiki/Readers%E2%80%93writer_lock
use crate::{
    loom::cell::{ConstPtr, MutPtr, UnsafeCell},
    policy::{FairOrder, Policy, PolicyKind, ReaderPriority, WriterPriority},
    raw::{GateRwLock, RawRwLock},
    util::fmt,
};
use core::{
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

#[cfg(test)]
mod tests;

/// A blocking [readers-writer lock].
///
/// This type of lock allows a number of readers or at most one writer at any
/// point in time. The write portion of this lock typically allows modification
/// of the underlying data (exclusive access) and the read portion of this lock
/// typically allows for read-only access (shared access).
///
/// Threads waiting for the lock are parked rather than spinning. The order in
/// which waiting readers and writers are admitted is determined by the
/// lock's admission [`Policy`]. By default, an `RwLock` uses the
/// [`FairOrder`] policy; use [`RwLock::with_policy`] to select another one:
///
/// ```
/// use rwgate::{policy::WriterPriority, RwLock};
///
/// let lock = RwLock::with_policy(vec![1, 2, 3], WriterPriority);
///
/// {
///     let r1 = lock.read();
///     let r2 = lock.read();
///     assert_eq!(r1.len(), 3);
///     assert_eq!(*r1, *r2);
/// } // read locks are dropped at this point
///
/// lock.write().push(4);
/// assert_eq!(*lock.read(), [1, 2, 3, 4]);
/// ```
///
/// The data can only be accessed through the RAII guards returned by
/// [`read`], [`try_read`], [`write`] and [`try_write`], so every acquisition
/// is paired with exactly one release, on every exit path.
///
/// # Poisoning
///
/// This lock is never poisoned. If a thread panics while holding a guard, the
/// guard is dropped during unwinding and the lock is released normally.
///
/// # Loom-specific behavior
///
/// When `cfg(loom)` is enabled, this lock will use Loom's simulated mutexes,
/// condition variables and atomics, and Loom's checked `UnsafeCell`.
///
/// [readers-writer lock]: https://en.wikipedia.org/wiki/Readers%E2%80%93writer_lock
/// [`read`]: RwLock::read
/// [`try_read`]: RwLock::try_read
/// [`write`]: RwLock::write
/// [`try_write`]: RwLock::try_write
pub struct RwLock<T: ?Sized, Lock = GateRwLock> {
    lock: Lock,
    data: UnsafeCell<T>,
}

/// An [`RwLock`] using the [`ReaderPriority`] policy.
pub type ReaderPriorityRwLock<T> = RwLock<T, GateRwLock<ReaderPriority>>;

/// An [`RwLock`] using the [`WriterPriority`] policy.
pub type WriterPriorityRwLock<T> = RwLock<T, GateRwLock<WriterPriority>>;

/// An [`RwLock`] using the [`FairOrder`] policy.
pub type FairRwLock<T> = RwLock<T, GateRwLock<FairOrder>>;

/// An RAII implementation of a "scoped read lock" of a [`RwLock`]. When this
/// structure is dropped (falls out of scope), the lock will be unlocked.
///
/// The data protected by the [`RwLock`] can be immutably accessed through this
/// guard via its [`Deref`] implementation.
///
/// This structure is created by the [`read`] and [`try_read`] methods on
/// [`RwLock`].
///
/// [`read`]: RwLock::read
/// [`try_read`]: RwLock::try_read
#[must_use = "if unused, the `RwLock` will immediately unlock"]
pub struct RwLockReadGuard<'lock, T: ?Sized, Lock: RawRwLock = GateRwLock> {
    ptr: ManuallyDrop<ConstPtr<T>>,
    lock: &'lock Lock,
    _marker: PhantomData<Lock::GuardMarker>,
}

/// An RAII implementation of a "scoped write lock" of a [`RwLock`]. When this
/// structure is dropped (falls out of scope), the lock will be unlocked.
///
/// The data protected by the [`RwLock`] can be mutably accessed through this
/// guard via its [`Deref`] and [`DerefMut`] implementations.
///
/// This structure is created by the [`write`] and [`try_write`] methods on
/// [`RwLock`].
///
/// [`write`]: RwLock::write
/// [`try_write`]: RwLock::try_write
#[must_use = "if unused, the `RwLock` will immediately unlock"]
pub struct RwLockWriteGuard<'lock, T: ?Sized, Lock: RawRwLock = GateRwLock> {
    ptr: ManuallyDrop<MutPtr<T>>,
    lock: &'lock Lock,
    _marker: PhantomData<Lock::GuardMarker>,
}

impl<T> RwLock<T> {
    loom_const_fn! {
        /// Creates a new, unlocked `RwLock<T>` protecting the provided `data`,
        /// using the [`FairOrder`] admission policy.
        ///
        /// # Examples
        ///
        /// ```
        /// use rwgate::RwLock;
        ///
        /// let lock = RwLock::new(5);
        /// # drop(lock);
        /// ```
        ///
        /// Outside of loom, this is a `const fn`, so it can be used to
        /// initialize a `static`:
        ///
        /// ```
        /// use rwgate::RwLock;
        ///
        /// static CONFIG: RwLock<Vec<String>> = RwLock::new(Vec::new());
        ///
        /// CONFIG.write().push(String::from("verbose"));
        /// assert_eq!(CONFIG.read().len(), 1);
        /// ```
        #[must_use]
        pub fn new(data: T) -> Self {
            Self {
                lock: GateRwLock::new(),
                data: UnsafeCell::new(data),
            }
        }
    }
}

impl<T, P: Policy> RwLock<T, GateRwLock<P>> {
    loom_const_fn! {
        /// Creates a new, unlocked `RwLock<T>` protecting the provided `data`,
        /// using the given admission [`Policy`].
        ///
        /// # Examples
        ///
        /// ```
        /// use rwgate::{policy::{PolicyKind, ReaderPriority}, RwLock};
        ///
        /// let lock = RwLock::with_policy(5, ReaderPriority);
        /// assert_eq!(lock.policy(), PolicyKind::ReaderPriority);
        /// ```
        #[must_use]
        pub fn with_policy(data: T, policy: P) -> Self {
            Self {
                lock: GateRwLock::with_policy(policy),
                data: UnsafeCell::new(data),
            }
        }
    }
}

impl<T, Lock: RawRwLock> RwLock<T, Lock> {
    /// Consumes this `RwLock`, returning the guarded data.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized, P: Policy> RwLock<T, GateRwLock<P>> {
    /// Returns the admission policy this lock was constructed with.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> PolicyKind {
        self.lock.policy()
    }

    /// Returns the current number of readers holding (or in the middle of
    /// acquiring) a read lock.
    ///
    /// # Note
    ///
    /// This method is not synchronized with attempts to increment the reader
    /// count, and its value may become out of date as soon as it is read. This
    /// is **not** intended to be used for synchronization purposes! It is
    /// intended only for debugging purposes or for use as a heuristic.
    #[inline]
    #[must_use]
    pub fn reader_count(&self) -> usize {
        self.lock.reader_count()
    }

    /// Returns the current number of writers waiting for or holding the
    /// write lock. See [`GateRwLock::writer_count`].
    #[inline]
    #[must_use]
    pub fn writer_count(&self) -> usize {
        self.lock.writer_count()
    }

    /// Returns `true` if newly arriving readers and writers are currently
    /// queued behind an earlier one. See
    /// [`GateRwLock::is_admission_blocked`].
    ///
    /// # Note
    ///
    /// This is **not** intended to be used for synchronization purposes! It
    /// is intended only for debugging purposes or for use as a heuristic.
    #[inline]
    #[must_use]
    pub fn is_admission_blocked(&self) -> bool {
        self.lock.is_admission_blocked()
    }
}

impl<T: ?Sized, Lock: RawRwLock> RwLock<T, Lock> {
    fn read_guard(&self) -> RwLockReadGuard<'_, T, Lock> {
        RwLockReadGuard {
            ptr: ManuallyDrop::new(self.data.get()),
            lock: &self.lock,
            _marker: PhantomData,
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, T, Lock> {
        RwLockWriteGuard {
            ptr: ManuallyDrop::new(self.data.get_mut()),
            lock: &self.lock,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the raw lock backing this `RwLock`.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &Lock {
        &self.lock
    }

    /// Locks this `RwLock` for shared read access, blocking the current thread
    /// until it can be acquired.
    ///
    /// There may be other readers currently inside the lock when this method
    /// returns. Whether this waits behind writers that are waiting for the
    /// lock depends on the lock's admission [`Policy`].
    ///
    /// Returns an RAII guard which will release this thread's shared access
    /// once it is dropped.
    ///
    /// # Deadlocks
    ///
    /// This lock is not re-entrant. Calling `read` while the current thread
    /// holds a write guard for the same lock will deadlock, and so may
    /// calling it while holding a read guard, if a writer is queued in
    /// between.
    #[cfg_attr(test, track_caller)]
    pub fn read(&self) -> RwLockReadGuard<'_, T, Lock> {
        self.lock.lock_shared();
        self.read_guard()
    }

    /// Attempts to acquire this `RwLock` for shared read access.
    ///
    /// If the access could not be granted at this time, this method returns
    /// [`None`]. Otherwise, [`Some`]`(`[`RwLockReadGuard`]`)` containing a RAII
    /// guard is returned. The shared access is released when it is dropped.
    ///
    /// This function does not block. It may fail even when the lock is
    /// available, if another thread is concurrently acquiring or releasing it.
    #[cfg_attr(test, track_caller)]
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T, Lock>> {
        if self.lock.try_lock_shared() {
            Some(self.read_guard())
        } else {
            None
        }
    }

    /// Locks this `RwLock` for exclusive write access, blocking the current
    /// thread until write access can be acquired.
    ///
    /// This function will not return while other writers or other readers
    /// currently have access to the lock.
    ///
    /// Returns an RAII guard which will drop the write access of this `RwLock`
    /// when dropped.
    ///
    /// # Deadlocks
    ///
    /// Calling `write` while the current thread holds any guard for the same
    /// lock will deadlock.
    #[cfg_attr(test, track_caller)]
    pub fn write(&self) -> RwLockWriteGuard<'_, T, Lock> {
        self.lock.lock_exclusive();
        self.write_guard()
    }

    /// Attempts to acquire this `RwLock` for exclusive write access.
    ///
    /// If the access could not be granted at this time, this method returns
    /// [`None`]. Otherwise, [`Some`]`(`[`RwLockWriteGuard`]`)` containing a
    /// RAII guard is returned. The write access is released when it is dropped.
    ///
    /// This function does not block. It may fail even when the lock is
    /// available, if another thread is concurrently acquiring or releasing it.
    #[cfg_attr(test, track_caller)]
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T, Lock>> {
        if self.lock.try_lock_exclusive() {
            Some(self.write_guard())
        } else {
            None
        }
    }

    /// Returns `true` if there is currently a writer holding a write lock.
    ///
    /// # Note
    ///
    /// This method is not synchronized its value may become out of date as soon
    /// as it is read. This is **not** intended to be used for synchronization
    /// purposes! It is intended only for debugging purposes or for use as a
    /// heuristic.
    #[inline]
    #[must_use]
    pub fn has_writer(&self) -> bool {
        self.lock.is_locked_exclusive()
    }

    /// Returns `true` if the lock is currently held by any reader or writer.
    ///
    /// # Note
    ///
    /// Like [`has_writer`](Self::has_writer), this is only a heuristic.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Returns a mutable reference to the underlying data.
    ///
    /// Since this call borrows the `RwLock` mutably, no actual locking needs to
    /// take place -- the mutable borrow statically guarantees no locks exist.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut lock = rwgate::RwLock::new(0);
    /// *lock.get_mut() = 10;
    /// assert_eq!(*lock.read(), 10);
    /// ```
    pub fn get_mut(&mut self) -> &mut T {
        unsafe {
            // Safety: since this call borrows the `RwLock` mutably, no actual
            // locking needs to take place -- the mutable borrow statically
            // guarantees no locks exist.
            self.data.with_mut(|data| &mut *data)
        }
    }
}

impl<T: Default, Lock: Default> Default for RwLock<T, Lock> {
    /// Creates a new `RwLock<T>`, with the `Default` value for T.
    fn default() -> RwLock<T, Lock> {
        RwLock {
            data: UnsafeCell::new(Default::default()),
            lock: Default::default(),
        }
    }
}

impl<T> From<T> for RwLock<T> {
    /// Creates a new instance of an `RwLock<T>` which is unlocked.
    /// This is equivalent to [`RwLock::new`].
    fn from(t: T) -> Self {
        RwLock::new(t)
    }
}

impl<T, Lock> fmt::Debug for RwLock<T, Lock>
where
    T: ?Sized + fmt::Debug,
    Lock: fmt::Debug + RawRwLock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock")
            .field("data", &fmt::opt(&self.try_read()).or_else("<locked>"))
            .field("lock", &self.lock)
            .finish()
    }
}

unsafe impl<T: ?Sized + Send, Lock: Send> Send for RwLock<T, Lock> {}
unsafe impl<T: ?Sized + Send + Sync, Lock: Sync> Sync for RwLock<T, Lock> {}

// === impl RwLockReadGuard ===

impl<T: ?Sized, Lock: RawRwLock> Deref for RwLockReadGuard<'_, T, Lock> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe {
            // Safety: a shared lock is held for as long as the guard lives.
            (*self.ptr).deref()
        }
    }
}

impl<T: ?Sized, Lock: RawRwLock> Drop for RwLockReadGuard<'_, T, Lock> {
    #[inline]
    #[cfg_attr(test, track_caller)]
    fn drop(&mut self) {
        unsafe {
            // Safety: the cell access must end before the next writer can be
            // admitted, and `ptr` is never touched again.
            ManuallyDrop::drop(&mut self.ptr);
            self.lock.unlock_shared()
        }
    }
}

impl<T, Lock> fmt::Debug for RwLockReadGuard<'_, T, Lock>
where
    T: ?Sized + fmt::Debug,
    Lock: RawRwLock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deref().fmt(f)
    }
}

impl<T, Lock> fmt::Display for RwLockReadGuard<'_, T, Lock>
where
    T: ?Sized + fmt::Display,
    Lock: RawRwLock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deref().fmt(f)
    }
}

// A read guard only hands out `&T`, so sharing or sending it is the same as
// sharing or sending a `&T` together with a `&Lock`.
unsafe impl<T, Lock> Sync for RwLockReadGuard<'_, T, Lock>
where
    T: ?Sized + Sync,
    Lock: RawRwLock + Sync,
{
}

unsafe impl<T, Lock> Send for RwLockReadGuard<'_, T, Lock>
where
    T: ?Sized + Sync,
    Lock: RawRwLock + Sync,
    Lock::GuardMarker: Send,
{
}

// === impl RwLockWriteGuard ===

impl<T: ?Sized, Lock: RawRwLock> Deref for RwLockWriteGuard<'_, T, Lock> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe {
            // Safety: the exclusive lock is held for as long as the guard
            // lives.
            &*(*self.ptr).deref()
        }
    }
}

impl<T: ?Sized, Lock: RawRwLock> DerefMut for RwLockWriteGuard<'_, T, Lock> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe {
            // Safety: the exclusive lock is held, and `&mut self` rules out
            // any other borrow through this guard.
            (*self.ptr).deref()
        }
    }
}

impl<T: ?Sized, Lock: RawRwLock> Drop for RwLockWriteGuard<'_, T, Lock> {
    #[inline]
    #[cfg_attr(test, track_caller)]
    fn drop(&mut self) {
        unsafe {
            // Safety: the cell access must end before anyone else can be
            // admitted, and `ptr` is never touched again.
            ManuallyDrop::drop(&mut self.ptr);
            self.lock.unlock_exclusive()
        }
    }
}

impl<T, Lock> fmt::Debug for RwLockWriteGuard<'_, T, Lock>
where
    T: ?Sized + fmt::Debug,
    Lock: RawRwLock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deref().fmt(f)
    }
}

impl<T, Lock> fmt::Display for RwLockWriteGuard<'_, T, Lock>
where
    T: ?Sized + fmt::Display,
    Lock: RawRwLock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deref().fmt(f)
    }
}

// A write guard can be used to move a `T` out with `mem::replace`, so `T`
// must be `Send` as well as `Sync` for the guard to cross threads.
unsafe impl<T, Lock> Send for RwLockWriteGuard<'_, T, Lock>
where
    T: ?Sized + Send + Sync,
    Lock: RawRwLock,
    Lock::GuardMarker: Send,
{
}

unsafe impl<T, Lock> Sync for RwLockWriteGuard<'_, T, Lock>
where
    T: ?Sized + Send + Sync,
    Lock: RawRwLock,
{
}
