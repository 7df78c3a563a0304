//! Admission policies for [`GateRwLock`](crate::GateRwLock).
//!
//! A policy decides the order in which readers and writers waiting for a
//! [`GateRwLock`] are admitted. Three are provided:
//!
//! - [`ReaderPriority`]: readers never wait for a writer that has not yet
//!   acquired the lock. Maximizes read throughput, but a continuous stream of
//!   overlapping readers can starve writers indefinitely.
//! - [`WriterPriority`]: once a writer starts waiting, newly arriving readers
//!   queue behind it (and behind any writer that arrives while it waits).
//!   Readers that were already admitted finish normally. Readers can starve
//!   under a continuous stream of writers.
//! - [`FairOrder`]: readers and writers are admitted in the order they
//!   arrive. Consecutive readers are still admitted together and read
//!   concurrently. Neither class starves.
//!
//! Each policy is a zero-sized type, so a lock whose policy is fixed at
//! compile time pays nothing to dispatch on it. When the policy is only known
//! at runtime (e.g. read from a configuration file), [`PolicyKind`] selects
//! one of the three with a `match` on every operation:
//!
//! ```
//! use rwgate::{policy::PolicyKind, RwLock};
//!
//! let policy: PolicyKind = "writer-priority".parse().unwrap();
//! let lock = RwLock::with_policy(0usize, policy);
//! assert_eq!(lock.policy(), PolicyKind::WriterPriority);
//! *lock.write() += 1;
//! assert_eq!(*lock.read(), 1);
//! ```
//!
//! [`GateRwLock`]: crate::GateRwLock
use crate::util::fmt;
use core::str::FromStr;
use protocol::Admission;

mod fair_order;
pub(crate) mod protocol;
mod reader_priority;
mod writer_priority;

/// An admission policy for a [`GateRwLock`](crate::GateRwLock).
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait Policy: protocol::Admission + fmt::Debug {
    /// Returns which of the three policies this is.
    fn kind(&self) -> PolicyKind;
}

/// Readers are admitted whenever no writer holds the lock.
///
/// See the [module-level documentation](crate::policy) for details.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ReaderPriority;

/// Newly arriving readers wait while any writer is waiting or writing.
///
/// See the [module-level documentation](crate::policy) for details.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct WriterPriority;

/// Readers and writers are admitted in arrival order.
///
/// This is the default policy.
///
/// See the [module-level documentation](crate::policy) for details.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct FairOrder;

/// A policy chosen at runtime.
///
/// `PolicyKind` implements [`Policy`] itself, dispatching every lock
/// operation to the selected policy. It can be parsed from (and displayed
/// as) one of the names `"reader-priority"`, `"writer-priority"` and
/// `"fair"`. Parsing is case-insensitive and also accepts a few aliases:
///
/// | policy                       | accepted names                                          |
/// |------------------------------|---------------------------------------------------------|
/// | [`PolicyKind::ReaderPriority`] | `reader-priority`, `reader_priority`, `readers`       |
/// | [`PolicyKind::WriterPriority`] | `writer-priority`, `writer_priority`, `writers`       |
/// | [`PolicyKind::FairOrder`]      | `fair`, `fair-order`, `fair_order`, `fifo`            |
///
/// # Examples
///
/// ```
/// use rwgate::policy::PolicyKind;
///
/// assert_eq!("Readers".parse::<PolicyKind>(), Ok(PolicyKind::ReaderPriority));
/// assert_eq!(PolicyKind::FairOrder.to_string(), "fair");
/// assert!("lifo".parse::<PolicyKind>().is_err());
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PolicyKind {
    /// [`ReaderPriority`].
    ReaderPriority,
    /// [`WriterPriority`].
    WriterPriority,
    /// [`FairOrder`].
    #[default]
    FairOrder,
}

/// The error returned when parsing a [`PolicyKind`] from an unrecognized
/// string.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error(
    "unknown lock policy {input:?} (expected \"reader-priority\", \"writer-priority\", or \"fair\")"
)]
pub struct ParsePolicyError {
    input: String,
}

impl Policy for ReaderPriority {
    #[inline]
    fn kind(&self) -> PolicyKind {
        PolicyKind::ReaderPriority
    }
}

impl Policy for WriterPriority {
    #[inline]
    fn kind(&self) -> PolicyKind {
        PolicyKind::WriterPriority
    }
}

impl Policy for FairOrder {
    #[inline]
    fn kind(&self) -> PolicyKind {
        PolicyKind::FairOrder
    }
}

// === impl PolicyKind ===

impl PolicyKind {
    /// All three policies.
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::ReaderPriority,
        PolicyKind::WriterPriority,
        PolicyKind::FairOrder,
    ];

    /// Returns the canonical name of this policy, as accepted by
    /// [`str::parse`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReaderPriority => "reader-priority",
            Self::WriterPriority => "writer-priority",
            Self::FairOrder => "fair",
        }
    }
}

impl Policy for PolicyKind {
    #[inline]
    fn kind(&self) -> PolicyKind {
        *self
    }
}

impl Admission for PolicyKind {
    fn lock_shared(&self, gates: &protocol::Gates) {
        match self {
            Self::ReaderPriority => ReaderPriority.lock_shared(gates),
            Self::WriterPriority => WriterPriority.lock_shared(gates),
            Self::FairOrder => FairOrder.lock_shared(gates),
        }
    }

    fn try_lock_shared(&self, gates: &protocol::Gates) -> bool {
        match self {
            Self::ReaderPriority => ReaderPriority.try_lock_shared(gates),
            Self::WriterPriority => WriterPriority.try_lock_shared(gates),
            Self::FairOrder => FairOrder.try_lock_shared(gates),
        }
    }

    unsafe fn unlock_shared(&self, gates: &protocol::Gates) {
        match self {
            Self::ReaderPriority => ReaderPriority.unlock_shared(gates),
            Self::WriterPriority => WriterPriority.unlock_shared(gates),
            Self::FairOrder => FairOrder.unlock_shared(gates),
        }
    }

    fn lock_exclusive(&self, gates: &protocol::Gates) {
        match self {
            Self::ReaderPriority => ReaderPriority.lock_exclusive(gates),
            Self::WriterPriority => WriterPriority.lock_exclusive(gates),
            Self::FairOrder => FairOrder.lock_exclusive(gates),
        }
    }

    fn try_lock_exclusive(&self, gates: &protocol::Gates) -> bool {
        match self {
            Self::ReaderPriority => ReaderPriority.try_lock_exclusive(gates),
            Self::WriterPriority => WriterPriority.try_lock_exclusive(gates),
            Self::FairOrder => FairOrder.try_lock_exclusive(gates),
        }
    }

    unsafe fn unlock_exclusive(&self, gates: &protocol::Gates) {
        match self {
            Self::ReaderPriority => ReaderPriority.unlock_exclusive(gates),
            Self::WriterPriority => WriterPriority.unlock_exclusive(gates),
            Self::FairOrder => FairOrder.unlock_exclusive(gates),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: &[(&str, PolicyKind)] = &[
            ("reader-priority", PolicyKind::ReaderPriority),
            ("reader_priority", PolicyKind::ReaderPriority),
            ("readers", PolicyKind::ReaderPriority),
            ("writer-priority", PolicyKind::WriterPriority),
            ("writer_priority", PolicyKind::WriterPriority),
            ("writers", PolicyKind::WriterPriority),
            ("fair", PolicyKind::FairOrder),
            ("fair-order", PolicyKind::FairOrder),
            ("fair_order", PolicyKind::FairOrder),
            ("fifo", PolicyKind::FairOrder),
        ];

        let name = s.trim();
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
            .ok_or_else(|| ParsePolicyError {
                input: s.to_owned(),
            })
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl From<ReaderPriority> for PolicyKind {
    fn from(_: ReaderPriority) -> Self {
        Self::ReaderPriority
    }
}

impl From<WriterPriority> for PolicyKind {
    fn from(_: WriterPriority) -> Self {
        Self::WriterPriority
    }
}

impl From<FairOrder> for PolicyKind {
    fn from(_: FairOrder) -> Self {
        Self::FairOrder
    }
}

// === impl ParsePolicyError ===

impl ParsePolicyError {
    /// Returns the string that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}
