#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(docsrs, loom)))]
#![warn(missing_docs, missing_debug_implementations)]

pub(crate) mod loom;

#[macro_use]
mod util;

pub mod gate;
pub mod policy;
pub mod raw;
pub mod rwlock;

#[doc(inline)]
pub use self::gate::{Gate, GatePermit};
#[doc(inline)]
pub use self::policy::{
    FairOrder, ParsePolicyError, Policy, PolicyKind, ReaderPriority, WriterPriority,
};
#[doc(inline)]
pub use self::raw::{GateRwLock, RawRwLock};
#[doc(inline)]
pub use self::rwlock::{
    FairRwLock, ReaderPriorityRwLock, RwLock, RwLockReadGuard, RwLockWriteGuard,
    WriterPriorityRwLock,
};
