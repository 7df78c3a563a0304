use super::*;
use crate::util::test::assert_send_sync;

mod loom;


#[test]
fn lock_is_send_sync() {
    assert_send_sync::<RwLock<usize>>();
    assert_send_sync::<ReaderPriorityRwLock<usize>>();
    assert_send_sync::<WriterPriorityRwLock<usize>>();
    assert_send_sync::<RwLock<usize, GateRwLock<PolicyKind>>>();
}

#[test]
fn read_guard_is_send_sync() {
    assert_send_sync::<RwLockReadGuard<'_, usize>>();
}

#[test]
fn write_guard_is_send_sync() {
    assert_send_sync::<RwLockWriteGuard<'_, usize>>();
}
