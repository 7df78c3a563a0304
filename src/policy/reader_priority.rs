use super::{
    protocol::{Admission, Gates},
    ReaderPriority,
};

// The resource gate is held from the moment the first reader arrives until
// the last one leaves. Writers wait on the resource gate with no queue of
// their own, so a steady stream of readers can keep them out forever.
impl Admission for ReaderPriority {
    fn lock_shared(&self, gates: &Gates) {
        let _guard = gates.readers_guard.acquire();
        gates.enter_readers();
    }

    fn try_lock_shared(&self, gates: &Gates) -> bool {
        let Some(_guard) = gates.readers_guard.try_acquire() else {
            return false;
        };
        gates.try_enter_readers()
    }

    unsafe fn unlock_shared(&self, gates: &Gates) {
        gates.leave_readers();
    }

    fn lock_exclusive(&self, gates: &Gates) {
        gates.resource.acquire_raw();
    }

    fn try_lock_exclusive(&self, gates: &Gates) -> bool {
        gates.resource.try_acquire_raw()
    }

    unsafe fn unlock_exclusive(&self, gates: &Gates) {
        gates.resource.release_raw();
    }
}
