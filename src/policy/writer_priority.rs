use super::{
    protocol::{Admission, Gates},
    WriterPriority,
};

// The first pending writer closes the order gate and the last departing
// writer reopens it. New readers must pass through the order gate, so they
// queue behind every writer that is waiting or writing. Readers admitted
// before the gate closed still finish normally: releasing a shared lock never
// touches the order gate.
impl Admission for WriterPriority {
    fn lock_shared(&self, gates: &Gates) {
        let _order = gates.order.acquire();
        let _guard = gates.readers_guard.acquire();
        gates.enter_readers();
        // `_guard` is dropped before `_order`.
    }

    fn try_lock_shared(&self, gates: &Gates) -> bool {
        let Some(_order) = gates.order.try_acquire() else {
            return false;
        };
        let Some(_guard) = gates.readers_guard.try_acquire() else {
            return false;
        };
        gates.try_enter_readers()
    }

    unsafe fn unlock_shared(&self, gates: &Gates) {
        gates.leave_readers();
    }

    fn lock_exclusive(&self, gates: &Gates) {
        {
            let _guard = gates.writers_guard.acquire();
            let writers = gates.enter_writers();
            if writers == 1 {
                test_debug!(writers, "first writer closing the order gate");
                gates.order.acquire_raw();
            }
        }
        gates.resource.acquire_raw();
    }

    fn try_lock_exclusive(&self, gates: &Gates) -> bool {
        // Unlike the blocking path, the writer count is only incremented once
        // the resource gate has been taken, so nothing needs to be undone on
        // failure.
        let Some(_guard) = gates.writers_guard.try_acquire() else {
            return false;
        };
        let first = gates.writer_count() == 0;
        if first && !gates.order.try_acquire_raw() {
            return false;
        }
        if !gates.resource.try_acquire_raw() {
            if first {
                gates.order.release_raw();
            }
            return false;
        }
        gates.enter_writers();
        true
    }

    unsafe fn unlock_exclusive(&self, gates: &Gates) {
        gates.resource.release_raw();
        let _guard = gates.writers_guard.acquire();
        let writers = gates.leave_writers();
        if writers == 0 {
            test_debug!("last writer reopening the order gate");
            gates.order.release_raw();
        }
    }
}
