use super::{
    protocol::{Admission, Gates},
    FairOrder,
};

// Every acquirer passes through the order gate, holding it only until it has
// either taken the resource gate (writers) or joined the current batch of
// readers. Admissions are therefore serialized in arrival order, while reads
// themselves still overlap.
impl Admission for FairOrder {
    fn lock_shared(&self, gates: &Gates) {
        let order = gates.order.acquire();
        let guard = gates.readers_guard.acquire();
        gates.enter_readers();
        // The order gate is released before the count guard.
        drop(order);
        drop(guard);
    }

    fn try_lock_shared(&self, gates: &Gates) -> bool {
        let Some(order) = gates.order.try_acquire() else {
            return false;
        };
        let Some(guard) = gates.readers_guard.try_acquire() else {
            return false;
        };
        let entered = gates.try_enter_readers();
        drop(order);
        drop(guard);
        entered
    }

    unsafe fn unlock_shared(&self, gates: &Gates) {
        gates.leave_readers();
    }

    fn lock_exclusive(&self, gates: &Gates) {
        let _order = gates.order.acquire();
        gates.resource.acquire_raw();
    }

    fn try_lock_exclusive(&self, gates: &Gates) -> bool {
        let Some(_order) = gates.order.try_acquire() else {
            return false;
        };
        gates.resource.try_acquire_raw()
    }

    unsafe fn unlock_exclusive(&self, gates: &Gates) {
        gates.resource.release_raw();
    }
}
