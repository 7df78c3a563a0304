use super::*;
use crate::loom::{
    self,
    sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc,
    },
    thread,
};

fn model(f: impl Fn() + Sync + Send + 'static) {
    let mut builder = loom::model::Builder::new();
    if builder.preemption_bound.is_none() {
        builder.preemption_bound = Some(2);
    }
    builder.check(f)
}

/// Increments `readers` while a read guard is held and checks that no
/// writer is inside the lock at the same time.
fn reader<P: Policy>(lock: &RwLock<(AtomicUsize, AtomicUsize), GateRwLock<P>>) {
    let guard = lock.read();
    let (ref readers, ref writers) = *guard;
    readers.fetch_add(1, SeqCst);
    assert_eq!(writers.load(SeqCst), 0, "a writer overlapped a reader");
    readers.fetch_sub(1, SeqCst);
}

fn writer<P: Policy>(lock: &RwLock<(AtomicUsize, AtomicUsize), GateRwLock<P>>) {
    let guard = lock.write();
    let (ref readers, ref writers) = *guard;
    let prev = writers.fetch_add(1, SeqCst);
    assert_eq!(prev, 0, "two writers overlapped");
    assert_eq!(readers.load(SeqCst), 0, "a reader overlapped a writer");
    writers.fetch_sub(1, SeqCst);
}

fn new_lock<P: Policy>(policy: P) -> Arc<RwLock<(AtomicUsize, AtomicUsize), GateRwLock<P>>> {
    Arc::new(RwLock::with_policy(
        (AtomicUsize::new(0), AtomicUsize::new(0)),
        policy,
    ))
}

fn reader_and_writer<P: Policy + Copy + Send + Sync + 'static>(policy: P) {
    model(move || {
        let lock = new_lock(policy);

        let t1 = thread::spawn({
            let lock = lock.clone();
            move || writer(&*lock)
        });

        reader(&*lock);
        t1.join().unwrap();

        assert!(!lock.is_locked());
        assert_eq!(lock.reader_count(), 0);
        assert!(!lock.is_admission_blocked());
    })
}

fn two_writers<P: Policy + Copy + Send + Sync + 'static>(policy: P) {
    model(move || {
        let lock = new_lock(policy);

        let t1 = thread::spawn({
            let lock = lock.clone();
            move || writer(&*lock)
        });

        writer(&*lock);
        t1.join().unwrap();

        assert!(!lock.is_locked());
        assert_eq!(lock.raw().writer_count(), 0);
    })
}

fn two_readers<P: Policy + Copy + Send + Sync + 'static>(policy: P) {
    model(move || {
        let lock = new_lock(policy);

        let t1 = thread::spawn({
            let lock = lock.clone();
            move || reader(&*lock)
        });

        reader(&*lock);
        t1.join().unwrap();

        assert!(!lock.is_locked());
        assert_eq!(lock.reader_count(), 0);
    })
}

#[test]
fn reader_priority_reader_and_writer() {
    reader_and_writer(ReaderPriority);
}

#[test]
fn writer_priority_reader_and_writer() {
    reader_and_writer(WriterPriority);
}

#[test]
fn fair_order_reader_and_writer() {
    reader_and_writer(FairOrder);
}

#[test]
fn reader_priority_two_writers() {
    two_writers(ReaderPriority);
}

#[test]
fn writer_priority_two_writers() {
    two_writers(WriterPriority);
}

#[test]
fn fair_order_two_writers() {
    two_writers(FairOrder);
}

#[test]
fn reader_priority_two_readers() {
    two_readers(ReaderPriority);
}

#[test]
fn writer_priority_two_readers() {
    two_readers(WriterPriority);
}

#[test]
fn fair_order_two_readers() {
    two_readers(FairOrder);
}

#[test]
fn runtime_policy_reader_and_writer() {
    for kind in PolicyKind::ALL {
        reader_and_writer(kind);
    }
}

#[test]
fn try_write_fails_while_reading() {
    model(|| {
        let lock = new_lock(FairOrder);
        let read = lock.read();

        let t1 = thread::spawn({
            let lock = lock.clone();
            move || {
                let guard = lock.try_write();
                guard.is_none()
            }
        });

        assert!(t1.join().unwrap(), "try_write succeeded while a reader held the lock");
        drop(read);
        assert!(lock.try_write().is_some());
    })
}

// Each guard's access to the data cell has to end before the lock admits the
// next owner.
#[test]
fn writers_hand_off_data() {
    for kind in PolicyKind::ALL {
        model(move || {
            let lock = Arc::new(RwLock::with_policy(0usize, kind));

            let t1 = thread::spawn({
                let lock = lock.clone();
                move || *lock.write() += 1
            });

            *lock.write() += 1;
            t1.join().unwrap();

            assert_eq!(*lock.read(), 2);
        })
    }
}

#[test]
fn reader_sees_complete_write() {
    for kind in PolicyKind::ALL {
        model(move || {
            let lock = Arc::new(RwLock::with_policy((0usize, 0usize), kind));

            let t1 = thread::spawn({
                let lock = lock.clone();
                move || {
                    let mut guard = lock.write();
                    guard.0 += 1;
                    guard.1 += 1;
                }
            });

            let (a, b) = *lock.read();
            assert_eq!(a, b, "reader saw a partial write");
            t1.join().unwrap();
        })
    }
}
