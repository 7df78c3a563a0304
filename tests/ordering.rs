//! Admission order of readers and writers under each policy.
#![cfg(not(loom))]

mod util;

use rwgate::{FairOrder, PolicyKind, ReaderPriority, RwLock, WriterPriority};
use std::{
    sync::{Arc, Mutex},
    thread,
};
use util::{settle, trace_init, wait_until};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn record(log: &Log, name: &'static str) {
    tracing::info!(name, "entered the lock");
    log.lock().unwrap().push(name);
}

#[test]
fn reader_priority_admits_readers_past_waiting_writer() {
    trace_init();
    let lock = Arc::new(RwLock::with_policy((), ReaderPriority));
    let log = Log::default();

    let r1 = lock.read();

    let writer = thread::spawn({
        let lock = lock.clone();
        let log = log.clone();
        move || {
            let _w = lock.write();
            record(&log, "W");
        }
    });
    settle();

    // The writer is waiting, but a new reader is still admitted at once.
    let r2 = lock.try_read().expect("reader should not queue behind a writer");
    assert_eq!(lock.reader_count(), 2);
    assert!(!lock.is_admission_blocked());
    assert!(log.lock().unwrap().is_empty());

    drop(r1);
    settle();
    assert!(log.lock().unwrap().is_empty(), "writer entered while a reader held the lock");

    drop(r2);
    writer.join().unwrap();
    assert_eq!(*log.lock().unwrap(), ["W"]);
    assert!(!lock.is_locked());
}

#[test]
fn writer_priority_queues_readers_behind_waiting_writer() {
    trace_init();
    let lock = Arc::new(RwLock::with_policy((), WriterPriority));
    let log = Log::default();

    let r1 = lock.read();

    let writer = thread::spawn({
        let lock = lock.clone();
        let log = log.clone();
        move || {
            let _w = lock.write();
            record(&log, "W");
        }
    });
    wait_until("the writer closed the order gate", || {
        lock.is_admission_blocked()
    });
    assert_eq!(lock.raw().writer_count(), 1);
    assert!(lock.try_read().is_none(), "reader admitted past a waiting writer");

    let reader = thread::spawn({
        let lock = lock.clone();
        let log = log.clone();
        move || {
            let _r = lock.read();
            record(&log, "R2");
        }
    });
    settle();
    assert!(log.lock().unwrap().is_empty());

    drop(r1);
    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(*log.lock().unwrap(), ["W", "R2"]);
    assert!(!lock.is_locked());
    assert!(!lock.is_admission_blocked());
    assert_eq!(lock.raw().writer_count(), 0);
}

#[test]
fn writer_priority_admitted_readers_finish() {
    trace_init();
    let lock = Arc::new(RwLock::with_policy(0, WriterPriority));

    let r1 = lock.read();
    let writer = thread::spawn({
        let lock = lock.clone();
        move || *lock.write() += 1
    });
    wait_until("the writer closed the order gate", || {
        lock.is_admission_blocked()
    });

    // Already admitted readers keep their access and may release normally.
    assert_eq!(*r1, 0);
    assert_eq!(lock.reader_count(), 1);
    drop(r1);

    writer.join().unwrap();
    assert_eq!(*lock.read(), 1);
}

#[test]
fn fair_order_admits_in_arrival_order() {
    trace_init();
    let lock = Arc::new(RwLock::with_policy((), FairOrder));
    let log = Log::default();

    let a = lock.write();

    let b = thread::spawn({
        let lock = lock.clone();
        let log = log.clone();
        move || {
            let _r = lock.read();
            record(&log, "B");
        }
    });
    wait_until("the reader is queued at the front", || {
        lock.is_admission_blocked()
    });

    let c = thread::spawn({
        let lock = lock.clone();
        let log = log.clone();
        move || {
            let _w = lock.write();
            record(&log, "C");
        }
    });
    settle();
    assert!(log.lock().unwrap().is_empty());

    drop(a);
    b.join().unwrap();
    c.join().unwrap();

    assert_eq!(*log.lock().unwrap(), ["B", "C"]);
    assert!(!lock.is_locked());
}

#[test]
fn fair_order_readers_behind_writer_wait() {
    trace_init();
    let lock = Arc::new(RwLock::with_policy(0, FairOrder));

    let r1 = lock.read();
    let writer = thread::spawn({
        let lock = lock.clone();
        move || *lock.write() += 1
    });
    wait_until("the writer is queued at the front", || {
        lock.is_admission_blocked()
    });

    // A reader arriving after the writer cannot overtake it.
    assert!(lock.try_read().is_none());

    let reader = thread::spawn({
        let lock = lock.clone();
        move || *lock.read()
    });
    settle();

    drop(r1);
    writer.join().unwrap();
    assert_eq!(reader.join().unwrap(), 1, "reader overtook the writer");
}

#[test]
fn has_writer_with_reader_queued() {
    trace_init();
    for policy in PolicyKind::ALL {
        let _span = tracing::info_span!("policy", %policy).entered();
        let lock = Arc::new(RwLock::with_policy(0, policy));

        let w = lock.write();
        let reader = thread::spawn({
            let lock = lock.clone();
            move || *lock.read()
        });

        if policy == PolicyKind::WriterPriority {
            // The reader waits at the order gate without registering.
            settle();
        } else {
            wait_until("the reader registered and is waiting", || {
                lock.reader_count() == 1
            });
        }
        assert!(lock.has_writer(), "{policy}: writer not reported");
        assert!(lock.is_locked());

        drop(w);
        assert_eq!(reader.join().unwrap(), 0);
        assert!(!lock.has_writer(), "{policy}: writer still reported");
    }
}
