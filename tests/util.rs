#![allow(dead_code)]

use std::{thread, time::Duration};

pub fn trace_init() {
    use tracing_subscriber::filter::LevelFilter;
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Yields until `cond` returns `true`, panicking if it takes unreasonably
/// long.
#[track_caller]
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    const TIMEOUT: Duration = Duration::from_secs(10);
    let start = std::time::Instant::now();
    while !cond() {
        assert!(start.elapsed() < TIMEOUT, "timed out waiting until {what}");
        thread::yield_now();
    }
    tracing::debug!("{what}");
}

/// Gives a thread that is about to block time to actually do so.
pub fn settle() {
    thread::sleep(Duration::from_millis(50));
}
