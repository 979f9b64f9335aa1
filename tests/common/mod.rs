//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod observers;

use signal_relay::{encode, EncodedMessage, ObserverMailbox, ParameterName, ParameterValue};
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound for anything a test waits on
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Encode a pair, panicking on an out-of-range value
pub fn encoded(name: ParameterName, value: i64) -> EncodedMessage {
    encode(name, ParameterValue::new(value).expect("test value in range"))
}

/// Pump `mailbox` until `count` updates were processed or the timeout hits
///
/// Returns the number of updates processed.
pub fn pump_until(mailbox: &ObserverMailbox, count: usize, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    let mut processed = 0;
    while processed < count && Instant::now() < deadline {
        match mailbox.process_next(Duration::from_millis(10)) {
            Ok(true) => processed += 1,
            Ok(false) => {}
            Err(_) => break,
        }
    }
    processed
}

/// Wait until `condition` holds, panicking after [`test_timeout`]
pub fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = Instant::now() + test_timeout();
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}
