//! Ordering and timeout assertions for E2E tests.

use std::future::Future;
use std::time::Duration;

use crate::helpers::tracker::EventTracker;

/// Upper bound for any single lifecycle call in these tests.
#[allow(dead_code)]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `fut`, panicking if it does not finish within [`DEFAULT_TIMEOUT`].
///
/// Used to prove that start/teardown never hang.
#[allow(dead_code)]
pub async fn within_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(DEFAULT_TIMEOUT, fut).await {
        Ok(output) => output,
        Err(_) => panic!("timed out after {:?}", DEFAULT_TIMEOUT),
    }
}

/// Assert that `first` was recorded before `second`.
///
/// # Panics
///
/// Panics if either entry is missing or the order is reversed.
#[allow(dead_code)]
pub fn assert_before(tracker: &EventTracker, first: &str, second: &str) {
    let entries = tracker.entries();
    let a = tracker
        .position(first)
        .unwrap_or_else(|| panic!("'{first}' not recorded: {entries:?}"));
    let b = tracker
        .position(second)
        .unwrap_or_else(|| panic!("'{second}' not recorded: {entries:?}"));
    assert!(a < b, "expected '{first}' before '{second}': {entries:?}");
}
