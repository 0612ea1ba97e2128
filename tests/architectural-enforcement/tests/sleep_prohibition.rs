//! Integration Test: Sleep Prohibition
//!
//! **Policy**: production code MUST NOT sleep. The conductor is event
//! driven: completions arrive on a channel and the surface waits on it with
//! `tokio::select!`. Polling with `sleep()` hides ordering bugs and adds
//! latency.
//!
//! Tests are exempt; the integration tests use `tokio::sync::Notify` gates
//! instead of timing, so they should not need sleeps either.

use architectural_enforcement::{fail_on, rust_files, scan_file, scan_production};

fn is_sleep(text: &str) -> bool {
    let code = text.split("//").next().unwrap_or(text);
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<String> = scan_production()
        .iter()
        .filter(|line| is_sleep(&line.text))
        .map(|line| line.describe())
        .collect();

    fail_on(
        &violations,
        "sleep() calls found in production code",
        &[
            "Wait on channels or tokio::select! instead of polling",
            "Use Conductor::next_completion() to wait for backend replies",
        ],
    );
}

#[test]
fn test_no_sleep_in_conductor_integration_tests() {
    let violations: Vec<String> = rust_files("conductor/core/tests")
        .iter()
        .flat_map(|path| scan_file(path))
        .filter(|line| is_sleep(&line.text))
        .map(|line| line.describe())
        .collect();

    fail_on(
        &violations,
        "sleep() calls found in conductor integration tests",
        &["Gate the scripted backend with Notify and release it explicitly"],
    );
}
