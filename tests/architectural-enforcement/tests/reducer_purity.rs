//! Integration Test: Reducer Purity
//!
//! The state machine (`reduce` and the types it touches) must stay a pure
//! function of state and event so it can be tested without a runtime and
//! replayed deterministically. Only `conductor.rs` and `backend/` may talk
//! to tokio or the network.

use architectural_enforcement::{contains_token, fail_on, scan_file, workspace_root};

const PURE_MODULES: &[&str] = &[
    "conductor/core/src/events.rs",
    "conductor/core/src/feedback.rs",
    "conductor/core/src/messages.rs",
    "conductor/core/src/pagination.rs",
    "conductor/core/src/reducer.rs",
    "conductor/core/src/session.rs",
    "conductor/core/src/state.rs",
    "conductor/core/src/view.rs",
];

const IMPURE: &[&str] = &[
    "tokio::",
    "reqwest",
    ".await",
    "async fn",
    "Instant::now",
    "SystemTime",
    "Utc::now",
    "Local::now",
    "thread_rng",
    "std::env::",
];

#[test]
fn test_state_machine_is_pure() {
    let mut violations = Vec::new();

    for module in PURE_MODULES {
        let path = workspace_root().join(module);
        assert!(path.exists(), "missing module: {module}");

        for line in scan_file(&path) {
            if line.in_test {
                continue;
            }
            if IMPURE.iter().any(|needle| contains_token(&line.text, needle)) {
                violations.push(line.describe());
            }
        }
    }

    fail_on(
        &violations,
        "Runtime, clock or network access found in the state machine",
        &[
            "Return an Effect from reduce() and let the Conductor perform it",
            "Feed results back in as a Completion event",
        ],
    );
}
