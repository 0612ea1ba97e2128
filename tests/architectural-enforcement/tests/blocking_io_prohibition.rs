//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async code in the conductor and the shell MUST NOT block the
//! runtime. Use `tokio::fs`, `tokio::io` and async `reqwest`.
//!
//! Blocking calls are tolerated in non-async functions that run before or
//! outside the event loop (config loading, logging setup) and in tests.

use architectural_enforcement::{fail_on, scan_production};

const ALWAYS_FORBIDDEN: &[&str] = &["reqwest::blocking", "std::net::", "std::process::Command"];

const FORBIDDEN_IN_ASYNC: &[&str] = &[
    "std::fs::",
    "std::io::stdin()",
    "std::io::stdout()",
    "std::io::Read",
    "std::io::Write",
    "File::open(",
];

#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();

    for line in scan_production() {
        let always = ALWAYS_FORBIDDEN.iter().any(|p| line.text.contains(p));
        let in_async = line.in_async_fn && FORBIDDEN_IN_ASYNC.iter().any(|p| line.text.contains(p));
        if always || in_async {
            violations.push(line.describe());
        }
    }

    fail_on(
        &violations,
        "Blocking I/O calls found in production code",
        &[
            "FORBIDDEN: reqwest::blocking, std::net, std::process::Command",
            "FORBIDDEN in async fns: std::fs, std::io::stdin()/stdout(), blocking Read/Write",
            "REQUIRED: tokio::io::stdin()/stdout(), tokio::fs, async reqwest",
            "ACCEPTABLE: non-async setup functions and test code",
        ],
    );
}

#[test]
fn test_shell_reads_stdin_asynchronously() {
    let uses_tokio_stdin = scan_production()
        .iter()
        .any(|line| line.path.ends_with("main.rs") && line.text.contains("tokio::io::stdin()"));
    assert!(
        uses_tokio_stdin,
        "the shell must read input through tokio::io::stdin()"
    );
}
