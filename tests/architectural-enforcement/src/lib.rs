//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No blocking I/O inside async code
//! - No sleep() calls in production code
//! - The state reducer stays free of runtime and network code
//!
//! The helpers here walk the workspace sources line by line. They are
//! heuristics, not a parser: good enough to catch regressions early.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "conductor/shell/src"];

/// Workspace root (two levels above this package)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// One non-comment source line with its surrounding context
#[derive(Debug)]
pub struct SourceLine {
    /// File the line came from, relative to the workspace root
    pub path: String,
    /// 1-based line number
    pub number: usize,
    /// Line text, trimmed
    pub text: String,
    /// Inside a `#[cfg(test)]` module or a test function
    pub in_test: bool,
    /// The nearest enclosing function is `async`
    pub in_async_fn: bool,
}

impl SourceLine {
    /// `path:line - text` for violation reports
    pub fn describe(&self) -> String {
        format!("{}:{} - {}", self.path, self.number, self.text)
    }
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    assert!(root.exists(), "source directory missing: {}", root.display());

    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Every non-comment line of one file, annotated with context
pub fn scan_file(path: &Path) -> Vec<SourceLine> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let display = path
        .strip_prefix(workspace_root())
        .unwrap_or(path)
        .display()
        .to_string();

    let mut lines = Vec::new();
    let mut in_test_module = false;
    let mut pending_test_attr = false;
    let mut in_test_fn = false;
    let mut in_async_fn = false;

    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();

        if text.starts_with("#[cfg(test)]") {
            in_test_module = true;
        }
        if text.starts_with("#[test]") || text.starts_with("#[tokio::test") {
            pending_test_attr = true;
        }
        if let Some(signature) = fn_signature(text) {
            in_async_fn = signature.contains("async fn");
            in_test_fn = pending_test_attr;
            pending_test_attr = false;
        }

        if text.is_empty() || text.starts_with("//") {
            continue;
        }
        lines.push(SourceLine {
            path: display.clone(),
            number: idx + 1,
            text: text.to_string(),
            in_test: in_test_module || in_test_fn,
            in_async_fn,
        });
    }
    lines
}

/// Every production line across [`PRODUCTION_DIRS`]
pub fn scan_production() -> Vec<SourceLine> {
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_files(dir))
        .flat_map(|path| scan_file(&path))
        .filter(|line| !line.in_test)
        .collect()
}

/// Whether `text` contains `needle`
///
/// A needle ending in an identifier character must not be followed by
/// another one, so `.await` does not match `.awaiting`.
pub fn contains_token(text: &str, needle: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    if !needle.chars().last().is_some_and(is_ident) {
        return text.contains(needle);
    }
    text.match_indices(needle).any(|(at, _)| {
        text[at + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident(c))
    })
}

/// Report violations and fail the test if there are any
pub fn fail_on(violations: &[String], headline: &str, guidance: &[&str]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {headline}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!();
    for line in guidance {
        eprintln!("  {line}");
    }
    panic!(
        "\nFound {} violation(s): {headline}\nFix these before merging!",
        violations.len()
    );
}

fn fn_signature(text: &str) -> Option<&str> {
    let body = text
        .trim_start_matches("pub(crate) ")
        .trim_start_matches("pub ");
    (body.starts_with("fn ") || body.starts_with("async fn ")).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_token_respects_boundaries() {
        assert!(contains_token("client.send().await?;", ".await"));
        assert!(contains_token("x.await", ".await"));
        assert!(!contains_token("state.awaiting_refresh = true;", ".await"));
        assert!(contains_token("use tokio::sync::mpsc;", "tokio::"));
    }

    #[test]
    fn test_fn_signature() {
        assert!(fn_signature("pub async fn run(&mut self) {").is_some());
        assert!(fn_signature("fn helper() -> u32 {").is_some());
        assert!(fn_signature("let f = fnord;").is_none());
    }

    #[test]
    fn test_production_dirs_exist() {
        for dir in PRODUCTION_DIRS {
            assert!(!rust_files(dir).is_empty(), "no sources in {dir}");
        }
    }
}
