//! Core types for check results.

use serde::{Deserialize, Serialize};

use crate::ir::Position;

/// Which obligation an allocation site failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakKind {
    /// The tracked stream is never provably closed.
    UnclosedBody,
    /// Strict mode: never provably both closed and consumed.
    UnconsumedBody,
}

impl LeakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakKind::UnclosedBody => "response body must be closed",
            LeakKind::UnconsumedBody => "response body must be closed and consumed",
        }
    }
}

impl std::fmt::Display for LeakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single leak report at an allocation site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub position: Position,
    pub kind: LeakKind,
}

impl Diagnostic {
    pub fn message(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Results of one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Number of function bodies scanned. Functions deferring the close
    /// obligation to their caller and external declarations are not
    /// counted.
    pub scanned: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn leak_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Serialize the result as JSON for host drivers.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leak_kind_messages() {
        assert_eq!(LeakKind::UnclosedBody.as_str(), "response body must be closed");
        assert_eq!(
            LeakKind::UnconsumedBody.to_string(),
            "response body must be closed and consumed"
        );
    }

    #[test]
    fn test_result_counters() {
        let mut result = CheckResult::new();
        assert!(result.is_clean());

        result.add(Diagnostic {
            file: "client.go".to_string(),
            position: Position::new(10, 2),
            kind: LeakKind::UnclosedBody,
        });
        assert_eq!(result.leak_count(), 1);
        assert!(!result.is_clean());
    }

    #[test]
    fn test_result_serializes_to_json() {
        let mut result = CheckResult::new();
        result.scanned = 3;
        result.add(Diagnostic {
            file: "client.go".to_string(),
            position: Position::new(10, 2),
            kind: LeakKind::UnconsumedBody,
        });

        let json = result.to_json().unwrap();
        assert!(json.contains("unconsumed_body"));
        assert!(json.contains("client.go"));

        let parsed: CheckResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.diagnostics, result.diagnostics);
        assert_eq!(parsed.scanned, 3);
    }
}
