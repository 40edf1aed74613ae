//! Command failure kinds and diagnostic chains.

use crosswave_core::Origin;
use thiserror::Error;
use url::Url;

/// Terminal failure of a single command.
///
/// Every kind aborts the enclosing queue's drain; only the retry engine
/// retries, and only assertion predicates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailure { url: Url, reason: String },

    #[error("assertion timed out after {waited_ms} ms: expected {predicate}, last observed {last_observed:?}")]
    AssertionTimeout {
        predicate: String,
        last_observed: Option<String>,
        waited_ms: u64,
    },

    #[error("document replaced while an assertion was pending")]
    StaleContext,

    #[error(
        "origin mismatch: crossing requested {requested}, current context is {}",
        .actual.as_ref().map(|origin| origin.to_string()).unwrap_or_else(|| "no document".to_string())
    )]
    OriginMismatch {
        requested: Origin,
        actual: Option<Origin>,
    },

    #[error("query {selector:?} failed: {reason}")]
    QueryFailure { selector: String, reason: String },

    #[error("boundary crossing failed: {reason}")]
    BridgeFailure { reason: String },

    #[error("cancelled")]
    Cancelled,
}

/// One failed command, with the chain of nested failures behind it.
///
/// A failed boundary crossing carries the sub-program's diagnostic in
/// `nested`; the error kind itself is relayed unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Position of the failed command in its queue.
    pub command_index: usize,
    /// Human-readable command label.
    pub command: String,
    pub error: CommandError,
    pub nested: Option<Box<Diagnostic>>,
}

impl Diagnostic {
    pub fn new(command_index: usize, command: impl Into<String>, error: CommandError) -> Self {
        Self {
            command_index,
            command: command.into(),
            error,
            nested: None,
        }
    }

    pub fn with_nested(mut self, nested: Diagnostic) -> Self {
        self.nested = Some(Box::new(nested));
        self
    }

    /// Render the full chain, outermost first, one frame per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut frame = Some(self);
        let mut depth = 0;
        while let Some(diag) = frame {
            if depth > 0 {
                out.push('\n');
                out.push_str(&"  ".repeat(depth));
                out.push_str("caused by: ");
            }
            out.push_str(&format!(
                "command[{}] {}: {}",
                diag.command_index, diag.command, diag.error
            ));
            frame = diag.nested.as_deref();
            depth += 1;
        }
        out
    }
}

/// Terminal outcome of a queue, a crossing, or a whole test.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(Diagnostic),
    Cancelled,
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Failed(diag) => Some(diag),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_render_single_frame() {
        let diag = Diagnostic::new(
            2,
            "query \"h1\"",
            CommandError::QueryFailure {
                selector: "h1".into(),
                reason: "no elements matched".into(),
            },
        );
        assert_eq!(
            diag.render(),
            "command[2] query \"h1\": query \"h1\" failed: no elements matched"
        );
    }

    #[test]
    fn test_diagnostic_render_nested_chain() {
        let inner = Diagnostic::new(0, "assert \"h1\"", CommandError::StaleContext);
        let outer = Diagnostic::new(
            1,
            "run_in_origin https://docs.example:443 (1 commands)",
            CommandError::StaleContext,
        )
        .with_nested(inner);

        let rendered = outer.render();
        assert!(rendered.starts_with("command[1] run_in_origin"));
        assert!(rendered.contains("\n  caused by: command[0] assert \"h1\""));
    }

    #[test]
    fn test_origin_mismatch_message_without_document() {
        let err = CommandError::OriginMismatch {
            requested: Origin::parse("http://site-c:80").unwrap(),
            actual: None,
        };
        assert!(err.to_string().contains("no document"));
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(Outcome::Passed.is_passed());
        assert!(!Outcome::Cancelled.is_passed());
        assert!(Outcome::Passed.diagnostic().is_none());
    }
}
