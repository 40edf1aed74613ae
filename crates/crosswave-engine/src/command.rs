//! The unit of work the queue executes.

use std::fmt;
use std::time::Duration;

use crosswave_core::Origin;
use url::Url;

/// Predicate applied to an element's text during an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextExpectation {
    /// The text contains the given fragment.
    Contains(String),
    /// The text equals the given string exactly.
    Equals(String),
}

impl TextExpectation {
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    pub fn equals(text: impl Into<String>) -> Self {
        Self::Equals(text.into())
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Contains(fragment) => text.contains(fragment.as_str()),
            Self::Equals(expected) => text == expected,
        }
    }
}

impl fmt::Display for TextExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(fragment) => write!(f, "contains {:?}", fragment),
            Self::Equals(expected) => write!(f, "equals {:?}", expected),
        }
    }
}

/// An assertion against the current document: selector, predicate, and
/// optional per-assertion timing overrides. `None` timings fall back to the
/// executor defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertSpec {
    pub selector: String,
    pub expect: TextExpectation,
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

impl AssertSpec {
    pub fn new(selector: impl Into<String>, expect: TextExpectation) -> Self {
        Self {
            selector: selector.into(),
            expect,
            timeout: None,
            poll_interval: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }
}

/// An ordered unit of work. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the session's current document.
    Navigate { url: Url },
    /// Query the current document and require at least one match.
    Query { selector: String },
    /// Poll the current document until the predicate holds or time runs out.
    AssertText(AssertSpec),
    /// Run a sub-program inside the browsing context of another origin.
    RunInOrigin {
        origin: Origin,
        program: Vec<Command>,
    },
}

impl Command {
    pub fn navigate(url: Url) -> Self {
        Self::Navigate { url }
    }

    pub fn query(selector: impl Into<String>) -> Self {
        Self::Query {
            selector: selector.into(),
        }
    }

    pub fn assert_text(selector: impl Into<String>, expect: TextExpectation) -> Self {
        Self::AssertText(AssertSpec::new(selector, expect))
    }

    pub fn run_in_origin(origin: Origin, program: Vec<Command>) -> Self {
        Self::RunInOrigin { origin, program }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Navigate { .. } => CommandKind::Navigate,
            Self::Query { .. } => CommandKind::Query,
            Self::AssertText(_) => CommandKind::AssertText,
            Self::RunInOrigin { .. } => CommandKind::RunInOrigin,
        }
    }

    /// Human-readable label used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate { url } => format!("navigate {}", url),
            Self::Query { selector } => format!("query {:?}", selector),
            Self::AssertText(spec) => {
                format!("assert {:?} {}", spec.selector, spec.expect)
            }
            Self::RunInOrigin { origin, program } => {
                format!("run_in_origin {} ({} commands)", origin, program.len())
            }
        }
    }
}

/// Command kinds, for logging and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Navigate,
    Query,
    AssertText,
    RunInOrigin,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::Query => "query",
            Self::AssertText => "assert_text",
            Self::RunInOrigin => "run_in_origin",
        };
        f.write_str(name)
    }
}

/// What an executed command produced. Ownership passes to the caller as part
/// of the drain report.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Navigated {
        url: Url,
    },
    Matched {
        selector: String,
        count: usize,
    },
    AssertionHeld {
        observed: String,
        attempts: u32,
    },
    /// A boundary crossing completed; `executed` counts sub-program commands.
    CrossingReturned {
        origin: Origin,
        executed: usize,
    },
}
