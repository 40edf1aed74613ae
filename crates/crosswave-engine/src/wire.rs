//! Serialized boundary-crossing format.
//!
//! Everything that crosses an origin boundary is described here: the
//! sub-program going in, the outcome coming back. The format is an internal
//! implementation detail, but it is a real protocol: versioned, fully
//! self-contained, and deliberately free of any type that could smuggle a
//! live handle across the boundary.

use crosswave_core::{DocumentHandle, Origin};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::command::{AssertSpec, Command, TextExpectation};
use crate::error::{CommandError, Diagnostic, Outcome};
use crate::queue::DrainReport;

pub(crate) const WIRE_VERSION: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum WireCodecError {
    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("unsupported wire version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("malformed origin on the wire: {0}")]
    Origin(String),

    #[error("malformed URL on the wire: {0}")]
    Url(String),
}

/// The serialized sub-program: the context it runs in plus its commands.
#[derive(Debug, Serialize, Deserialize)]
struct WireProgram {
    version: u32,
    origin: String,
    document_id: u64,
    commands: Vec<WireCommand>,
}

#[derive(Debug, Serialize, Deserialize)]
enum WireCommand {
    Navigate {
        url: String,
    },
    Query {
        selector: String,
    },
    AssertText {
        selector: String,
        expect: WireExpectation,
        timeout_ms: Option<u64>,
        poll_interval_ms: Option<u64>,
    },
    RunInOrigin {
        origin: String,
        program: Vec<WireCommand>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
enum WireExpectation {
    Contains { fragment: String },
    Equals { text: String },
}

/// The serialized terminal outcome of a sub-program.
#[derive(Debug, Serialize, Deserialize)]
struct WireOutcome {
    version: u32,
    tag: WireTag,
    executed: usize,
    diagnostic: Option<WireDiagnostic>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
enum WireTag {
    Passed,
    Failed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDiagnostic {
    command_index: usize,
    command: String,
    error: WireError,
    nested: Option<Box<WireDiagnostic>>,
}

#[derive(Debug, Serialize, Deserialize)]
enum WireError {
    Navigation {
        url: String,
        reason: String,
    },
    AssertionTimeout {
        predicate: String,
        last_observed: Option<String>,
        waited_ms: u64,
    },
    StaleContext,
    OriginMismatch {
        requested: String,
        actual: Option<String>,
    },
    Query {
        selector: String,
        reason: String,
    },
    Bridge {
        reason: String,
    },
    Cancelled,
}

/// Serialize a sub-program for execution beyond the boundary.
pub(crate) fn encode_program(
    document: &DocumentHandle,
    commands: &[Command],
) -> Result<Vec<u8>, WireCodecError> {
    let program = WireProgram {
        version: WIRE_VERSION,
        origin: document.origin().to_string(),
        document_id: document.id(),
        commands: commands.iter().map(command_to_wire).collect(),
    };
    serde_json::to_vec(&program).map_err(|err| WireCodecError::Encode(err.to_string()))
}

/// Reconstruct a sub-program on the isolated side of the boundary.
pub(crate) fn decode_program(
    bytes: &[u8],
) -> Result<(DocumentHandle, Vec<Command>), WireCodecError> {
    let program: WireProgram =
        serde_json::from_slice(bytes).map_err(|err| WireCodecError::Decode(err.to_string()))?;

    if program.version != WIRE_VERSION {
        return Err(WireCodecError::Version {
            found: program.version,
            expected: WIRE_VERSION,
        });
    }

    let origin = parse_origin(&program.origin)?;
    let commands = program
        .commands
        .iter()
        .map(command_from_wire)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((DocumentHandle::new(program.document_id, origin), commands))
}

/// Serialize a drain report as the crossing's terminal outcome.
pub(crate) fn encode_outcome(report: &DrainReport) -> Result<Vec<u8>, WireCodecError> {
    let (tag, diagnostic) = match report.outcome() {
        Outcome::Passed => (WireTag::Passed, None),
        Outcome::Cancelled => (WireTag::Cancelled, None),
        Outcome::Failed(diag) => (WireTag::Failed, Some(diagnostic_to_wire(&diag))),
    };
    let outcome = WireOutcome {
        version: WIRE_VERSION,
        tag,
        executed: report.executed(),
        diagnostic,
    };
    serde_json::to_vec(&outcome).map_err(|err| WireCodecError::Encode(err.to_string()))
}

/// Reconstruct a crossing outcome on the calling side of the boundary.
pub(crate) fn decode_outcome(bytes: &[u8]) -> Result<(usize, Outcome), WireCodecError> {
    let outcome: WireOutcome =
        serde_json::from_slice(bytes).map_err(|err| WireCodecError::Decode(err.to_string()))?;

    if outcome.version != WIRE_VERSION {
        return Err(WireCodecError::Version {
            found: outcome.version,
            expected: WIRE_VERSION,
        });
    }

    let decoded = match (outcome.tag, outcome.diagnostic) {
        (WireTag::Passed, _) => Outcome::Passed,
        (WireTag::Cancelled, _) => Outcome::Cancelled,
        (WireTag::Failed, Some(diag)) => Outcome::Failed(diagnostic_from_wire(&diag)?),
        (WireTag::Failed, None) => {
            return Err(WireCodecError::Decode(
                "failed outcome carries no diagnostic".to_string(),
            ));
        }
    };

    Ok((outcome.executed, decoded))
}

fn command_to_wire(command: &Command) -> WireCommand {
    match command {
        Command::Navigate { url } => WireCommand::Navigate {
            url: url.to_string(),
        },
        Command::Query { selector } => WireCommand::Query {
            selector: selector.clone(),
        },
        Command::AssertText(spec) => WireCommand::AssertText {
            selector: spec.selector.clone(),
            expect: match &spec.expect {
                TextExpectation::Contains(fragment) => WireExpectation::Contains {
                    fragment: fragment.clone(),
                },
                TextExpectation::Equals(text) => WireExpectation::Equals { text: text.clone() },
            },
            timeout_ms: spec.timeout.map(|d| d.as_millis() as u64),
            poll_interval_ms: spec.poll_interval.map(|d| d.as_millis() as u64),
        },
        Command::RunInOrigin { origin, program } => WireCommand::RunInOrigin {
            origin: origin.to_string(),
            program: program.iter().map(command_to_wire).collect(),
        },
    }
}

fn command_from_wire(command: &WireCommand) -> Result<Command, WireCodecError> {
    Ok(match command {
        WireCommand::Navigate { url } => Command::Navigate {
            url: Url::parse(url).map_err(|_| WireCodecError::Url(url.clone()))?,
        },
        WireCommand::Query { selector } => Command::Query {
            selector: selector.clone(),
        },
        WireCommand::AssertText {
            selector,
            expect,
            timeout_ms,
            poll_interval_ms,
        } => {
            let expect = match expect {
                WireExpectation::Contains { fragment } => {
                    TextExpectation::Contains(fragment.clone())
                }
                WireExpectation::Equals { text } => TextExpectation::Equals(text.clone()),
            };
            Command::AssertText(AssertSpec {
                selector: selector.clone(),
                expect,
                timeout: timeout_ms.map(Duration::from_millis),
                poll_interval: poll_interval_ms.map(Duration::from_millis),
            })
        }
        WireCommand::RunInOrigin { origin, program } => Command::RunInOrigin {
            origin: parse_origin(origin)?,
            program: program
                .iter()
                .map(command_from_wire)
                .collect::<Result<Vec<_>, _>>()?,
        },
    })
}

fn error_to_wire(error: &CommandError) -> WireError {
    match error {
        CommandError::NavigationFailure { url, reason } => WireError::Navigation {
            url: url.to_string(),
            reason: reason.clone(),
        },
        CommandError::AssertionTimeout {
            predicate,
            last_observed,
            waited_ms,
        } => WireError::AssertionTimeout {
            predicate: predicate.clone(),
            last_observed: last_observed.clone(),
            waited_ms: *waited_ms,
        },
        CommandError::StaleContext => WireError::StaleContext,
        CommandError::OriginMismatch { requested, actual } => WireError::OriginMismatch {
            requested: requested.to_string(),
            actual: actual.as_ref().map(|origin| origin.to_string()),
        },
        CommandError::QueryFailure { selector, reason } => WireError::Query {
            selector: selector.clone(),
            reason: reason.clone(),
        },
        CommandError::BridgeFailure { reason } => WireError::Bridge {
            reason: reason.clone(),
        },
        CommandError::Cancelled => WireError::Cancelled,
    }
}

fn error_from_wire(error: &WireError) -> Result<CommandError, WireCodecError> {
    Ok(match error {
        WireError::Navigation { url, reason } => CommandError::NavigationFailure {
            url: Url::parse(url).map_err(|_| WireCodecError::Url(url.clone()))?,
            reason: reason.clone(),
        },
        WireError::AssertionTimeout {
            predicate,
            last_observed,
            waited_ms,
        } => CommandError::AssertionTimeout {
            predicate: predicate.clone(),
            last_observed: last_observed.clone(),
            waited_ms: *waited_ms,
        },
        WireError::StaleContext => CommandError::StaleContext,
        WireError::OriginMismatch { requested, actual } => CommandError::OriginMismatch {
            requested: parse_origin(requested)?,
            actual: actual.as_deref().map(parse_origin).transpose()?,
        },
        WireError::Query { selector, reason } => CommandError::QueryFailure {
            selector: selector.clone(),
            reason: reason.clone(),
        },
        WireError::Bridge { reason } => CommandError::BridgeFailure {
            reason: reason.clone(),
        },
        WireError::Cancelled => CommandError::Cancelled,
    })
}

fn diagnostic_to_wire(diagnostic: &Diagnostic) -> WireDiagnostic {
    WireDiagnostic {
        command_index: diagnostic.command_index,
        command: diagnostic.command.clone(),
        error: error_to_wire(&diagnostic.error),
        nested: diagnostic
            .nested
            .as_deref()
            .map(|nested| Box::new(diagnostic_to_wire(nested))),
    }
}

fn diagnostic_from_wire(diagnostic: &WireDiagnostic) -> Result<Diagnostic, WireCodecError> {
    Ok(Diagnostic {
        command_index: diagnostic.command_index,
        command: diagnostic.command.clone(),
        error: error_from_wire(&diagnostic.error)?,
        nested: diagnostic
            .nested
            .as_deref()
            .map(diagnostic_from_wire)
            .transpose()?
            .map(Box::new),
    })
}

fn parse_origin(s: &str) -> Result<Origin, WireCodecError> {
    Origin::parse(s).map_err(|_| WireCodecError::Origin(s.to_string()))
}
