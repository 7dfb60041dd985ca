/*
 * Lifecycle Diagnostics
 *
 * Defects found on feasible paths, with one witness path as evidence.
 */

use serde::{Deserialize, Serialize};

use super::machine::State;
use crate::shared::models::{EffectSite, NodeId};

/// Diagnostic kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DiagnosticKind {
    /// Release of an already-released value
    DoubleFree,

    /// Release of a value known to be null
    FreeOfNull,

    /// Release of a value whose null check never happened
    FreeOfUnchecked,

    /// Use of a value known to be null
    NullDeref,

    /// Use of a released value
    UseAfterFree,

    /// Value still live when the path terminates
    Leak,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DiagnosticKind::DoubleFree => "double-free",
            DiagnosticKind::FreeOfNull => "free-of-null",
            DiagnosticKind::FreeOfUnchecked => "free-of-unchecked",
            DiagnosticKind::NullDeref => "null-deref",
            DiagnosticKind::UseAfterFree => "use-after-free",
            DiagnosticKind::Leak => "leak",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for DiagnosticKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "double-free" => Ok(DiagnosticKind::DoubleFree),
            "free-of-null" => Ok(DiagnosticKind::FreeOfNull),
            "free-of-unchecked" => Ok(DiagnosticKind::FreeOfUnchecked),
            "null-deref" => Ok(DiagnosticKind::NullDeref),
            "use-after-free" => Ok(DiagnosticKind::UseAfterFree),
            "leak" => Ok(DiagnosticKind::Leak),
            other => Err(format!("Unknown diagnostic kind '{}'", other)),
        }
    }
}

/// A defect reached on a feasible path
///
/// Field order doubles as the sort order used to make reports deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Machine that classified the defect
    pub machine: String,

    /// Variable bound to the offending value at the point of error
    pub variable: String,

    /// Diagnostic kind
    pub kind: DiagnosticKind,

    /// Machine state at the point of error
    pub state_at_error: State,

    /// Acquisition site of the offending value
    pub site: EffectSite,

    /// Node ids of one feasible path reaching the defect
    pub witness: Vec<NodeId>,

    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create new diagnostic
    pub fn new(
        machine: impl Into<String>,
        variable: impl Into<String>,
        kind: DiagnosticKind,
        state_at_error: State,
        site: EffectSite,
        witness: Vec<NodeId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            machine: machine.into(),
            variable: variable.into(),
            kind,
            state_at_error,
            site,
            witness,
            message: message.into(),
        }
    }

    /// Format for display
    pub fn format_message(&self) -> String {
        format!(
            "[{}] {} on '{}' (acquired at {}, state: {}) - {}",
            self.machine, self.kind, self.variable, self.site, self.state_at_error, self.message
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_message())
    }
}
