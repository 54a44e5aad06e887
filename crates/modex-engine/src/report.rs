//! Run results: verdicts, failures, and counterexample traces.

use std::fmt;
use thiserror::Error;

/// Category of a detected failure. The display string is the label printed
/// after `!!!` in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The safety predicate rejected a reachable state.
    Safety,
    /// A terminal state violated the deadlock predicate.
    IllegalDeadlock,
    /// Some state cannot reach any may-progress state.
    MayProgress,
    /// Some cycle or terminal state contains no must-progress state.
    MustProgress,
    /// Under reduction only: a state cannot reach any terminal state.
    TerminationUnreachable,
    /// A modelling error before or during setup.
    Initialization,
    /// A modelling error raised while firing a transition.
    TransitionFiring,
    /// A malformed stubborn-set obligation.
    StubbornSet,
    /// The model reported `u32::MAX` structural transitions.
    TooManyTransitions,
    /// The configured maximum number of states was exceeded.
    StateLimit,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Safety => "Safety error",
            FailureKind::IllegalDeadlock => "Illegal deadlock",
            FailureKind::MayProgress => "May-type non-progress error",
            FailureKind::MustProgress => "Must-type non-progress error",
            FailureKind::TerminationUnreachable => {
                "State was reached from which termination is unreachable"
            }
            FailureKind::Initialization => "Initialization error",
            FailureKind::TransitionFiring => "Transition firing error",
            FailureKind::StubbornSet => "Stubborn set error",
            FailureKind::TooManyTransitions => "Too many transitions",
            FailureKind::StateLimit => "State space too large",
        })
    }
}

/// The forward continuation appended to a progress counterexample (and the
/// whole output of a typical-execution run): the walk up to the point where
/// it closes a cycle or stops, then the cycle (or lone terminal state).
#[derive(Clone, Debug, Default)]
pub struct TypicalTail {
    pub approach: Vec<String>,
    pub cycle: Vec<String>,
}

impl fmt::Display for TypicalTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.approach {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "----------")?;
        for line in &self.cycle {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A counterexample: the minimal-length history from the initial state, plus,
/// for progress failures, the typical continuation from the witness.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    /// One rendered state per line, initial state first.
    pub states: Vec<String>,
    /// Present for progress failures only.
    pub tail: Option<TypicalTail>,
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.states {
            writeln!(f, "{line}")?;
        }
        if let Some(tail) = &self.tail {
            writeln!(f, "==========")?;
            write!(f, "{tail}")?;
        }
        Ok(())
    }
}

/// A property violation or modelling error, with its counterexample.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct CheckFailure {
    pub kind: FailureKind,
    /// Detail message; empty for the progress failures, whose category says
    /// it all.
    pub message: String,
    pub trace: Trace,
}

impl CheckFailure {
    /// The `!!!` line of the report.
    pub fn headline(&self) -> String {
        if self.message.is_empty() {
            format!("!!! {}", self.kind)
        } else {
            format!("!!! {}: {}", self.kind, self.message)
        }
    }
}

/// Overall verdict of a run.
#[derive(Clone, Debug)]
pub enum Verdict {
    /// Every requested check passed.
    Pass,
    /// The run finished but the result cannot be trusted as stated.
    Inconclusive(&'static str),
    /// A violation or modelling error was found.
    Failed(CheckFailure),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn failure(&self) -> Option<&CheckFailure> {
        match self {
            Verdict::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Result of [`Explorer::run`](crate::explorer::Explorer::run).
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Number of constructed states (the initial state counts).
    pub states: usize,
    /// Number of explored edges.
    pub edges: usize,
    pub verdict: Verdict,
    /// The execution printed by a typical-execution run.
    pub typical: Option<TypicalTail>,
}

impl RunReport {
    /// Render the report the way the checker prints it: counterexample (or
    /// typical execution), headline, summary line, trailing caveat.
    pub fn render(&self) -> String {
        use fmt::Write;
        let mut out = String::new();
        if let Some(typical) = &self.typical {
            let _ = write!(out, "{typical}");
            if let Verdict::Failed(failure) = &self.verdict {
                let _ = writeln!(out, "{}", failure.headline());
            }
            let _ = writeln!(out, "{} states", self.states);
            return out;
        }
        match &self.verdict {
            Verdict::Failed(failure) => {
                let _ = write!(out, "{}", failure.trace);
                let _ = writeln!(out, "{}", failure.headline());
                let _ = writeln!(out, "{} states, {} edges", self.states, self.edges);
            }
            Verdict::Pass => {
                let _ = writeln!(out, "{} states, {} edges", self.states, self.edges);
            }
            Verdict::Inconclusive(reason) => {
                let _ = writeln!(out, "{} states, {} edges", self.states, self.edges);
                let _ = writeln!(out, "!!! Error: {reason}");
            }
        }
        out
    }
}
