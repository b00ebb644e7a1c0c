use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

/// Outcome of a single permit decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The workload may start on the node now.
    Admit,
    /// Re-invoke the permit call for the same workload and node after this duration.
    Wait(Duration),
    /// Temporary scheduling failure; placement should be retried later.
    Error(String),
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }

    /// Wait duration, zero for anything other than `Wait`.
    pub fn wait_duration(&self) -> Duration {
        match self {
            Verdict::Wait(d) => *d,
            _ => Duration::ZERO,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Admit => "admit",
            Verdict::Wait(_) => "wait",
            Verdict::Error(_) => "error",
        }
    }
}

/// A verdict together with the retry counter written while reaching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Set whenever the workload's counter was incremented.
    pub retry_count: Option<u32>,
}

impl Decision {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            retry_count: None,
        }
    }

    pub fn with_retry_count(verdict: Verdict, retry_count: u32) -> Self {
        Self {
            verdict,
            retry_count: Some(retry_count),
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Verdict::Admit => write!(f, "admit"),
            Verdict::Wait(d) => write!(f, "wait {}s", d.as_secs()),
            Verdict::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}
