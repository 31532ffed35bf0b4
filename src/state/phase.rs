//! Crawl phase definitions for the driver loop
//!
//! ```text
//! Running ──► Running
//!    │ ├────► Draining ──► Interrupted
//!    │ └────────────────► Interrupted
//!    └──────────────────► Completed
//! ```
use crate::MirrorError;
use std::fmt;

/// Represents the run state of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active States =====
    /// The loop is dequeuing and processing URLs
    Running,

    /// A shutdown was requested; the loop stops before the next URL
    Draining,

    // ===== Terminal States =====
    /// The queue emptied without interruption
    Completed,

    /// The loop stopped with work pending; state has been persisted
    Interrupted,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Interrupted)
    }

    /// Returns true if `self -> to` is a legal transition
    pub fn can_transition_to(&self, to: CrawlPhase) -> bool {
        match self {
            Self::Running => true,
            Self::Draining => to == Self::Interrupted,
            _ => !self.is_terminal(),
        }
    }

    /// Performs a transition, rejecting illegal ones
    pub fn transition(self, to: CrawlPhase) -> Result<CrawlPhase, MirrorError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(MirrorError::InvalidTransition { from: self, to })
        }
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
