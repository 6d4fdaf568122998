//! Submit phase state machine
//!
//! Transitions are a pure function of the current phase and the result of
//! the step that just finished, so the sequencing can be tested without any
//! I/O.

use crate::error::{Error, Result};
use tracing::info;

/// Phase of a submit session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Reading revisions and remote state
    Loading,
    /// Nothing to do
    UpToDate,
    /// Waiting for the user to acknowledge the plan
    Confirmation,
    /// Pushing branches and creating/updating PRs
    Syncing,
    /// Upserting stack comments and saving state
    UpdatingComments,
    /// Everything succeeded
    Complete,
    /// A step failed; the error is kept on the machine
    Failed,
}

impl SyncPhase {
    /// Whether no further event is expected in this phase
    ///
    /// `Confirmation` is a pause: it only ends on [`PhaseEvent::Confirmed`].
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::UpToDate | Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Fetching remote state"),
            Self::UpToDate => write!(f, "Up to date"),
            Self::Confirmation => write!(f, "Awaiting confirmation"),
            Self::Syncing => write!(f, "Syncing revisions"),
            Self::UpdatingComments => write!(f, "Updating stack comments"),
            Self::Complete => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Result of the step that ran in the current phase
#[derive(Debug, Clone)]
pub enum PhaseEvent {
    /// Loading finished; `true` if any revision needs sync
    Loaded(Result<bool>),
    /// The user acknowledged the plan
    Confirmed,
    /// Push and API phases finished
    Synced(Result<()>),
    /// Comments upserted and state saved
    CommentsUpdated(Result<()>),
}

impl PhaseEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Loaded(_) => "Loaded",
            Self::Confirmed => "Confirmed",
            Self::Synced(_) => "Synced",
            Self::CommentsUpdated(_) => "CommentsUpdated",
        }
    }
}

/// Current phase plus the error that ended the session, if any
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: SyncPhase,
    error: Option<Error>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Start in `Loading`
    pub const fn new() -> Self {
        Self {
            phase: SyncPhase::Loading,
            error: None,
        }
    }

    /// Current phase
    pub const fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Error that moved the machine to `Failed`
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Apply an event, returning the new phase
    ///
    /// A failed step moves to `Failed` from any phase and keeps its error.
    /// An event that does not belong to the current phase is rejected and
    /// leaves the machine unchanged.
    pub fn advance(&mut self, event: PhaseEvent) -> Result<SyncPhase> {
        use PhaseEvent::{CommentsUpdated, Confirmed, Loaded, Synced};
        use SyncPhase::{
            Complete, Confirmation, Failed, Loading, Syncing, UpToDate, UpdatingComments,
        };

        let next = match (self.phase, event) {
            (Loading, Loaded(Ok(true))) => Confirmation,
            (Loading, Loaded(Ok(false))) => UpToDate,
            (Confirmation, Confirmed) => Syncing,
            (Syncing, Synced(Ok(()))) => UpdatingComments,
            (UpdatingComments, CommentsUpdated(Ok(()))) => Complete,
            (Loading, Loaded(Err(e)))
            | (Syncing, Synced(Err(e)))
            | (UpdatingComments, CommentsUpdated(Err(e))) => {
                self.error = Some(e);
                Failed
            }
            (phase, event) => {
                return Err(Error::InvalidTransition(format!(
                    "{} while {phase:?}",
                    event.name()
                )));
            }
        };

        info!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
        Ok(next)
    }

    /// Record an error raised outside a step (e.g. interruption) and stop
    pub fn fail(&mut self, error: Error) {
        if !self.phase.is_terminal() {
            info!(from = ?self.phase, "phase transition to Failed");
            self.phase = SyncPhase::Failed;
            self.error = Some(error);
        }
    }
}
