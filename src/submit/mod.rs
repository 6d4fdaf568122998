//! Stack reconciliation and sync engine
//!
//! A submit session reads the revision batch, looks up open PRs, refreshes
//! persisted associations, evaluates what is stale, then (once confirmed)
//! pushes, creates/updates PRs and upserts stack comments:
//!
//! - [`find_open_prs`]: open PR per branch
//! - [`resolve_base`]: base branch walk
//! - [`evaluate`]: per-revision sync need
//! - [`SyncExecutor`]: sequential pushes, then concurrent API calls
//! - [`sync_stack_comments`]: stack comment upsert
//! - [`PhaseMachine`]: sequencing
//! - [`run_submit`]: the driver tying these together

mod base;
mod comment;
mod evaluate;
mod execute;
mod lookup;
mod phase;
mod progress;
mod session;
mod stack;

pub use base::{open_branch_set, resolve_base};
pub use comment::{
    CommentEntry, CommentOutcome, CommentReport, STACK_COMMENT_MARKER, STACK_COMMENT_THIS_PR,
    comment_entries, format_stack_comment, sync_stack_comments,
};
pub use evaluate::{
    DesiredPr, Evaluation, PrField, RevisionPlan, SyncAction, desired_pr, evaluate, is_draft,
    stale_fields,
};
pub use execute::{PrOperation, RevisionResult, SyncExecutor, SyncReport};
pub use lookup::find_open_prs;
pub use phase::{PhaseEvent, PhaseMachine, SyncPhase};
pub use progress::{NoopProgress, ProgressCallback, PushStatus};
pub use session::{AutoConfirm, Confirm, SubmitOptions, SubmitReport, run_submit, submit_revset};
pub use stack::{RowKind, RowState, Stack, StackRow};
