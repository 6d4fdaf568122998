//! Command implementations for the `jj-stack` binary

mod context;
mod progress;
mod render;
pub mod style;
mod submit;
mod sync;

pub use progress::CliProgress;
pub use submit::{SubmitArgs, run_submit};
pub use sync::run_sync;
