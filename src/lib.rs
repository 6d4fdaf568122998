//! jj-stack: keep a stack of Jujutsu changes in sync with GitHub pull requests
//!
//! Each described, mutable change between trunk and the target revset gets
//! one pull request, based on the PR of its nearest ancestor that has one.
//! The library holds the whole reconciliation engine; the binary only adds
//! argument parsing and terminal output.

pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod platform;
pub mod rebase;
pub mod repo;
pub mod submit;
pub mod tracking;
pub mod types;

pub use error::{Error, Result};
