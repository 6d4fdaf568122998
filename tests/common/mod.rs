//! Common test utilities for jj-stack tests

pub mod fixtures;
pub mod mock_platform;
pub mod mock_workspace;

// Re-exports for convenience - not all test binaries use all exports
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_platform::{MockPlatformService, make_remote_pr};
#[allow(unused_imports)]
pub use mock_workspace::MockWorkspace;
