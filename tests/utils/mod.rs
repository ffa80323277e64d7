pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
pub use assertions::wait_for_members;
#[allow(unused_imports)]
pub use mocks::{MockPeer, StubDirectory};
pub use setup::{TestSetupBuilder, ROOM};
