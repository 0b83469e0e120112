pub mod mocks;
pub mod setup;

pub use mocks::MockConnectionRegistry;
pub use setup::TestSetup;
