// discloop/src/hal/mod.rs

/// Scripted HAL
pub mod mock;
/// HAL trait and its types
pub mod traits;

pub use mock::{HalCall, MockHal};
pub use traits::{Hal, HalConfig, RfMode, WaitUnit};
