// discloop/src/prelude.rs

pub use crate::discovery::{ConfigKey, ConfigValue, DiscLoop, DiscLoopBuilder, PollSequence};
pub use crate::hal::{Hal, HalConfig, RfMode, WaitUnit};
pub use crate::pal::Pals;
pub use crate::target::TargetInfo;
pub use crate::{
    EntryPoint, Error, LayerError, OperationMode, PollState, Result, Status, TechMask, Technology,
};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced};
