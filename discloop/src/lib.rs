// discloop/src/lib.rs

//! discloop
//!
//! Multi-technology NFC discovery loop for reader front-ends. Polls Type A,
//! Type B, Type F, Type V and ISO 18000-3 mode 3 passively, tries active
//! P2P first when asked to, resolves collisions, activates the device it
//! found and falls back to listen mode on request.
//!
//! The RF front-end and the per-protocol layers are reached through the
//! [`hal::Hal`] and [`pal`] traits; bind them with [`DiscLoopBuilder`].

#![warn(missing_docs)]

/// Protocol constants and defaults
pub mod constants;
/// The discovery loop and its configuration
pub mod discovery;
/// Error types
pub mod error;
/// Hardware abstraction seam
pub mod hal;
/// Protocol abstraction seam
pub mod pal;
/// Common imports
pub mod prelude;
/// Per-technology target storage
pub mod target;
/// Per-technology polling
pub mod tech;
/// Mock rig for tests and demos
pub mod test_support;
/// Protocol newtypes
pub mod types;
/// Hex helpers
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the value types in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::discovery::{DiscLoop, DiscLoopBuilder};
pub use crate::error::*;
pub use crate::types::*;
