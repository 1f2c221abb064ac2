// discloop/src/error.rs

use derive_more::Display;
use thiserror::Error;

/// Collaborator that produced a lower-layer status. `DiscLoop` marks a
/// protocol rule enforced by the loop itself rather than a PAL failure.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// RF front-end
    #[display(fmt = "hal")]
    Hal,
    #[display(fmt = "i14443p3a")]
    I14443p3a,
    #[display(fmt = "i14443p4a")]
    I14443p4a,
    #[display(fmt = "i14443p3b")]
    I14443p3b,
    #[display(fmt = "i14443p4")]
    I14443p4,
    #[display(fmt = "felica")]
    Felica,
    #[display(fmt = "sli15693")]
    Sli15693,
    #[display(fmt = "i18000p3m3")]
    I18000p3m3,
    #[display(fmt = "i18092mpi")]
    I18092mPi,
    /// Loop-level rule
    #[display(fmt = "discloop")]
    DiscLoop,
}

/// Error condition reported by a HAL or PAL call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[display(fmt = "io timeout")]
    IoTimeout,
    #[display(fmt = "collision")]
    Collision,
    #[display(fmt = "integrity error")]
    Integrity,
    #[display(fmt = "protocol error")]
    Protocol,
    #[display(fmt = "framing error")]
    Framing,
    /// An external RF field was present when the reader tried to switch
    /// its own field on.
    #[display(fmt = "external rf field on")]
    RfOn,
    /// The external field dropped while acting as a target.
    #[display(fmt = "external rf field off")]
    RfOff,
    #[display(fmt = "buffer overflow")]
    BufferOverflow,
    #[display(fmt = "unsupported command")]
    Unsupported,
    #[display(fmt = "invalid parameter")]
    InvalidParameter,
    #[display(fmt = "internal error")]
    Internal,
}

/// Status of a failed lower-layer call: which component failed and how.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{component}: {kind}")]
pub struct LayerError {
    /// Failing collaborator.
    pub component: Component,
    /// What went wrong.
    pub kind: ErrorKind,
}

impl LayerError {
    /// Status for `component` failing with `kind`.
    pub const fn new(component: Component, kind: ErrorKind) -> Self {
        Self { component, kind }
    }

    /// Nothing answered in time.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::IoTimeout
    }

    /// Several cards answered at once.
    pub fn is_collision(&self) -> bool {
        matches!(self.kind, ErrorKind::Collision | ErrorKind::Integrity)
    }

    /// A foreign RF field blocked ours.
    pub fn is_external_rf_on(&self) -> bool {
        self.kind == ErrorKind::RfOn
    }
}

/// Result type returned by HAL and PAL collaborators.
pub type LayerResult<T> = std::result::Result<T, LayerError>;

/// Errors surfaced by the discovery loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad configuration key or value, unknown entry point, empty listen
    /// configuration or an activation request for a tag that does not exist.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// A lower layer failed. The same status is kept by the loop and can be
    /// read back through `ConfigKey::AdditionalInfo`.
    #[error("lower layer failure ({0})")]
    Failure(#[from] LayerError),
}

/// Result type of the discovery loop API.
pub type Result<T> = std::result::Result<T, Error>;
