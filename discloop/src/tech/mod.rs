// discloop/src/tech/mod.rs
//! Per-technology polling: detection request, collision resolution,
//! activation and presence check.
//!
//! The discovery engines only know the [`TechnologyPoller`] trait; the
//! technology specific command sequences live in the submodules.

use crate::discovery::DiscLoop;
use crate::error::{Error, LayerResult, Result};
use crate::types::{Status, Technology};

/// ISO 18000-3m3
pub mod i18000p3m3;
/// ISO 14443 Type A
pub mod type_a;
/// ISO 14443 Type B
pub mod type_b;
/// FeliCa
pub mod type_f;
/// ISO 15693
pub mod type_v;

pub use i18000p3m3::I18000p3m3Poller;
pub use type_a::TypeAPoller;
pub use type_b::TypeBPoller;
pub use type_f::TypeFPoller;
pub use type_v::TypeVPoller;

/// What the detection request of one technology saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Absent,
    Present,
    /// Several devices answered at once.
    Collision,
}

impl Detection {
    /// Timeouts mean nobody answered, collision and integrity errors mean
    /// more than one device did. Everything else is a failure.
    pub fn from_result<T>(result: &LayerResult<T>) -> Result<Detection> {
        match result {
            Ok(_) => Ok(Detection::Present),
            Err(e) if e.is_collision() => Ok(Detection::Collision),
            Err(e) if e.is_timeout() => Ok(Detection::Absent),
            Err(e) => Err(Error::Failure(*e)),
        }
    }

    /// Anything answered.
    pub fn is_detected(self) -> bool {
        self != Detection::Absent
    }
}

/// Detection, resolution and activation for one technology.
pub trait TechnologyPoller {
    fn technology(&self) -> Technology;

    /// Send the technology's detection request. The field is on and the
    /// protocol settings are applied.
    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection>;

    /// Resolve devices up to the configured limit and store them in the
    /// target info. Returns `true` when devices remain unresolved.
    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool>;

    /// Activate the tag stored at `index`.
    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status>;

    /// Wake-up request used while waiting for card removal. Devices that
    /// still answer are halted again.
    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool>;
}

/// Factory returning the poller of `tech`.
pub fn create_poller_for(tech: Technology) -> Box<dyn TechnologyPoller> {
    match tech {
        Technology::TypeA => Box::new(TypeAPoller),
        Technology::TypeB => Box::new(TypeBPoller),
        Technology::TypeF212 | Technology::TypeF424 => Box::new(TypeFPoller::new(tech)),
        Technology::TypeV => Box::new(TypeVPoller),
        Technology::I18000p3m3 => Box::new(I18000p3m3Poller),
    }
}

/// Borrow a bound PAL or report it missing.
pub(crate) fn bound<'a, P: ?Sized>(
    pal: &'a mut Option<Box<P>>,
    name: &'static str,
) -> Result<&'a mut P> {
    pal.as_deref_mut().ok_or(Error::InvalidParameter(name))
}

pub(crate) fn tag_out_of_range() -> Error {
    Error::InvalidParameter("tag index out of range")
}
