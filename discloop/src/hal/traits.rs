// discloop/src/hal/traits.rs

use crate::error::LayerResult;
use crate::types::{ListenActivation, TechMask, Technology};

/// Protocol settings loaded into the front-end before an RF exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfMode {
    PassiveA106,
    PassiveB106,
    PassiveF212,
    PassiveF424,
    PassiveV,
    I18000p3m3,
    ActiveA106,
    ActiveF212,
    ActiveF424,
}

impl RfMode {
    /// Passive poll mode for `tech`.
    pub fn passive(tech: Technology) -> Self {
        match tech {
            Technology::TypeA => RfMode::PassiveA106,
            Technology::TypeB => RfMode::PassiveB106,
            Technology::TypeF212 => RfMode::PassiveF212,
            Technology::TypeF424 => RfMode::PassiveF424,
            Technology::TypeV => RfMode::PassiveV,
            Technology::I18000p3m3 => RfMode::I18000p3m3,
        }
    }

    /// Active-mode settings for the technologies that have one.
    pub fn active(tech: Technology) -> Option<Self> {
        match tech {
            Technology::TypeA => Some(RfMode::ActiveA106),
            Technology::TypeF212 => Some(RfMode::ActiveF212),
            Technology::TypeF424 => Some(RfMode::ActiveF424),
            _ => None,
        }
    }
}

/// Time base of `Hal::wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUnit {
    Micros,
    Millis,
}

/// HAL settings the discovery loop changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalConfig {
    /// EMD (electromagnetic disturbance) suppression on receive.
    Emd(bool),
    /// Jewel/Topaz framing for Type A.
    JewelMode(bool),
}

/// Hardware abstraction the discovery loop drives. One implementation per
/// front-end (PN5180, PN7642, ...); tests use `MockHal`.
pub trait Hal {
    /// Switch the reader field on. Implementations run RF collision
    /// avoidance and fail with `ErrorKind::RfOn` when an external field is
    /// present.
    fn field_on(&mut self) -> LayerResult<()>;

    fn field_off(&mut self) -> LayerResult<()>;

    /// Block for `ticks` units. The only suspension point of the loop.
    fn wait(&mut self, unit: WaitUnit, ticks: u16) -> LayerResult<()>;

    /// Low-power card detection. `Ok` means a load change was seen,
    /// `ErrorKind::IoTimeout` means nothing approached the antenna.
    fn lpcd(&mut self) -> LayerResult<()>;

    fn apply_protocol_settings(&mut self, mode: RfMode) -> LayerResult<()>;

    fn set_config(&mut self, config: HalConfig) -> LayerResult<()>;

    /// Act as a target for the given passive/active listen technologies
    /// until a peer activates us.
    fn autocoll(&mut self, passive: TechMask, active: TechMask) -> LayerResult<ListenActivation>;
}
