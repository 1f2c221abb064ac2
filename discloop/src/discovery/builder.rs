// discloop/src/discovery/builder.rs

use crate::discovery::DiscLoop;
use crate::hal::Hal;
use crate::pal::{
    Felica, I14443p3a, I14443p3b, I14443p4, I14443p4a, I18000p3m3, I18092mPi, Pals, Sli15693,
};
use crate::{Error, Result};

/// Binds a HAL and the PALs of the technologies to support, then builds
/// an initialized [`DiscLoop`]. Technologies whose PAL is not supplied
/// cannot be enabled later.
#[derive(Default)]
pub struct DiscLoopBuilder {
    hal: Option<Box<dyn Hal>>,
    pals: Pals,
}

impl DiscLoopBuilder {
    /// Builder with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Required.
    pub fn with_hal(mut self, hal: Box<dyn Hal>) -> Self {
        self.hal = Some(hal);
        self
    }

    /// Replace the whole PAL set.
    pub fn with_pals(mut self, pals: Pals) -> Self {
        self.pals = pals;
        self
    }

    /// Type A layer 3.
    pub fn with_i14443p3a(mut self, pal: Box<dyn I14443p3a>) -> Self {
        self.pals.i14443p3a = Some(pal);
        self
    }

    /// Type A layer 4.
    pub fn with_i14443p4a(mut self, pal: Box<dyn I14443p4a>) -> Self {
        self.pals.i14443p4a = Some(pal);
        self
    }

    /// Type B layer 3.
    pub fn with_i14443p3b(mut self, pal: Box<dyn I14443p3b>) -> Self {
        self.pals.i14443p3b = Some(pal);
        self
    }

    /// ISO 14443-4 protocol for Type B.
    pub fn with_i14443p4(mut self, pal: Box<dyn I14443p4>) -> Self {
        self.pals.i14443p4 = Some(pal);
        self
    }

    /// FeliCa.
    pub fn with_felica(mut self, pal: Box<dyn Felica>) -> Self {
        self.pals.felica = Some(pal);
        self
    }

    /// ISO 15693.
    pub fn with_sli15693(mut self, pal: Box<dyn Sli15693>) -> Self {
        self.pals.sli15693 = Some(pal);
        self
    }

    /// ISO 18000-3m3.
    pub fn with_i18000p3m3(mut self, pal: Box<dyn I18000p3m3>) -> Self {
        self.pals.i18000p3m3 = Some(pal);
        self
    }

    /// NFC-DEP initiator.
    pub fn with_i18092m_pi(mut self, pal: Box<dyn I18092mPi>) -> Self {
        self.pals.i18092m_pi = Some(pal);
        self
    }

    /// Requires a HAL; otherwise returns `InvalidParameter`.
    pub fn build(self) -> Result<DiscLoop> {
        match self.hal {
            Some(hal) => Ok(DiscLoop::new(hal, self.pals)),
            None => Err(Error::InvalidParameter("no HAL bound")),
        }
    }
}
