// discloop/src/pal/mod.rs
//! Protocol abstraction layers the discovery loop delegates to.
//!
//! The loop never frames RF commands itself; each technology is reached
//! through one of the traits in [`traits`]. Which technologies a loop can
//! poll follows from which PALs were handed to the builder.

/// Scripted PALs
pub mod mock;
/// PAL traits
pub mod traits;

pub use traits::{
    AnticollisionResult, Felica, I14443p3a, I14443p3b, I14443p4, I14443p4a, I18000p3m3,
    I18092mPi, Sli15693,
};

use crate::types::{TechMask, Technology};

/// The PAL capability set bound to one discovery loop.
#[derive(Default)]
pub struct Pals {
    pub i14443p3a: Option<Box<dyn I14443p3a>>,
    pub i14443p4a: Option<Box<dyn I14443p4a>>,
    pub i14443p3b: Option<Box<dyn I14443p3b>>,
    pub i14443p4: Option<Box<dyn I14443p4>>,
    pub felica: Option<Box<dyn Felica>>,
    pub sli15693: Option<Box<dyn Sli15693>>,
    pub i18000p3m3: Option<Box<dyn I18000p3m3>>,
    pub i18092m_pi: Option<Box<dyn I18092mPi>>,
}

impl Pals {
    /// Technologies that can be polled passively with the bound PALs.
    pub fn passive_capabilities(&self) -> TechMask {
        Technology::ALL
            .into_iter()
            .filter(|t| self.supports(*t))
            .collect()
    }

    /// Technologies usable in active P2P mode.
    pub fn active_capabilities(&self) -> TechMask {
        if self.i18092m_pi.is_some() {
            TechMask::ACTIVE_CAPABLE
        } else {
            TechMask::NONE
        }
    }

    /// Registered PALs can poll `tech`.
    pub fn supports(&self, tech: Technology) -> bool {
        match tech {
            Technology::TypeA => self.i14443p3a.is_some(),
            Technology::TypeB => self.i14443p3b.is_some(),
            Technology::TypeF212 | Technology::TypeF424 => self.felica.is_some(),
            Technology::TypeV => self.sli15693.is_some(),
            Technology::I18000p3m3 => self.i18000p3m3.is_some(),
        }
    }
}
