//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the mock HAL/PAL setup so tests across the
//! crate and the tests/ directory can reuse the same rig.
#![allow(dead_code)]

use crate::discovery::DiscLoop;
use crate::hal::MockHal;
use crate::pal::Pals;
use crate::pal::mock::{
    MockFelica, MockI14443p3a, MockI14443p3b, MockI14443p4, MockI14443p4a, MockI18000p3m3,
    MockI18092mPi, MockSli15693,
};
use crate::types::{TechMask, Technology};

/// One mock per collaborator. The rig keeps a handle on each so a test
/// can seed cards and inspect calls after the loop took ownership.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct MockRig {
    pub hal: MockHal,
    pub p3a: MockI14443p3a,
    pub p4a: MockI14443p4a,
    pub p3b: MockI14443p3b,
    pub p4: MockI14443p4,
    pub felica: MockFelica,
    pub sli: MockSli15693,
    pub i18000: MockI18000p3m3,
    pub pi: MockI18092mPi,
    passive: TechMask,
    p2p: bool,
}

impl Default for MockRig {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRig {
    /// Every PAL bound.
    pub fn new() -> Self {
        Self::with_technologies(TechMask::ALL, true)
    }

    /// Only the Type A PALs bound, no P2P initiator.
    pub fn type_a_only() -> Self {
        Self::with_technologies(TechMask::A, false)
    }

    /// Rig whose HAL only advertises `passive` (plus active P2P when `p2p`).
    pub fn with_technologies(passive: TechMask, p2p: bool) -> Self {
        Self {
            hal: MockHal::new(),
            p3a: MockI14443p3a::new(),
            p4a: MockI14443p4a::new(),
            p3b: MockI14443p3b::new(),
            p4: MockI14443p4::new(),
            felica: MockFelica::new(),
            sli: MockSli15693::new(),
            i18000: MockI18000p3m3::new(),
            pi: MockI18092mPi::new(),
            passive,
            p2p,
        }
    }

    /// PAL set sharing state with the rig's handles.
    pub fn pals(&self) -> Pals {
        let has = |t: Technology| self.passive.contains(t);
        let iso4 = has(Technology::TypeA) || has(Technology::TypeB);
        Pals {
            i14443p3a: has(Technology::TypeA).then(|| Box::new(self.p3a.clone()) as _),
            i14443p4a: has(Technology::TypeA).then(|| Box::new(self.p4a.clone()) as _),
            i14443p3b: has(Technology::TypeB).then(|| Box::new(self.p3b.clone()) as _),
            i14443p4: iso4.then(|| Box::new(self.p4.clone()) as _),
            felica: (has(Technology::TypeF212) || has(Technology::TypeF424))
                .then(|| Box::new(self.felica.clone()) as _),
            sli15693: has(Technology::TypeV).then(|| Box::new(self.sli.clone()) as _),
            i18000p3m3: has(Technology::I18000p3m3).then(|| Box::new(self.i18000.clone()) as _),
            i18092m_pi: self.p2p.then(|| Box::new(self.pi.clone()) as _),
        }
    }

    /// Loop wired to clones of every mock in the rig.
    pub fn build(&self) -> DiscLoop {
        DiscLoop::new(Box::new(self.hal.clone()), self.pals())
    }
}
