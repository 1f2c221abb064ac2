// discloop/src/discovery/guard_time.rs
//! Guard times waited between switching to a technology and sending its
//! first request.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::Technology;

/// Slot of the guard-time table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardSlot {
    A,
    B,
    F,
    /// Type F polled right after Type B with the field kept on.
    FAfterB,
    /// Type B polled right after Type F with the field kept on.
    BAfterF,
    V,
    I18000p3m3,
    Active,
}

impl GuardSlot {
    const COUNT: usize = 8;

    fn index(self) -> usize {
        self as usize
    }
}

/// Guard times in microseconds, one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardTimeTable {
    slots: [u16; GuardSlot::COUNT],
}

impl Default for GuardTimeTable {
    fn default() -> Self {
        let mut slots = [0u16; GuardSlot::COUNT];
        slots[GuardSlot::A.index()] = TYPEA_GT_US;
        slots[GuardSlot::B.index()] = TYPEB_GT_US;
        slots[GuardSlot::F.index()] = TYPEF_GT_US;
        slots[GuardSlot::FAfterB.index()] = TYPEF_GT_US;
        slots[GuardSlot::BAfterF.index()] = F_TO_B_GT_US;
        slots[GuardSlot::V.index()] = TYPEV_GT_US;
        slots[GuardSlot::I18000p3m3.index()] = I18000P3M3_GT_US;
        slots[GuardSlot::Active.index()] = ACTIVE_GT_US;
        Self { slots }
    }
}

impl GuardTimeTable {
    /// Configured value of `slot` in microseconds.
    pub fn get(&self, slot: GuardSlot) -> u16 {
        self.slots[slot.index()]
    }

    /// The F-after-B slot may not go below the plain Type F guard time.
    pub fn set(&mut self, slot: GuardSlot, micros: u16) -> Result<()> {
        if slot == GuardSlot::FAfterB && micros < TYPEF_GT_US {
            return Err(Error::InvalidParameter("F-after-B guard time below minimum"));
        }
        self.slots[slot.index()] = micros;
        Ok(())
    }

    /// Guard time before polling `tech` when `previous` was the last
    /// technology polled in the same field-on period.
    pub fn guard_time(&self, tech: Technology, previous: Option<Technology>) -> u16 {
        let after_f = previous.is_some_and(Technology::is_type_f);
        let slot = match tech {
            Technology::TypeA => GuardSlot::A,
            Technology::TypeB if after_f => GuardSlot::BAfterF,
            Technology::TypeB => GuardSlot::B,
            Technology::TypeF212 | Technology::TypeF424
                if previous == Some(Technology::TypeB) =>
            {
                GuardSlot::FAfterB
            }
            Technology::TypeF212 | Technology::TypeF424 => GuardSlot::F,
            Technology::TypeV => GuardSlot::V,
            Technology::I18000p3m3 => GuardSlot::I18000p3m3,
        };
        self.get(slot)
    }
}
