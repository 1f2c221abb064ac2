// discloop/src/discovery/activation.rs
//! Activation of a resolved tag and deactivation of passive P2P targets.

use log::debug;

use crate::discovery::DiscLoop;
use crate::error::{Error, Result};
use crate::hal::RfMode;
use crate::tech::{bound, create_poller_for};
use crate::types::{Status, Technology};

pub(crate) fn activate(dl: &mut DiscLoop, tech: Technology, index: usize) -> Result<Status> {
    if !dl.pals.supports(tech) {
        return Err(Error::InvalidParameter("technology not supported"));
    }
    if index >= dl.targets.total_tags(tech) as usize {
        return Err(Error::InvalidParameter("tag index out of range"));
    }
    if dl.last_polled != Some(tech) {
        dl.hal.apply_protocol_settings(RfMode::passive(tech))?;
        if !dl.rf_on()? {
            return Ok(Status::ExternalRfOn);
        }
        let gt = dl.guard.guard_time(tech, None);
        dl.wait_us(gt)?;
        dl.last_polled = Some(tech);
    }
    let status = create_poller_for(tech).activate(dl, index)?;
    debug!("{} tag {} activated: {}", tech, index, status);
    Ok(status)
}

impl DiscLoop {
    /// Activate the tag stored at `index` for `tech`.
    pub fn activate_card(&mut self, tech: Technology, index: u8) -> Result<Status> {
        let result = activate(self, tech, index as usize);
        self.record(result)
    }

    /// Put a passive Type F P2P target to sleep (DSL_REQ) or release it
    /// (RLS_REQ). A sleeping target is woken with WUP_REQ by the next
    /// activation instead of a new ATR_REQ.
    pub fn deactivate_target(&mut self, tech: Technology, index: u8, sleep: bool) -> Result<()> {
        if !tech.is_type_f() {
            return Err(Error::InvalidParameter("only passive Type F targets can be deactivated"));
        }
        let tag = self
            .targets
            .type_f
            .tags
            .get(index as usize)
            .ok_or(Error::InvalidParameter("tag index out of range"))?;
        if !tag.idm.is_nfc_dep() {
            return Err(Error::InvalidParameter("tag is not an NFC-DEP target"));
        }
        let result = bound(&mut self.pals.i18092m_pi, "ISO 18092 PAL not bound")
            .and_then(|pi| pi.deselect(sleep).map_err(Error::from));
        if let Err(Error::Failure(e)) = &result {
            self.error = Some(*e);
        }
        result?;
        self.targets.type_f.tags[index as usize].sleep_af = sleep;
        Ok(())
    }
}
