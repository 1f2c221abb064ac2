// discloop/src/tech/type_f.rs
//! FeliCa / NFC-F polling at 212 and 424 kbps.

use log::trace;

use crate::discovery::DiscLoop;
use crate::error::Result;
use crate::target::{FelicaBaud, P2pInfo, TypeFTag};
use crate::tech::{Detection, TechnologyPoller, bound, tag_out_of_range};
use crate::types::{AtrRequest, Idm, Status, SystemCode, Technology};

const FELICA: &str = "FeliCa PAL not bound";
const PI: &str = "ISO 18092 PAL not bound";

/// FeliCa poller for one bit rate.
pub struct TypeFPoller {
    tech: Technology,
}

impl TypeFPoller {
    /// Poller for `TypeF212` or `TypeF424`.
    pub fn new(tech: Technology) -> Self {
        Self { tech }
    }

    fn baud(&self) -> FelicaBaud {
        match self.tech {
            Technology::TypeF424 => FelicaBaud::Kbps424,
            _ => FelicaBaud::Kbps212,
        }
    }
}

/// NFCID3 for a passive Type F ATR_REQ: the IDm followed by two zero bytes.
fn nfcid3_from_idm(idm: &Idm) -> [u8; 10] {
    let mut nfcid3 = [0u8; 10];
    nfcid3[..8].copy_from_slice(idm.as_bytes());
    nfcid3
}

impl TechnologyPoller for TypeFPoller {
    fn technology(&self) -> Technology {
        self.tech
    }

    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection> {
        let felica = bound(&mut dl.pals.felica, FELICA)?;
        let result = felica.request_c(SystemCode::ANY, 0, 0);
        Detection::from_result(&result)
    }

    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool> {
        let limit = dl.config.device_limit(self.tech) as usize;
        let system_code = dl.config.type_f.system_code;
        let time_slot = dl.config.type_f.time_slot;
        let felica = bound(&mut dl.pals.felica, FELICA)?;
        let info = &mut dl.targets.type_f;
        info.tags.clear();

        let responses = match felica.request_c(system_code, 0, time_slot) {
            Ok(responses) => responses,
            // every answer was lost to a collision
            Err(e) if e.is_collision() => {
                info.total_tags = 0;
                return Ok(true);
            }
            Err(e) if e.is_timeout() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut more = false;
        for r in responses {
            if info.tags.iter().any(|t| t.idm == r.idm) {
                continue;
            }
            if info.tags.len() >= limit {
                more = true;
                break;
            }
            trace!("type F idm {} at {:?}", r.idm.to_hex(), self.baud());
            info.tags.push(TypeFTag {
                idm: r.idm,
                pmm: r.pmm,
                baud: self.baud(),
                sleep_af: false,
            });
        }
        info.total_tags = info.tags.len() as u8;
        Ok(more)
    }

    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status> {
        let tag = dl
            .targets
            .type_f
            .tags
            .get(index)
            .cloned()
            .ok_or_else(tag_out_of_range)?;

        if !tag.idm.is_nfc_dep() {
            bound(&mut dl.pals.felica, FELICA)?.activate_card(&tag.idm, &tag.pmm)?;
            return Ok(Status::DeviceActivated);
        }

        let p2p = dl.config.type_f.p2p.clone();
        let nfcid3 = nfcid3_from_idm(&tag.idm);
        let pi = bound(&mut dl.pals.i18092m_pi, PI)?;
        if tag.sleep_af {
            pi.wakeup(&nfcid3, p2p.did)?;
            dl.targets.type_f.tags[index].sleep_af = false;
            return Ok(Status::PassiveTargetActivated);
        }

        let atr_res = pi.atr(&AtrRequest {
            nfcid3,
            did: p2p.did,
            lri: p2p.lri,
            nad_enabled: p2p.nad_enabled,
            nad: p2p.nad,
            general_bytes: p2p.general_bytes.clone(),
        })?;
        dl.targets.type_f.p2p = P2pInfo {
            did: p2p.did,
            lri: p2p.lri,
            nad_enabled: p2p.nad_enabled,
            nad: p2p.nad,
            general_bytes: p2p.general_bytes,
            atr_res,
        };
        Ok(Status::PassiveTargetActivated)
    }

    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool> {
        let felica = bound(&mut dl.pals.felica, FELICA)?;
        let result = felica.request_c(SystemCode::ANY, 0, 0);
        Ok(Detection::from_result(&result)?.is_detected())
    }
}
