// discloop/src/discovery/active.rs
//! Active-mode P2P polling, tried before passive polling.

use log::{debug, trace};

use crate::discovery::config::P2pConfig;
use crate::discovery::{DiscLoop, GuardSlot};
use crate::error::Result;
use crate::hal::RfMode;
use crate::target::P2pInfo;
use crate::tech::bound;
use crate::utils::bytes_to_hex_spaced;
use crate::types::{AtrRequest, Status, TechMask, Technology};

const ACTIVE_ORDER: [Technology; 3] = [Technology::TypeA, Technology::TypeF212, Technology::TypeF424];

fn atr_request(p2p: &P2pConfig) -> AtrRequest {
    AtrRequest {
        // all zero: the initiator PAL picks a random NFCID3
        nfcid3: [0; 10],
        did: p2p.did,
        lri: p2p.lri,
        nad_enabled: p2p.nad_enabled,
        nad: p2p.nad,
        general_bytes: p2p.general_bytes.clone(),
    }
}

/// Try each enabled active technology. `Ok(None)` means no peer answered
/// and passive polling should follow.
pub(crate) fn poll_active(dl: &mut DiscLoop) -> Result<Option<Status>> {
    dl.targets.clear();
    for tech in ACTIVE_ORDER {
        if !dl.config.act_poll.contains(tech) {
            continue;
        }
        let Some(mode) = RfMode::active(tech) else {
            continue;
        };
        trace!("active poll {}", tech);
        dl.rf_off()?;
        dl.wait_us(dl.guard.get(GuardSlot::Active))?;
        dl.hal.apply_protocol_settings(mode)?;
        if !dl.rf_on()? {
            return Ok(Some(Status::ExternalRfOn));
        }

        let p2p = if tech == Technology::TypeA {
            dl.config.type_a.p2p.clone()
        } else {
            dl.config.type_f.p2p.clone()
        };
        let request = atr_request(&p2p);
        let pi = bound(&mut dl.pals.i18092m_pi, "ISO 18092 PAL not bound")?;
        match pi.atr(&request) {
            Ok(atr_res) => {
                debug!("active target at {}", tech);
                trace!("ATR_RES {}", bytes_to_hex_spaced(&atr_res));
                let info = P2pInfo {
                    did: p2p.did,
                    lri: p2p.lri,
                    nad_enabled: p2p.nad_enabled,
                    nad: p2p.nad,
                    general_bytes: p2p.general_bytes,
                    atr_res,
                };
                if tech == Technology::TypeA {
                    dl.targets.type_a.p2p = info;
                } else {
                    dl.targets.type_f.p2p = info;
                }
                dl.detected = TechMask::from(tech);
                dl.num_of_cards = 1;
                return Ok(Some(Status::ActiveTargetActivated));
            }
            Err(e) if e.is_timeout() => continue,
            Err(e) if e.is_external_rf_on() => return Ok(Some(Status::ExternalRfOn)),
            Err(e) => return Err(e.into()),
        }
    }
    dl.rf_off()?;
    Ok(None)
}
