// discloop/src/tech/type_a.rs
//! ISO 14443-3A polling, cascade anticollision and activation (ISO-DEP,
//! NFC-DEP, Jewel).

use log::{debug, trace};

use crate::constants::*;
use crate::discovery::DiscLoop;
use crate::error::{Component, Error, ErrorKind, LayerError, LayerResult, Result};
use crate::pal::{I14443p3a, I18092mPi};
use crate::target::{I3p4Info, P2pInfo, TypeATag};
use crate::tech::{Detection, TechnologyPoller, bound, tag_out_of_range};
use crate::types::{Atqa, AtrRequest, CascadeLevel, OperationMode, Status, Technology, Uid};

const P3A: &str = "ISO 14443-3A PAL not bound";

/// ISO 14443 Type A poller.
pub struct TypeAPoller;

/// Run anticollision and SELECT through the cascade levels for the card
/// that wins every bit collision. Returns the assembled UID, the final
/// SAK, and whether any collision was seen on the way.
fn select_cascade(p3a: &mut dyn I14443p3a) -> LayerResult<(Uid, u8, bool)> {
    let mut uid = Vec::with_capacity(10);
    let mut collided = false;
    for level in CascadeLevel::ALL {
        let ac = p3a.anticollision(level)?;
        collided |= ac.collision_seen;
        let sak = p3a.select(level, &ac.uid_cl)?;
        if sak & SAK_CASCADE_BIT != 0 {
            uid.extend_from_slice(&ac.uid_cl[1..]);
        } else {
            uid.extend_from_slice(&ac.uid_cl);
            return Ok((Uid::from_bytes(uid), sak, collided));
        }
    }
    Err(LayerError::new(Component::I14443p3a, ErrorKind::Protocol))
}

/// UID CLn sent with SELECT at `level` for a complete UID.
fn uid_cl(uid: &[u8], level: usize) -> Option<[u8; 4]> {
    let levels = match uid.len() {
        4 => 1,
        7 => 2,
        10 => 3,
        _ => return None,
    };
    if level >= levels {
        return None;
    }
    if level + 1 == levels {
        let s = uid.len() - 4;
        Some([uid[s], uid[s + 1], uid[s + 2], uid[s + 3]])
    } else {
        let s = level * 3;
        Some([CASCADE_TAG, uid[s], uid[s + 1], uid[s + 2]])
    }
}

/// WUPA and SELECT a known UID without anticollision.
fn reselect(p3a: &mut dyn I14443p3a, uid: &Uid) -> Result<u8> {
    match p3a.wakeup_a() {
        Ok(_) => {}
        Err(e) if e.is_collision() => {}
        Err(e) => return Err(e.into()),
    }
    let mut sak = 0;
    for (i, level) in CascadeLevel::ALL.into_iter().enumerate() {
        let Some(cl) = uid_cl(uid.as_bytes(), i) else {
            break;
        };
        sak = p3a.select(level, &cl)?;
    }
    Ok(sak)
}

/// NFCID3 for a passive Type A ATR_REQ: NFCID1 left aligned, zero padded.
fn nfcid3_from_uid(uid: &Uid) -> [u8; 10] {
    let mut nfcid3 = [0u8; 10];
    for (dst, src) in nfcid3.iter_mut().zip(uid.as_bytes()) {
        *dst = *src;
    }
    nfcid3
}

impl TechnologyPoller for TypeAPoller {
    fn technology(&self) -> Technology {
        Technology::TypeA
    }

    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection> {
        let emvco = dl.config.mode == OperationMode::Emvco;
        let p3a = bound(&mut dl.pals.i14443p3a, P3A)?;
        let result = if emvco { p3a.wakeup_a() } else { p3a.request_a() };
        let detection = Detection::from_result(&result)?;
        if let Ok(atqa) = result {
            dl.targets.type_a.atqa = atqa;
            #[cfg(feature = "jewel")]
            {
                dl.targets.type_a.jewel = atqa.is_jewel();
            }
        }
        Ok(detection)
    }

    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool> {
        let limit = dl.config.device_limit(Technology::TypeA) as usize;
        let p3a = bound(&mut dl.pals.i14443p3a, P3A)?;
        let info = &mut dl.targets.type_a;
        info.tags.clear();
        info.selected = None;

        #[cfg(feature = "jewel")]
        if info.jewel {
            let rid = p3a.read_jewel_id()?;
            debug!("jewel tag {}", crate::utils::bytes_to_hex(&rid));
            info.tags.push(TypeATag {
                atqa: info.atqa,
                uid: Uid::from_bytes(rid.to_vec()),
                sak: 0,
            });
            info.total_tags = 1;
            info.selected = Some(0);
            return Ok(false);
        }

        let mut atqa = info.atqa;
        let mut more = info.collision_pending;
        loop {
            let (uid, sak, collided) = match select_cascade(p3a) {
                Ok(found) => found,
                Err(e) if e.is_timeout() => break,
                Err(e) => return Err(e.into()),
            };
            more |= collided;
            trace!("type A uid {} sak {:02x}", uid.to_hex(), sak);
            if !info.tags.iter().any(|t| t.uid == uid) {
                info.tags.push(TypeATag { atqa, uid, sak });
            }
            info.selected = Some(info.tags.len() - 1);
            if info.tags.len() >= limit || !more {
                break;
            }

            p3a.halt_a()?;
            info.selected = None;
            more = false;
            atqa = match p3a.request_a() {
                Ok(atqa) => atqa,
                Err(e) if e.is_collision() => {
                    more = true;
                    Atqa::default()
                }
                Err(e) if e.is_timeout() => break,
                Err(e) => return Err(e.into()),
            };
        }
        info.total_tags = info.tags.len() as u8;
        Ok(more)
    }

    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status> {
        let tag = dl
            .targets
            .type_a
            .tags
            .get(index)
            .cloned()
            .ok_or_else(tag_out_of_range)?;
        let mode = dl.config.mode;

        if dl.targets.type_a.jewel {
            return Ok(Status::DeviceActivated);
        }
        if dl.targets.type_a.selected != Some(index) {
            let p3a = bound(&mut dl.pals.i14443p3a, P3A)?;
            reselect(p3a, &tag.uid)?;
            dl.targets.type_a.selected = Some(index);
        }

        let sak = tag.sak;
        if sak & SAK_MERGED == SAK_MERGED && mode == OperationMode::Nfc {
            debug!("merged SEL_RES {:02x}, left to the caller", sak);
            return Ok(Status::MergedSelResFound);
        }

        if sak & SAK_ISO14443_4 != 0 {
            let requested = dl.config.type_a.i3p4;
            let p4a = bound(&mut dl.pals.i14443p4a, "ISO 14443-4A PAL not bound")?;
            let ats = p4a.rats(requested.fsdi, requested.cid)?;
            if requested.dri != 0 || requested.dsi != 0 {
                p4a.pps(requested.dri, requested.dsi)?;
            }
            let params = p4a.protocol_params()?;
            bound(&mut dl.pals.i14443p4, "ISO 14443-4 PAL not bound")?.set_protocol(&params)?;
            dl.targets.type_a.i3p4 = I3p4Info {
                fsdi: requested.fsdi,
                cid: requested.cid,
                dri: requested.dri,
                dsi: requested.dsi,
                ats,
                negotiated: Some(params),
            };
            return Ok(Status::DeviceActivated);
        }

        if mode == OperationMode::Emvco {
            // EMVCo accepts ISO-DEP cards only
            return Err(Error::Failure(LayerError::new(
                Component::DiscLoop,
                ErrorKind::Protocol,
            )));
        }

        if sak & SAK_NFC_DEP != 0 {
            let p2p = &dl.config.type_a.p2p;
            let request = AtrRequest {
                nfcid3: nfcid3_from_uid(&tag.uid),
                did: p2p.did,
                lri: p2p.lri,
                nad_enabled: p2p.nad_enabled,
                nad: p2p.nad,
                general_bytes: p2p.general_bytes.clone(),
            };
            let pi: &mut dyn I18092mPi = bound(&mut dl.pals.i18092m_pi, "ISO 18092 PAL not bound")?;
            let atr_res = pi.atr(&request)?;
            dl.targets.type_a.p2p = P2pInfo {
                did: request.did,
                lri: request.lri,
                nad_enabled: request.nad_enabled,
                nad: request.nad,
                general_bytes: request.general_bytes,
                atr_res,
            };
            return Ok(Status::PassiveTargetActivated);
        }

        Ok(Status::DeviceActivated)
    }

    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool> {
        let p3a = bound(&mut dl.pals.i14443p3a, P3A)?;
        // a card left ACTIVE by activation ignores WUPA until halted
        p3a.halt_a()?;
        let result = p3a.wakeup_a();
        let present = Detection::from_result(&result)?.is_detected();
        if present {
            p3a.halt_a()?;
        }
        Ok(present)
    }
}
