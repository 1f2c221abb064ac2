// discloop/src/tech/type_b.rs
//! ISO 14443-3B slotted anticollision and ATTRIB activation.

use log::trace;

use crate::constants::TYPEB_MAX_SLOT_EXPONENT;
use crate::discovery::DiscLoop;
use crate::error::Result;
use crate::target::{I3p4Info, TypeBTag};
use crate::tech::{Detection, TechnologyPoller, bound, tag_out_of_range};
use crate::types::{OperationMode, Status, Technology};

const P3B: &str = "ISO 14443-3B PAL not bound";

/// ISO 14443 Type B poller.
pub struct TypeBPoller;

impl TechnologyPoller for TypeBPoller {
    fn technology(&self) -> Technology {
        Technology::TypeB
    }

    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection> {
        let afi = dl.config.type_b.afi;
        let ext = dl.config.type_b.extended_atqb;
        let emvco = dl.config.mode == OperationMode::Emvco;
        let p3b = bound(&mut dl.pals.i14443p3b, P3B)?;
        let result = if emvco {
            p3b.wakeup_b(afi, 0, ext)
        } else {
            p3b.request_b(afi, 0, ext)
        };
        Detection::from_result(&result)
    }

    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool> {
        let limit = dl.config.device_limit(Technology::TypeB) as usize;
        let afi = dl.config.type_b.afi;
        let ext = dl.config.type_b.extended_atqb;
        let p3b = bound(&mut dl.pals.i14443p3b, P3B)?;
        let info = &mut dl.targets.type_b;
        info.tags.clear();

        let mut more = false;
        'rounds: for exponent in 0..=TYPEB_MAX_SLOT_EXPONENT {
            let mut collided = false;
            for slot in 1..=(1u8 << exponent) {
                let answer = if slot == 1 {
                    p3b.request_b(afi, exponent, ext)
                } else {
                    p3b.slot_marker(slot)
                };
                let atqb = match answer {
                    Ok(atqb) => atqb,
                    Err(e) if e.is_collision() => {
                        collided = true;
                        continue;
                    }
                    Err(e) if e.is_timeout() => continue,
                    Err(e) => return Err(e.into()),
                };
                let pupi = atqb.pupi();
                if info.tags.iter().any(|t| t.atqb.pupi() == pupi) {
                    continue;
                }
                if info.tags.len() >= limit {
                    more = true;
                    break 'rounds;
                }
                trace!("type B pupi {} in slot {}/{}", crate::utils::bytes_to_hex(&pupi), slot, 1u8 << exponent);
                let halted = info.tags.len() + 1 < limit;
                if halted {
                    p3b.halt_b(&pupi)?;
                }
                info.tags.push(TypeBTag { atqb, halted });
            }
            more = collided;
            if !collided {
                break;
            }
        }
        info.total_tags = info.tags.len() as u8;
        Ok(more)
    }

    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status> {
        let tag = dl
            .targets
            .type_b
            .tags
            .get(index)
            .cloned()
            .ok_or_else(tag_out_of_range)?;
        let cfg = dl.config.type_b.clone();
        let p3b = bound(&mut dl.pals.i14443p3b, P3B)?;
        if tag.halted {
            match p3b.wakeup_b(cfg.afi, 0, cfg.extended_atqb) {
                Ok(_) => {}
                Err(e) if e.is_collision() => {}
                Err(e) => return Err(e.into()),
            }
        }
        let r = cfg.i3p4;
        p3b.attrib(&tag.atqb, r.fsdi, r.cid, r.dri, r.dsi)?;
        let params = p3b.protocol_params()?;
        bound(&mut dl.pals.i14443p4, "ISO 14443-4 PAL not bound")?.set_protocol(&params)?;

        dl.targets.type_b.tags[index].halted = false;
        dl.targets.type_b.i3p4 = I3p4Info {
            fsdi: r.fsdi,
            cid: r.cid,
            dri: r.dri,
            dsi: r.dsi,
            ats: Vec::new(),
            negotiated: Some(params),
        };
        Ok(Status::DeviceActivated)
    }

    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool> {
        let afi = dl.config.type_b.afi;
        let ext = dl.config.type_b.extended_atqb;
        let active: Vec<[u8; 4]> = dl
            .targets
            .type_b
            .tags
            .iter()
            .filter(|t| !t.halted)
            .map(|t| t.atqb.pupi())
            .collect();
        let p3b = bound(&mut dl.pals.i14443p3b, P3B)?;
        for pupi in &active {
            match p3b.halt_b(pupi) {
                Ok(()) => {}
                Err(e) if e.is_timeout() => {}
                Err(e) => return Err(e.into()),
            }
        }
        let result = p3b.wakeup_b(afi, 0, ext);
        let present = Detection::from_result(&result)?.is_detected();
        if let Ok(atqb) = result {
            p3b.halt_b(&atqb.pupi())?;
        }
        Ok(present)
    }
}
