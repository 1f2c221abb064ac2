// discloop/src/tech/i18000p3m3.rs
//! ISO 18000-3 mode 3 inventory rounds.

use log::trace;

use crate::constants::{I18000P3M3_MAX_Q, I18000P3M3_MAX_ROUNDS};
use crate::discovery::DiscLoop;
use crate::error::Result;
use crate::target::I18000p3m3Tag;
use crate::tech::{Detection, TechnologyPoller, bound, tag_out_of_range};
use crate::types::{Slot, Status, Technology};

const PAL: &str = "ISO 18000-3m3 PAL not bound";

/// Q of the first round after a collided BeginRound.
const INITIAL_Q: u8 = 2;

/// ISO 18000-3m3 poller.
pub struct I18000p3m3Poller;

impl TechnologyPoller for I18000p3m3Poller {
    fn technology(&self) -> Technology {
        Technology::I18000p3m3
    }

    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection> {
        let pal = bound(&mut dl.pals.i18000p3m3, PAL)?;
        let result = pal.begin_round();
        Detection::from_result(&result)
    }

    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool> {
        let limit = dl.config.device_limit(Technology::I18000p3m3) as usize;
        let pal = bound(&mut dl.pals.i18000p3m3, PAL)?;
        let info = &mut dl.targets.i18000p3m3;
        info.tags.clear();

        if !info.collision_pending {
            match pal.begin_round() {
                Ok(uii) => {
                    info.tags.push(I18000p3m3Tag { uii, handle: None });
                    info.total_tags = 1;
                    return Ok(false);
                }
                Err(e) if e.is_timeout() => {
                    info.total_tags = 0;
                    return Ok(false);
                }
                Err(e) if e.is_collision() => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut q = INITIAL_Q;
        let mut more = true;
        for _ in 0..I18000P3M3_MAX_ROUNDS {
            trace!("18000-3m3 inventory round q={}", q);
            let slots = pal.inventory_round(q)?;
            let mut collided = false;
            for slot in slots {
                match slot {
                    Slot::Empty => {}
                    Slot::Collision => collided = true,
                    Slot::Found(uii) => {
                        if info.tags.iter().any(|t| t.uii == uii) {
                            continue;
                        }
                        if info.tags.len() >= limit {
                            collided = true;
                            continue;
                        }
                        info.tags.push(I18000p3m3Tag { uii, handle: None });
                    }
                }
            }
            more = collided;
            if !collided || info.tags.len() >= limit {
                break;
            }
            q = (q + 1).min(I18000P3M3_MAX_Q);
        }
        info.total_tags = info.tags.len() as u8;
        Ok(more)
    }

    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status> {
        let uii = dl
            .targets
            .i18000p3m3
            .tags
            .get(index)
            .map(|t| t.uii.clone())
            .ok_or_else(tag_out_of_range)?;
        let handle = bound(&mut dl.pals.i18000p3m3, PAL)?.req_rn(&uii)?;
        dl.targets.i18000p3m3.tags[index].handle = Some(handle);
        Ok(Status::DeviceActivated)
    }

    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool> {
        let pal = bound(&mut dl.pals.i18000p3m3, PAL)?;
        let result = pal.begin_round();
        Ok(Detection::from_result(&result)?.is_detected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ConfigKey;
    use crate::test_support::MockRig;

    #[test]
    fn rounds_raise_q_until_separated() {
        let rig = MockRig::new();
        // sums 4 and 8 share a slot at Q=2 and separate at Q=3
        rig.i18000.add_tag(&[0x30, 0x00, 0x04]);
        rig.i18000.add_tag(&[0x30, 0x00, 0x08]);
        let mut dl = rig.build();
        dl.set_config(ConfigKey::I18000p3m3DeviceLimit, 4u8).unwrap();
        assert_eq!(I18000p3m3Poller.detect(&mut dl).unwrap(), Detection::Collision);
        dl.targets.mark_collision(Technology::I18000p3m3);
        assert!(!I18000p3m3Poller.resolve(&mut dl).unwrap());
        assert_eq!(dl.targets().i18000p3m3.total_tags, 2);
        assert_eq!(rig.i18000.count("inventory_round"), 2);
    }

    #[test]
    fn activation_stores_handle() {
        let rig = MockRig::new();
        rig.i18000.add_tag(&[0x30, 0x00, 0x01]);
        let mut dl = rig.build();
        I18000p3m3Poller.detect(&mut dl).unwrap();
        I18000p3m3Poller.resolve(&mut dl).unwrap();
        assert_eq!(I18000p3m3Poller.activate(&mut dl, 0).unwrap(), Status::DeviceActivated);
        assert_eq!(dl.targets().i18000p3m3.tags[0].handle, Some(0x1000));
    }
}
