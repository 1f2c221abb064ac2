// discloop/src/tech/type_v.rs
//! ISO 15693 inventory with mask extension on collided slots.

use std::collections::VecDeque;

use log::trace;

use crate::constants::{TYPEV_MAX_INVENTORY_ROUNDS, TYPEV_UID_BITS};
use crate::discovery::DiscLoop;
use crate::error::Result;
use crate::target::TypeVTag;
use crate::tech::{Detection, TechnologyPoller, bound, tag_out_of_range};
use crate::types::{Slot, Status, Technology, TypeVMode};

const SLI: &str = "ISO 15693 PAL not bound";

/// Request flag selecting a single-slot inventory.
const FLAG_ONE_SLOT: u8 = 0x20;

/// ISO 15693 poller.
pub struct TypeVPoller;

impl TechnologyPoller for TypeVPoller {
    fn technology(&self) -> Technology {
        Technology::TypeV
    }

    fn detect(&self, dl: &mut DiscLoop) -> Result<Detection> {
        let flags = dl.config.type_v.flags | FLAG_ONE_SLOT;
        let sli = bound(&mut dl.pals.sli15693, SLI)?;
        let result = sli.inventory(flags, 0, 0);
        Detection::from_result(&result)
    }

    fn resolve(&self, dl: &mut DiscLoop) -> Result<bool> {
        let limit = dl.config.device_limit(Technology::TypeV) as usize;
        let flags = dl.config.type_v.flags;
        let sli = bound(&mut dl.pals.sli15693, SLI)?;
        let info = &mut dl.targets.type_v;
        info.tags.clear();
        info.activated = None;

        if !info.collision_pending {
            match sli.inventory(flags | FLAG_ONE_SLOT, 0, 0) {
                Ok(tag) => {
                    info.tags.push(TypeVTag {
                        uid: tag.uid,
                        dsfid: tag.dsfid,
                    });
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

        let mut more = false;
        let mut rounds = 0u8;
        let mut masks = VecDeque::from([(0u64, 0u8)]);
        while let Some((mask, mask_len)) = masks.pop_front() {
            if info.tags.len() >= limit || rounds >= TYPEV_MAX_INVENTORY_ROUNDS {
                more = true;
                break;
            }
            rounds += 1;
            trace!("type V inventory mask {:x}/{}", mask, mask_len);
            let slots = sli.inventory_16(flags & !FLAG_ONE_SLOT, mask, mask_len)?;
            for (i, slot) in slots.into_iter().enumerate() {
                match slot {
                    Slot::Empty => {}
                    Slot::Found(tag) => {
                        if info.tags.iter().any(|t| t.uid == tag.uid) {
                            continue;
                        }
                        if info.tags.len() >= limit {
                            more = true;
                            continue;
                        }
                        info.tags.push(TypeVTag {
                            uid: tag.uid,
                            dsfid: tag.dsfid,
                        });
                    }
                    Slot::Collision if mask_len + 4 < TYPEV_UID_BITS => {
                        masks.push_back((mask | ((i as u64) << mask_len), mask_len + 4));
                    }
                    Slot::Collision => more = true,
                }
            }
        }
        info.total_tags = info.tags.len() as u8;
        Ok(more)
    }

    fn activate(&self, dl: &mut DiscLoop, index: usize) -> Result<Status> {
        let tag = dl
            .targets
            .type_v
            .tags
            .get(index)
            .cloned()
            .ok_or_else(tag_out_of_range)?;
        let mode = dl.config.type_v.mode;
        let sli = bound(&mut dl.pals.sli15693, SLI)?;
        match mode {
            TypeVMode::NonAddressed => {}
            TypeVMode::Addressed => sli.set_uid(&tag.uid)?,
            TypeVMode::Selected => {
                sli.set_uid(&tag.uid)?;
                sli.select(&tag.uid)?;
            }
        }
        dl.targets.type_v.activated = Some(index);
        Ok(Status::DeviceActivated)
    }

    fn is_present(&self, dl: &mut DiscLoop) -> Result<bool> {
        let flags = dl.config.type_v.flags | FLAG_ONE_SLOT;
        let sli = bound(&mut dl.pals.sli15693, SLI)?;
        let result = sli.inventory(flags, 0, 0);
        Ok(Detection::from_result(&result)?.is_detected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::discovery::ConfigKey;
    use crate::error::{Component, ErrorKind, LayerError, LayerResult};
    use crate::hal::MockHal;
    use crate::pal::Sli15693;
    use crate::test_support::MockRig;
    use crate::types::{Uid, VicinityTag};

    const UID_A: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xE0];
    const UID_B: [u8; 8] = [0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xE0];
    const UID_C: [u8; 8] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xE0];

    #[test]
    fn single_tag_without_collision() {
        let rig = MockRig::new();
        rig.sli.add_tag(UID_A, 0x00);
        let mut dl = rig.build();
        assert_eq!(TypeVPoller.detect(&mut dl).unwrap(), Detection::Present);
        assert!(!TypeVPoller.resolve(&mut dl).unwrap());
        assert_eq!(dl.targets().type_v.total_tags, 1);
        assert_eq!(rig.sli.count("inventory_16"), 0);
    }

    #[test]
    fn mask_extension_separates_collided_slot() {
        let rig = MockRig::new();
        rig.sli.add_tag(UID_A, 0x00);
        rig.sli.add_tag(UID_B, 0x00);
        rig.sli.add_tag(UID_C, 0x00);
        let mut dl = rig.build();
        dl.set_config(ConfigKey::TypeVDeviceLimit, 5u8).unwrap();
        assert_eq!(TypeVPoller.detect(&mut dl).unwrap(), Detection::Collision);
        dl.targets.mark_collision(Technology::TypeV);
        assert!(!TypeVPoller.resolve(&mut dl).unwrap());
        assert_eq!(dl.targets().type_v.total_tags, 3);
        // root inventory plus one with a 4-bit mask for slot 1
        assert_eq!(rig.sli.count("inventory_16"), 2);
    }

    #[test]
    fn limit_stops_resolution() {
        let rig = MockRig::new();
        rig.sli.add_tag(UID_A, 0x00);
        rig.sli.add_tag(UID_C, 0x00);
        let mut dl = rig.build();
        TypeVPoller.detect(&mut dl).unwrap();
        dl.targets.mark_collision(Technology::TypeV);
        assert!(TypeVPoller.resolve(&mut dl).unwrap());
        assert_eq!(dl.targets().type_v.total_tags, 1);
    }

    /// Field that answers every slot with a collision.
    #[derive(Clone, Default)]
    struct NoisyField {
        rounds: Rc<Cell<usize>>,
    }

    impl Sli15693 for NoisyField {
        fn inventory(&mut self, _flags: u8, _mask: u64, _mask_len: u8) -> LayerResult<VicinityTag> {
            Err(LayerError::new(Component::Sli15693, ErrorKind::Collision))
        }

        fn inventory_16(
            &mut self,
            _flags: u8,
            _mask: u64,
            _mask_len: u8,
        ) -> LayerResult<Vec<Slot<VicinityTag>>> {
            self.rounds.set(self.rounds.get() + 1);
            Ok(vec![Slot::Collision; 16])
        }

        fn select(&mut self, _uid: &Uid) -> LayerResult<()> {
            Ok(())
        }

        fn set_uid(&mut self, _uid: &Uid) -> LayerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn endless_collisions_are_bounded() {
        let field = NoisyField::default();
        let mut dl = DiscLoop::builder()
            .with_hal(Box::new(MockHal::new()))
            .with_sli15693(Box::new(field.clone()))
            .build()
            .unwrap();
        dl.set_config(ConfigKey::TypeVDeviceLimit, 5u8).unwrap();
        assert_eq!(TypeVPoller.detect(&mut dl).unwrap(), Detection::Collision);
        dl.targets.mark_collision(Technology::TypeV);
        assert!(TypeVPoller.resolve(&mut dl).unwrap());
        assert_eq!(field.rounds.get(), TYPEV_MAX_INVENTORY_ROUNDS as usize);
        assert_eq!(dl.targets().type_v.total_tags, 0);
    }

    #[test]
    fn selected_mode_activation() {
        let rig = MockRig::new();
        rig.sli.add_tag(UID_A, 0x00);
        let mut dl = rig.build();
        dl.set_config(ConfigKey::TypeVMode, 2u8).unwrap();
        TypeVPoller.detect(&mut dl).unwrap();
        TypeVPoller.resolve(&mut dl).unwrap();
        assert_eq!(TypeVPoller.activate(&mut dl, 0).unwrap(), Status::DeviceActivated);
        assert_eq!(rig.sli.selected().unwrap().as_bytes(), &UID_A);
        assert_eq!(dl.targets().type_v.activated, Some(0));
    }
}
