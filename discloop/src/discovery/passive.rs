// discloop/src/discovery/passive.rs
//! Passive polling: technology detection, collision resolution, and the
//! removal check.

use log::{debug, trace};

use crate::discovery::{DiscLoop, activation};
use crate::error::Result;
use crate::hal::RfMode;
use crate::tech::{Detection, create_poller_for};
use crate::types::{OperationMode, PollState, Status, TechMask, Technology};

pub(crate) fn poll_passive(dl: &mut DiscLoop) -> Result<Status> {
    match dl.poll_state {
        PollState::Detection => detect(dl),
        PollState::CollisionResolution => match resolution_target(dl) {
            Some(tech) => resolve(dl, tech),
            None => detect(dl),
        },
        PollState::Removal => removal(dl),
    }
}

/// Technologies that may be polled passively right now.
fn enabled(dl: &DiscLoop) -> TechMask {
    let mut techs = dl
        .config
        .pas_poll
        .intersection(dl.pals.passive_capabilities());
    if dl.config.mode == OperationMode::Emvco {
        techs = techs.intersection(TechMask::EMVCO);
    }
    techs
}

/// First technology in poll order that was detected and is still enabled.
/// The caller narrows `PasPollTechCfg` after `MultiTechDetected` to pick
/// the technology to resolve.
fn resolution_target(dl: &DiscLoop) -> Option<Technology> {
    let techs = enabled(dl);
    dl.sequence
        .iter()
        .find(|t| dl.detected.contains(*t) && techs.contains(*t))
}

/// Load `tech`'s settings, make sure the field is on and wait the guard
/// time. `Ok(false)` when an external field keeps ours off.
fn switch_to(dl: &mut DiscLoop, tech: Technology) -> Result<bool> {
    dl.hal.apply_protocol_settings(RfMode::passive(tech))?;
    let previous = if dl.field_on { dl.last_polled } else { None };
    if !dl.rf_on()? {
        return Ok(false);
    }
    let gt = dl.guard.guard_time(tech, previous);
    dl.wait_us(gt)?;
    dl.last_polled = Some(tech);
    Ok(true)
}

fn detect(dl: &mut DiscLoop) -> Result<Status> {
    dl.targets.clear();
    dl.detected = TechMask::NONE;
    dl.num_of_cards = 0;
    dl.collision_pending = false;
    if dl.field_on {
        dl.rf_off()?;
    }

    let techs = enabled(dl);
    let order: Vec<Technology> = dl.sequence.iter().filter(|t| techs.contains(*t)).collect();
    for tech in order {
        if !switch_to(dl, tech)? {
            return Ok(Status::ExternalRfOn);
        }
        let detection = create_poller_for(tech).detect(dl)?;
        trace!("{}: {:?}", tech, detection);
        if !detection.is_detected() {
            continue;
        }
        dl.detected.insert(tech);
        if detection == Detection::Collision {
            dl.targets.mark_collision(tech);
            dl.collision_pending = true;
        }
        if dl.config.bail_out.contains(tech) {
            debug!("bail-out on {}", tech);
            break;
        }
    }

    let Some(tech) = resolution_target(dl) else {
        dl.rf_off()?;
        return Ok(Status::NoTechDetected);
    };
    if dl.detected.count() > 1 {
        return Ok(if dl.config.mode == OperationMode::Emvco {
            Status::CollisionPending
        } else {
            Status::MultiTechDetected
        });
    }
    if dl.collision_pending && !dl.config.anti_coll {
        return Ok(Status::CollisionPending);
    }
    resolve(dl, tech)
}

fn resolve(dl: &mut DiscLoop, tech: Technology) -> Result<Status> {
    let poller = create_poller_for(tech);
    if dl.last_polled != Some(tech) {
        // cards left the ready state while other technologies were polled
        if !switch_to(dl, tech)? {
            return Ok(Status::ExternalRfOn);
        }
        match poller.detect(dl)? {
            Detection::Absent => {
                dl.num_of_cards = 0;
                return Ok(Status::NoDeviceResolved);
            }
            Detection::Collision => dl.targets.mark_collision(tech),
            Detection::Present => {}
        }
    }
    if dl.targets.collision_pending(tech) && !dl.config.anti_coll {
        return Ok(Status::CollisionPending);
    }

    let more = poller.resolve(dl)?;
    let found = dl.targets.total_tags(tech);
    dl.num_of_cards = found;
    debug!("{}: {} device(s) resolved, more: {}", tech, found, more);

    if dl.config.mode == OperationMode::Emvco && (more || found > 1) {
        return Ok(Status::CollisionPending);
    }
    match found {
        0 => Ok(Status::NoDeviceResolved),
        1 if more => Ok(Status::DeviceResolved),
        1 => activation::activate(dl, tech, 0),
        _ => Ok(Status::MultiDeviceResolved),
    }
}

fn removal(dl: &mut DiscLoop) -> Result<Status> {
    let techs: Vec<Technology> = dl.sequence.iter().filter(|t| dl.detected.contains(*t)).collect();
    for tech in techs {
        if !switch_to(dl, tech)? {
            return Ok(Status::ExternalRfOn);
        }
        if create_poller_for(tech).is_present(dl)? {
            trace!("{} still in the field", tech);
            return Ok(Status::TechDetected);
        }
    }
    dl.rf_off()?;
    dl.detected = TechMask::NONE;
    dl.num_of_cards = 0;
    Ok(Status::NoTechDetected)
}
