// discloop/src/discovery/mod.rs
//! The discovery loop: poll, resolve, activate, listen.
//!
//! A [`DiscLoop`] owns the HAL and the PAL capability set it was built
//! with. Every call to [`DiscLoop::run`] performs one step of the state
//! machine selected by the poll state and returns a [`Status`]; the caller
//! inspects it, adjusts the poll state through the configuration, and
//! calls again.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::hal::{Hal, HalConfig, WaitUnit};
use crate::pal::Pals;
use crate::target::TargetInfo;
use crate::types::{EntryPoint, ListenActivation, PollState, Status, TechMask, Technology};

mod active;
mod activation;
/// Construction of a `DiscLoop`
pub mod builder;
/// Configuration keys and validation
pub mod config;
/// Guard times per technology
pub mod guard_time;
mod listen;
mod passive;
/// Passive poll order
pub mod sequence;

pub use builder::DiscLoopBuilder;
pub use config::{Config, ConfigKey, ConfigValue, I3p4Config, P2pConfig};
pub use guard_time::{GuardSlot, GuardTimeTable};
pub use sequence::PollSequence;

/// Discovery loop instance. Build one with [`DiscLoop::builder`].
pub struct DiscLoop {
    pub(crate) hal: Box<dyn Hal>,
    pub(crate) pals: Pals,
    pub(crate) config: Config,
    pub(crate) guard: GuardTimeTable,
    pub(crate) sequence: PollSequence,
    pub(crate) targets: TargetInfo,
    pub(crate) poll_state: PollState,
    pub(crate) detected: TechMask,
    pub(crate) num_of_cards: u8,
    pub(crate) collision_pending: bool,
    pub(crate) error: Option<crate::error::LayerError>,
    pub(crate) listen: Option<ListenActivation>,
    /// Whether our own field is on, as far as the loop switched it.
    pub(crate) field_on: bool,
    /// Technology whose protocol settings are loaded.
    pub(crate) last_polled: Option<Technology>,
}

impl std::fmt::Debug for DiscLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscLoop")
            .field("config", &self.config)
            .field("poll_state", &self.poll_state)
            .field("detected", &self.detected)
            .field("num_of_cards", &self.num_of_cards)
            .field("error", &self.error)
            .field("field_on", &self.field_on)
            .finish_non_exhaustive()
    }
}

impl DiscLoop {
    /// Bind a HAL and a PAL set. The loop starts initialized.
    pub fn new(hal: Box<dyn Hal>, pals: Pals) -> Self {
        let config = Config::with_capabilities(pals.passive_capabilities());
        let mut dl = Self {
            hal,
            pals,
            config,
            guard: GuardTimeTable::default(),
            sequence: PollSequence::default(),
            targets: TargetInfo::default(),
            poll_state: PollState::Detection,
            detected: TechMask::NONE,
            num_of_cards: 0,
            collision_pending: false,
            error: None,
            listen: None,
            field_on: false,
            last_polled: None,
        };
        dl.init();
        dl
    }

    /// Start wiring a loop.
    pub fn builder() -> DiscLoopBuilder {
        DiscLoopBuilder::new()
    }

    /// Reset configuration, guard times, poll sequence, target info and
    /// runtime state to their defaults. PALs keep their own state.
    pub fn init(&mut self) {
        self.config = Config::with_capabilities(self.pals.passive_capabilities());
        self.guard = GuardTimeTable::default();
        self.sequence = PollSequence::default();
        self.targets.clear();
        self.poll_state = PollState::Detection;
        self.detected = TechMask::NONE;
        self.num_of_cards = 0;
        self.collision_pending = false;
        self.error = None;
        self.listen = None;
    }

    /// Run one step of the discovery loop.
    pub fn run(&mut self, entry: EntryPoint) -> Result<Status> {
        debug!("run {:?}, poll state {}", entry, self.poll_state);
        let result = self.prepare_hal().and_then(|_| match entry {
            EntryPoint::Poll => self.poll(),
            EntryPoint::Listen => listen::listen(self),
        });
        self.record(result)
    }

    /// Replace the passive poll order.
    pub fn configure_poll_sequence(&mut self, techs: &[Technology]) -> Result<()> {
        self.sequence = PollSequence::new(techs)?;
        Ok(())
    }

    /// Tags found by the last poll.
    pub fn targets(&self) -> &TargetInfo {
        &self.targets
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Passive poll order in use.
    pub fn poll_sequence(&self) -> &PollSequence {
        &self.sequence
    }

    /// State the next poll starts in.
    pub fn poll_state(&self) -> PollState {
        self.poll_state
    }

    /// Technologies detected by the last poll.
    pub fn detected_techs(&self) -> TechMask {
        self.detected
    }

    /// Tags held for the technology last resolved.
    pub fn num_of_cards(&self) -> u8 {
        self.num_of_cards
    }

    /// Activation received by the last successful listen.
    pub fn listen_activation(&self) -> Option<&ListenActivation> {
        self.listen.as_ref()
    }

    fn prepare_hal(&mut self) -> Result<()> {
        self.hal.set_config(HalConfig::Emd(false))?;
        #[cfg(feature = "jewel")]
        self.hal.set_config(HalConfig::JewelMode(false))?;
        Ok(())
    }

    fn poll(&mut self) -> Result<Status> {
        if self.config.pas_poll.is_empty() && self.config.act_poll.is_empty() {
            self.num_of_cards = 0;
            self.detected = TechMask::NONE;
            return Ok(Status::NoTechDetected);
        }

        if self.poll_state == PollState::Detection {
            self.num_of_cards = 0;
            self.detected = TechMask::NONE;
            if self.config.lpcd {
                match self.hal.lpcd() {
                    Ok(()) => debug!("lpcd: load change"),
                    Err(e) if e.is_timeout() => return Ok(Status::NoTechDetected),
                    Err(e) => return Err(e.into()),
                }
            }
            if !self.config.act_poll.is_empty() {
                if let Some(status) = active::poll_active(self)? {
                    return Ok(status);
                }
            }
        }
        passive::poll_passive(self)
    }

    /// Keep the lower-layer status of a failure for `AdditionalInfo`.
    pub(crate) fn record(&mut self, result: Result<Status>) -> Result<Status> {
        match &result {
            Ok(status) => debug!("status {}", status),
            Err(Error::Failure(e)) => {
                warn!("discovery loop failure: {}", e);
                self.error = Some(*e);
            }
            Err(e) => debug!("rejected: {}", e),
        }
        result
    }

    /// Switch our field on. `Ok(false)` means an external field is
    /// present and ours stays off.
    pub(crate) fn rf_on(&mut self) -> Result<bool> {
        if self.field_on {
            return Ok(true);
        }
        match self.hal.field_on() {
            Ok(()) => {
                self.field_on = true;
                Ok(true)
            }
            Err(e) if e.is_external_rf_on() => {
                debug!("external field present");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn rf_off(&mut self) -> Result<()> {
        self.hal.field_off()?;
        self.field_on = false;
        self.last_polled = None;
        Ok(())
    }

    pub(crate) fn wait_us(&mut self, micros: u16) -> Result<()> {
        if micros > 0 {
            self.hal.wait(WaitUnit::Micros, micros)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Component, ErrorKind, LayerError};
    use crate::hal::HalCall;
    use crate::test_support::MockRig;

    #[test]
    fn init_is_idempotent() {
        let mut dl = MockRig::new().build();
        dl.set_config(ConfigKey::AntiColl, false).unwrap();
        dl.set_config(ConfigKey::NextPollState, PollState::Removal).unwrap();
        dl.init();
        let once = format!("{:?}", dl);
        dl.init();
        assert_eq!(format!("{:?}", dl), once);
        assert_eq!(dl.poll_state(), PollState::Detection);
        assert!(dl.config().anti_coll);
    }

    #[test]
    fn empty_poll_config_reports_nothing() {
        let rig = MockRig::new();
        rig.p3a.add_card(&[1, 2, 3, 4], 0x00);
        let mut dl = rig.build();
        dl.set_config(ConfigKey::PasPollTechCfg, TechMask::NONE).unwrap();
        assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::NoTechDetected);
        assert_eq!(rig.hal.count(&HalCall::FieldOn), 0);
    }

    #[test]
    fn emd_and_jewel_mode_disabled_on_every_run() {
        let rig = MockRig::new();
        let mut dl = rig.build();
        dl.run(EntryPoint::Poll).unwrap();
        assert_eq!(rig.hal.count(&HalCall::SetConfig(HalConfig::Emd(false))), 1);
        #[cfg(feature = "jewel")]
        assert_eq!(rig.hal.count(&HalCall::SetConfig(HalConfig::JewelMode(false))), 1);
    }

    #[test]
    fn lpcd_timeout_skips_polling() {
        let rig = MockRig::new();
        rig.hal.push_lpcd(Err(LayerError::new(Component::Hal, ErrorKind::IoTimeout)));
        let mut dl = rig.build();
        dl.set_config(ConfigKey::EnableLpcd, true).unwrap();
        assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::NoTechDetected);
        assert_eq!(rig.hal.count(&HalCall::FieldOn), 0);
    }

    #[test]
    fn failure_is_kept_for_additional_info() {
        let rig = MockRig::new();
        rig.hal.push_lpcd(Err(LayerError::new(Component::Hal, ErrorKind::Internal)));
        let mut dl = rig.build();
        dl.set_config(ConfigKey::EnableLpcd, true).unwrap();
        let err = dl.run(EntryPoint::Poll).unwrap_err();
        assert!(matches!(err, Error::Failure(_)));
        assert_eq!(
            dl.get_config(ConfigKey::AdditionalInfo).unwrap(),
            ConfigValue::Status(Some(LayerError::new(Component::Hal, ErrorKind::Internal)))
        );
    }

    #[test]
    fn poll_sequence_is_replaced() {
        let mut dl = MockRig::new().build();
        dl.configure_poll_sequence(&[Technology::TypeF212, Technology::TypeA])
            .unwrap();
        assert_eq!(
            dl.poll_sequence().as_slice(),
            &[Technology::TypeF212, Technology::TypeA]
        );
        assert!(dl.configure_poll_sequence(&[]).is_err());
        dl.init();
        assert_eq!(dl.poll_sequence(), &PollSequence::default());
    }
}
