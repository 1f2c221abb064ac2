// discloop/src/discovery/config.rs
//! Configuration register of the discovery loop.
//!
//! Every key is validated on its own before anything is written, so a
//! rejected value leaves the previous one in place. Keys that concern the
//! loop's runtime state (poll state, collision flag, guard times) are
//! routed to the owning component; the rest live in [`Config`].

use log::{debug, warn};

use crate::constants::*;
use crate::discovery::DiscLoop;
use crate::discovery::guard_time::GuardSlot;
use crate::error::{Error, LayerError, Result};
use crate::pal::Pals;
use crate::types::{OperationMode, PollState, SystemCode, TechMask, Technology, TypeVMode};

/// Configuration identifiers accepted by `DiscLoop::set_config` and
/// `DiscLoop::get_config`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Technologies polled passively.
    PasPollTechCfg,
    /// Technologies answered in passive listen.
    PasLisTechCfg,
    /// Technologies tried in active P2P poll.
    ActPollTechCfg,
    /// Technologies answered in active listen.
    ActLisTechCfg,
    /// Stop detection as soon as one of these answers.
    PasPollBailOut,
    /// State the next poll starts in.
    NextPollState,
    /// Wait for a card with low-power card detection first.
    EnableLpcd,
    /// Resolve collisions instead of reporting them.
    AntiColl,
    /// Collision seen and not resolved.
    CollisionPending,
    /// NFC, EMVCo or ISO rules.
    OperationMode,
    /// Guard time before Type A, in microseconds.
    GtA,
    /// Guard time before Type B.
    GtB,
    /// Guard time before Type F.
    GtF,
    /// Type F guard time right after Type B; at least `GtF`.
    GtFb,
    /// Type B guard time right after Type F.
    GtBf,
    /// Guard time before Type V.
    GtV,
    /// Guard time before ISO 18000-3m3.
    Gt18000p3m3,
    /// Field-off time before active P2P.
    GtActive,
    /// Most Type A tags resolved per poll.
    TypeADeviceLimit,
    TypeBDeviceLimit,
    /// Both FeliCa bit rates share this limit.
    TypeFDeviceLimit,
    TypeVDeviceLimit,
    I18000p3m3DeviceLimit,
    /// Reader frame size index sent in RATS.
    TypeAI3p4Fsdi,
    TypeAI3p4Cid,
    TypeAI3p4Dri,
    TypeAI3p4Dsi,
    /// NFC-DEP device id, 0 disables it.
    TypeAP2pDid,
    TypeAP2pLri,
    TypeAP2pNadEnable,
    TypeAP2pNad,
    /// ATR_REQ general bytes.
    TypeAP2pGi,
    /// Application family identifier.
    TypeBAfi,
    TypeBExtendedAtqb,
    /// Frame size index sent in ATTRIB.
    TypeBI3p4Fsdi,
    TypeBI3p4Cid,
    TypeBI3p4Dri,
    TypeBI3p4Dsi,
    /// System code in ReqC.
    TypeFSystemCode,
    /// ReqC slot count minus one: 0, 1, 3, 7 or 15.
    TypeFTimeSlot,
    TypeFP2pDid,
    TypeFP2pLri,
    TypeFP2pNadEnable,
    TypeFP2pNad,
    TypeFP2pGi,
    /// Inventory request flags.
    TypeVFlags,
    /// Non-addressed, addressed or selected.
    TypeVMode,
    /// Retries of a failed activation step.
    TargetRetryCount,
    /// Read-only: tags found by the last poll.
    NrTagsFound,
    /// Read-only: technologies detected by the last poll.
    TechDetected,
    /// Read-only: lower-layer status behind the last `Failure`.
    AdditionalInfo,
}

impl ConfigKey {
    /// Keys that reject writes.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            ConfigKey::NrTagsFound | ConfigKey::TechDetected | ConfigKey::AdditionalInfo
        )
    }
}

/// Typed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Flag(bool),
    Byte(u8),
    /// Guard times and system code.
    Word(u16),
    /// Technology bitmaps.
    Techs(TechMask),
    PollState(PollState),
    Mode(OperationMode),
    /// General bytes.
    Bytes(Vec<u8>),
    /// Lower-layer status, read only.
    Status(Option<LayerError>),
}

const WRONG_TYPE: Error = Error::InvalidParameter("value type does not match key");

impl ConfigValue {
    fn flag(&self) -> Result<bool> {
        match self {
            ConfigValue::Flag(v) => Ok(*v),
            _ => Err(WRONG_TYPE),
        }
    }

    fn byte(&self) -> Result<u8> {
        match self {
            ConfigValue::Byte(v) => Ok(*v),
            _ => Err(WRONG_TYPE),
        }
    }

    fn word(&self) -> Result<u16> {
        match self {
            ConfigValue::Word(v) => Ok(*v),
            _ => Err(WRONG_TYPE),
        }
    }

    fn techs(&self) -> Result<TechMask> {
        match self {
            ConfigValue::Techs(v) => Ok(*v),
            _ => Err(WRONG_TYPE),
        }
    }

    fn bytes(&self) -> Result<&[u8]> {
        match self {
            ConfigValue::Bytes(v) => Ok(v),
            _ => Err(WRONG_TYPE),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Flag(v)
    }
}

impl From<u8> for ConfigValue {
    fn from(v: u8) -> Self {
        ConfigValue::Byte(v)
    }
}

impl From<u16> for ConfigValue {
    fn from(v: u16) -> Self {
        ConfigValue::Word(v)
    }
}

impl From<TechMask> for ConfigValue {
    fn from(v: TechMask) -> Self {
        ConfigValue::Techs(v)
    }
}

impl From<PollState> for ConfigValue {
    fn from(v: PollState) -> Self {
        ConfigValue::PollState(v)
    }
}

impl From<OperationMode> for ConfigValue {
    fn from(v: OperationMode) -> Self {
        ConfigValue::Mode(v)
    }
}

impl From<Vec<u8>> for ConfigValue {
    fn from(v: Vec<u8>) -> Self {
        ConfigValue::Bytes(v)
    }
}

/// ISO 14443-4 activation parameters requested by the reader.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I3p4Config {
    pub fsdi: u8,
    pub cid: u8,
    pub dri: u8,
    pub dsi: u8,
}

impl Default for I3p4Config {
    fn default() -> Self {
        Self {
            fsdi: DEFAULT_FSDI,
            cid: 0,
            dri: 0,
            dsi: 0,
        }
    }
}

/// ISO 18092 ATR_REQ parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct P2pConfig {
    pub did: u8,
    pub lri: u8,
    pub nad_enabled: bool,
    pub nad: u8,
    pub general_bytes: Vec<u8>,
}

/// Type A poll parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeAConfig {
    pub i3p4: I3p4Config,
    pub p2p: P2pConfig,
}

/// Type B poll parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeBConfig {
    pub afi: u8,
    pub extended_atqb: bool,
    pub i3p4: I3p4Config,
}

/// Type F poll parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFConfig {
    pub system_code: SystemCode,
    pub time_slot: u8,
    pub p2p: P2pConfig,
}

impl Default for TypeFConfig {
    fn default() -> Self {
        Self {
            system_code: SystemCode::ANY,
            time_slot: 3,
            p2p: P2pConfig::default(),
        }
    }
}

/// Type V poll parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVConfig {
    pub flags: u8,
    pub mode: TypeVMode,
}

impl Default for TypeVConfig {
    fn default() -> Self {
        Self {
            flags: TYPEV_DEFAULT_FLAGS,
            mode: TypeVMode::NonAddressed,
        }
    }
}

/// Stored configuration. Technology bitmaps default to what the bound
/// PALs can poll; everything else to the values below.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub pas_poll: TechMask,
    pub pas_listen: TechMask,
    pub act_poll: TechMask,
    pub act_listen: TechMask,
    /// Technologies that end detection early.
    pub bail_out: TechMask,
    /// Low-power card detection before polling.
    pub lpcd: bool,
    pub anti_coll: bool,
    pub mode: OperationMode,
    /// Indexed by `Technology::index`.
    pub device_limits: [u8; Technology::COUNT],
    pub type_a: TypeAConfig,
    pub type_b: TypeBConfig,
    pub type_f: TypeFConfig,
    pub type_v: TypeVConfig,
    /// Retries of a failed activation step.
    pub target_retry_count: u8,
}

impl Config {
    /// Defaults with the given passive capabilities.
    pub fn with_capabilities(passive: TechMask) -> Self {
        Self {
            pas_poll: passive,
            pas_listen: TechMask::NONE,
            act_poll: TechMask::NONE,
            act_listen: TechMask::NONE,
            bail_out: TechMask::NONE,
            lpcd: false,
            anti_coll: true,
            mode: OperationMode::Nfc,
            device_limits: [1; Technology::COUNT],
            type_a: TypeAConfig::default(),
            type_b: TypeBConfig::default(),
            type_f: TypeFConfig::default(),
            type_v: TypeVConfig::default(),
            target_retry_count: 0,
        }
    }

    /// Device limit that applies to `tech` in the current operation mode.
    pub fn device_limit(&self, tech: Technology) -> u8 {
        if self.mode == OperationMode::Emvco {
            1
        } else {
            self.device_limits[tech.index()]
        }
    }
}

fn check_max(value: u8, max: u8, what: &'static str) -> Result<u8> {
    if value > max { Err(Error::InvalidParameter(what)) } else { Ok(value) }
}

fn check_limit(value: u8, max: u8) -> Result<u8> {
    if value == 0 || value > max {
        Err(Error::InvalidParameter("device limit out of range"))
    } else {
        Ok(value)
    }
}

fn check_gi(value: &[u8]) -> Result<Vec<u8>> {
    if value.len() > MAX_GENERAL_BYTES {
        Err(Error::InvalidParameter("general bytes too long"))
    } else {
        Ok(value.to_vec())
    }
}

fn guard_slot(key: ConfigKey) -> Option<GuardSlot> {
    Some(match key {
        ConfigKey::GtA => GuardSlot::A,
        ConfigKey::GtB => GuardSlot::B,
        ConfigKey::GtF => GuardSlot::F,
        ConfigKey::GtFb => GuardSlot::FAfterB,
        ConfigKey::GtBf => GuardSlot::BAfterF,
        ConfigKey::GtV => GuardSlot::V,
        ConfigKey::Gt18000p3m3 => GuardSlot::I18000p3m3,
        ConfigKey::GtActive => GuardSlot::Active,
        _ => return None,
    })
}

/// Hand `mode` to the PALs that carry one, stopping at the first failure.
fn fan_out_mode(pals: &mut Pals, mode: OperationMode) -> std::result::Result<(), LayerError> {
    if let Some(p) = pals.i14443p3a.as_mut() {
        p.set_operation_mode(mode)?;
    }
    if let Some(p) = pals.i14443p4a.as_mut() {
        p.set_operation_mode(mode)?;
    }
    if let Some(p) = pals.i14443p3b.as_mut() {
        p.set_operation_mode(mode)?;
    }
    if let Some(p) = pals.i14443p4.as_mut() {
        p.set_operation_mode(mode)?;
    }
    Ok(())
}

impl DiscLoop {
    /// Write one configuration value.
    pub fn set_config(&mut self, key: ConfigKey, value: impl Into<ConfigValue>) -> Result<()> {
        let value = value.into();
        debug!("set_config {:?} = {:?}", key, value);
        if key.is_read_only() {
            return Err(Error::InvalidParameter("configuration key is read-only"));
        }
        if let Some(slot) = guard_slot(key) {
            return self.guard.set(slot, value.word()?);
        }

        let cfg = &mut self.config;
        match key {
            ConfigKey::PasPollTechCfg => {
                let techs = value.techs()?;
                if !techs.is_subset_of(self.pals.passive_capabilities()) {
                    return Err(Error::InvalidParameter("technology not supported"));
                }
                cfg.pas_poll = techs;
            }
            ConfigKey::PasLisTechCfg => {
                let techs = value.techs()?;
                if !techs.is_subset_of(TechMask::ACTIVE_CAPABLE) {
                    return Err(Error::InvalidParameter("technology cannot listen"));
                }
                cfg.pas_listen = techs;
            }
            ConfigKey::ActPollTechCfg => {
                let techs = value.techs()?;
                if !techs.is_subset_of(self.pals.active_capabilities()) {
                    return Err(Error::InvalidParameter("technology not supported in active mode"));
                }
                cfg.act_poll = techs;
            }
            ConfigKey::ActLisTechCfg => {
                let techs = value.techs()?;
                if !techs.is_subset_of(TechMask::ACTIVE_CAPABLE) {
                    return Err(Error::InvalidParameter("technology cannot listen in active mode"));
                }
                cfg.act_listen = techs;
            }
            ConfigKey::PasPollBailOut => {
                let techs = value.techs()?;
                if !techs.is_subset_of(TechMask::ALL) {
                    return Err(Error::InvalidParameter("unknown technology in bail-out"));
                }
                cfg.bail_out = techs;
            }
            ConfigKey::NextPollState => match value {
                ConfigValue::PollState(state) => self.poll_state = state,
                _ => return Err(WRONG_TYPE),
            },
            ConfigKey::EnableLpcd => cfg.lpcd = value.flag()?,
            ConfigKey::AntiColl => cfg.anti_coll = value.flag()?,
            ConfigKey::CollisionPending => self.collision_pending = value.flag()?,
            ConfigKey::OperationMode => match value {
                ConfigValue::Mode(mode) => self.apply_operation_mode(mode)?,
                _ => return Err(WRONG_TYPE),
            },
            ConfigKey::TypeADeviceLimit => {
                cfg.device_limits[Technology::TypeA.index()] =
                    check_limit(value.byte()?, MAX_CARDS_SUPPORTED)?
            }
            ConfigKey::TypeBDeviceLimit => {
                cfg.device_limits[Technology::TypeB.index()] =
                    check_limit(value.byte()?, MAX_CARDS_SUPPORTED)?
            }
            ConfigKey::TypeFDeviceLimit => {
                let limit = check_limit(value.byte()?, MAX_CARDS_SUPPORTED)?;
                cfg.device_limits[Technology::TypeF212.index()] = limit;
                cfg.device_limits[Technology::TypeF424.index()] = limit;
            }
            ConfigKey::TypeVDeviceLimit => {
                cfg.device_limits[Technology::TypeV.index()] =
                    check_limit(value.byte()?, MAX_VICINITY_CARDS_SUPPORTED)?
            }
            ConfigKey::I18000p3m3DeviceLimit => {
                cfg.device_limits[Technology::I18000p3m3.index()] =
                    check_limit(value.byte()?, MAX_VICINITY_CARDS_SUPPORTED)?
            }
            ConfigKey::TypeAI3p4Fsdi => {
                cfg.type_a.i3p4.fsdi = check_max(value.byte()?, MAX_FSDI, "FSDI out of range")?
            }
            ConfigKey::TypeAI3p4Cid => {
                cfg.type_a.i3p4.cid = check_max(value.byte()?, MAX_CID, "CID out of range")?
            }
            ConfigKey::TypeAI3p4Dri => {
                cfg.type_a.i3p4.dri = check_max(value.byte()?, MAX_DRI_DSI, "DRI out of range")?
            }
            ConfigKey::TypeAI3p4Dsi => {
                cfg.type_a.i3p4.dsi = check_max(value.byte()?, MAX_DRI_DSI, "DSI out of range")?
            }
            ConfigKey::TypeAP2pDid => {
                cfg.type_a.p2p.did = check_max(value.byte()?, MAX_DID, "DID out of range")?
            }
            ConfigKey::TypeAP2pLri => {
                cfg.type_a.p2p.lri = check_max(value.byte()?, MAX_LRI, "LRI out of range")?
            }
            ConfigKey::TypeAP2pNadEnable => cfg.type_a.p2p.nad_enabled = value.flag()?,
            ConfigKey::TypeAP2pNad => cfg.type_a.p2p.nad = value.byte()?,
            ConfigKey::TypeAP2pGi => cfg.type_a.p2p.general_bytes = check_gi(value.bytes()?)?,
            ConfigKey::TypeBAfi => cfg.type_b.afi = value.byte()?,
            ConfigKey::TypeBExtendedAtqb => cfg.type_b.extended_atqb = value.flag()?,
            ConfigKey::TypeBI3p4Fsdi => {
                cfg.type_b.i3p4.fsdi = check_max(value.byte()?, MAX_FSDI, "FSDI out of range")?
            }
            ConfigKey::TypeBI3p4Cid => {
                cfg.type_b.i3p4.cid = check_max(value.byte()?, MAX_CID, "CID out of range")?
            }
            ConfigKey::TypeBI3p4Dri => {
                cfg.type_b.i3p4.dri = check_max(value.byte()?, MAX_DRI_DSI, "DRI out of range")?
            }
            ConfigKey::TypeBI3p4Dsi => {
                cfg.type_b.i3p4.dsi = check_max(value.byte()?, MAX_DRI_DSI, "DSI out of range")?
            }
            ConfigKey::TypeFSystemCode => cfg.type_f.system_code = SystemCode::new(value.word()?),
            ConfigKey::TypeFTimeSlot => {
                let slot = value.byte()?;
                if !TYPEF_TIME_SLOTS.contains(&slot) {
                    return Err(Error::InvalidParameter("time slot must be 0, 1, 3, 7 or 15"));
                }
                cfg.type_f.time_slot = slot;
            }
            ConfigKey::TypeFP2pDid => {
                cfg.type_f.p2p.did = check_max(value.byte()?, MAX_DID, "DID out of range")?
            }
            ConfigKey::TypeFP2pLri => {
                cfg.type_f.p2p.lri = check_max(value.byte()?, MAX_LRI, "LRI out of range")?
            }
            ConfigKey::TypeFP2pNadEnable => cfg.type_f.p2p.nad_enabled = value.flag()?,
            ConfigKey::TypeFP2pNad => cfg.type_f.p2p.nad = value.byte()?,
            ConfigKey::TypeFP2pGi => cfg.type_f.p2p.general_bytes = check_gi(value.bytes()?)?,
            ConfigKey::TypeVFlags => cfg.type_v.flags = value.byte()?,
            ConfigKey::TypeVMode => cfg.type_v.mode = TypeVMode::try_from(value.byte()?)?,
            ConfigKey::TargetRetryCount => cfg.target_retry_count = value.byte()?,
            ConfigKey::GtA
            | ConfigKey::GtB
            | ConfigKey::GtF
            | ConfigKey::GtFb
            | ConfigKey::GtBf
            | ConfigKey::GtV
            | ConfigKey::Gt18000p3m3
            | ConfigKey::GtActive
            | ConfigKey::NrTagsFound
            | ConfigKey::TechDetected
            | ConfigKey::AdditionalInfo => unreachable!("handled above"),
        }
        Ok(())
    }

    /// Read one configuration value.
    pub fn get_config(&self, key: ConfigKey) -> Result<ConfigValue> {
        if let Some(slot) = guard_slot(key) {
            return Ok(ConfigValue::Word(self.guard.get(slot)));
        }
        let cfg = &self.config;
        let limit = |t: Technology| ConfigValue::Byte(cfg.device_limits[t.index()]);
        Ok(match key {
            ConfigKey::PasPollTechCfg => cfg.pas_poll.into(),
            ConfigKey::PasLisTechCfg => cfg.pas_listen.into(),
            ConfigKey::ActPollTechCfg => cfg.act_poll.into(),
            ConfigKey::ActLisTechCfg => cfg.act_listen.into(),
            ConfigKey::PasPollBailOut => cfg.bail_out.into(),
            ConfigKey::NextPollState => self.poll_state.into(),
            ConfigKey::EnableLpcd => cfg.lpcd.into(),
            ConfigKey::AntiColl => cfg.anti_coll.into(),
            ConfigKey::CollisionPending => self.collision_pending.into(),
            ConfigKey::OperationMode => cfg.mode.into(),
            ConfigKey::TypeADeviceLimit => limit(Technology::TypeA),
            ConfigKey::TypeBDeviceLimit => limit(Technology::TypeB),
            ConfigKey::TypeFDeviceLimit => limit(Technology::TypeF212),
            ConfigKey::TypeVDeviceLimit => limit(Technology::TypeV),
            ConfigKey::I18000p3m3DeviceLimit => limit(Technology::I18000p3m3),
            ConfigKey::TypeAI3p4Fsdi => cfg.type_a.i3p4.fsdi.into(),
            ConfigKey::TypeAI3p4Cid => cfg.type_a.i3p4.cid.into(),
            ConfigKey::TypeAI3p4Dri => cfg.type_a.i3p4.dri.into(),
            ConfigKey::TypeAI3p4Dsi => cfg.type_a.i3p4.dsi.into(),
            ConfigKey::TypeAP2pDid => cfg.type_a.p2p.did.into(),
            ConfigKey::TypeAP2pLri => cfg.type_a.p2p.lri.into(),
            ConfigKey::TypeAP2pNadEnable => cfg.type_a.p2p.nad_enabled.into(),
            ConfigKey::TypeAP2pNad => cfg.type_a.p2p.nad.into(),
            ConfigKey::TypeAP2pGi => cfg.type_a.p2p.general_bytes.clone().into(),
            ConfigKey::TypeBAfi => cfg.type_b.afi.into(),
            ConfigKey::TypeBExtendedAtqb => cfg.type_b.extended_atqb.into(),
            ConfigKey::TypeBI3p4Fsdi => cfg.type_b.i3p4.fsdi.into(),
            ConfigKey::TypeBI3p4Cid => cfg.type_b.i3p4.cid.into(),
            ConfigKey::TypeBI3p4Dri => cfg.type_b.i3p4.dri.into(),
            ConfigKey::TypeBI3p4Dsi => cfg.type_b.i3p4.dsi.into(),
            ConfigKey::TypeFSystemCode => cfg.type_f.system_code.as_u16().into(),
            ConfigKey::TypeFTimeSlot => cfg.type_f.time_slot.into(),
            ConfigKey::TypeFP2pDid => cfg.type_f.p2p.did.into(),
            ConfigKey::TypeFP2pLri => cfg.type_f.p2p.lri.into(),
            ConfigKey::TypeFP2pNadEnable => cfg.type_f.p2p.nad_enabled.into(),
            ConfigKey::TypeFP2pNad => cfg.type_f.p2p.nad.into(),
            ConfigKey::TypeFP2pGi => cfg.type_f.p2p.general_bytes.clone().into(),
            ConfigKey::TypeVFlags => cfg.type_v.flags.into(),
            ConfigKey::TypeVMode => (cfg.type_v.mode as u8).into(),
            ConfigKey::TargetRetryCount => cfg.target_retry_count.into(),
            ConfigKey::NrTagsFound => self.num_of_cards.into(),
            ConfigKey::TechDetected => self.detected.into(),
            ConfigKey::AdditionalInfo => ConfigValue::Status(self.error),
            ConfigKey::GtA
            | ConfigKey::GtB
            | ConfigKey::GtF
            | ConfigKey::GtFb
            | ConfigKey::GtBf
            | ConfigKey::GtV
            | ConfigKey::Gt18000p3m3
            | ConfigKey::GtActive => unreachable!("handled above"),
        })
    }

    /// Push the operation mode to every PAL that carries one, then adopt
    /// it. A PAL failure aborts the fan-out; PALs updated before the
    /// failing one keep the new mode.
    fn apply_operation_mode(&mut self, mode: OperationMode) -> Result<()> {
        if let Err(e) = fan_out_mode(&mut self.pals, mode) {
            warn!("operation mode {} rejected by {}", mode, e);
            self.error = Some(e);
            return Err(e.into());
        }
        self.config.mode = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Component, ErrorKind};
    use crate::test_support::MockRig;

    #[test]
    fn defaults_follow_capabilities() {
        let rig = MockRig::new();
        let dl = rig.build();
        assert_eq!(
            dl.get_config(ConfigKey::PasPollTechCfg).unwrap(),
            ConfigValue::Techs(TechMask::ALL)
        );
        assert_eq!(
            dl.get_config(ConfigKey::ActPollTechCfg).unwrap(),
            ConfigValue::Techs(TechMask::NONE)
        );
        assert_eq!(dl.get_config(ConfigKey::AntiColl).unwrap(), ConfigValue::Flag(true));
        assert_eq!(dl.get_config(ConfigKey::TypeFTimeSlot).unwrap(), ConfigValue::Byte(3));
    }

    #[test]
    fn rejects_unsupported_technology() {
        let rig = MockRig::type_a_only();
        let mut dl = rig.build();
        assert!(dl.set_config(ConfigKey::PasPollTechCfg, TechMask::B).is_err());
        assert!(dl.set_config(ConfigKey::ActPollTechCfg, TechMask::A).is_err());
        assert_eq!(
            dl.get_config(ConfigKey::PasPollTechCfg).unwrap(),
            ConfigValue::Techs(TechMask::A)
        );
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let mut dl = MockRig::new().build();
        assert_eq!(dl.set_config(ConfigKey::EnableLpcd, 1u8), Err(WRONG_TYPE));
        assert_eq!(dl.set_config(ConfigKey::GtA, 5u8), Err(WRONG_TYPE));
    }

    #[test]
    fn read_only_keys_reject_writes() {
        let mut dl = MockRig::new().build();
        assert!(dl.set_config(ConfigKey::NrTagsFound, 3u8).is_err());
        assert_eq!(dl.get_config(ConfigKey::NrTagsFound).unwrap(), ConfigValue::Byte(0));
        assert_eq!(dl.get_config(ConfigKey::AdditionalInfo).unwrap(), ConfigValue::Status(None));
    }

    #[test]
    fn device_limit_bounds() {
        let mut dl = MockRig::new().build();
        assert!(dl.set_config(ConfigKey::TypeADeviceLimit, 0u8).is_err());
        assert!(dl.set_config(ConfigKey::TypeADeviceLimit, MAX_CARDS_SUPPORTED + 1).is_err());
        dl.set_config(ConfigKey::TypeFDeviceLimit, 3u8).unwrap();
        assert_eq!(dl.config.device_limits[Technology::TypeF424.index()], 3);
        assert_eq!(dl.get_config(ConfigKey::TypeFDeviceLimit).unwrap(), ConfigValue::Byte(3));
    }

    #[test]
    fn time_slot_values() {
        let mut dl = MockRig::new().build();
        dl.set_config(ConfigKey::TypeFTimeSlot, 15u8).unwrap();
        assert!(dl.set_config(ConfigKey::TypeFTimeSlot, 2u8).is_err());
        assert_eq!(dl.get_config(ConfigKey::TypeFTimeSlot).unwrap(), ConfigValue::Byte(15));
    }

    #[test]
    fn emvco_forces_single_device() {
        let mut dl = MockRig::new().build();
        dl.set_config(ConfigKey::TypeADeviceLimit, 4u8).unwrap();
        dl.set_config(ConfigKey::OperationMode, OperationMode::Emvco).unwrap();
        assert_eq!(dl.config.device_limit(Technology::TypeA), 1);
        assert_eq!(dl.get_config(ConfigKey::TypeADeviceLimit).unwrap(), ConfigValue::Byte(4));
    }

    #[test]
    fn operation_mode_fans_out_to_pals() {
        let rig = MockRig::new();
        let mut dl = rig.build();
        dl.set_config(ConfigKey::OperationMode, OperationMode::Iso).unwrap();
        assert_eq!(rig.p3a.operation_mode(), Some(OperationMode::Iso));
        assert_eq!(rig.p4a.operation_mode(), Some(OperationMode::Iso));
        assert_eq!(rig.p3b.operation_mode(), Some(OperationMode::Iso));
        assert_eq!(rig.p4.operation_mode(), Some(OperationMode::Iso));
    }

    #[test]
    fn operation_mode_failure_is_partial() {
        let rig = MockRig::new();
        let mut dl = rig.build();
        rig.p3b.inject("set_operation_mode", ErrorKind::Internal);
        let err = dl
            .set_config(ConfigKey::OperationMode, OperationMode::Emvco)
            .unwrap_err();
        let expected = LayerError::new(Component::I14443p3b, ErrorKind::Internal);
        assert_eq!(err, Error::Failure(expected));
        // PALs before the failing one already switched, the loop did not
        assert_eq!(rig.p3a.operation_mode(), Some(OperationMode::Emvco));
        assert_eq!(rig.p4.operation_mode(), None);
        assert_eq!(dl.get_config(ConfigKey::OperationMode).unwrap(), ConfigValue::Mode(OperationMode::Nfc));
        assert_eq!(
            dl.get_config(ConfigKey::AdditionalInfo).unwrap(),
            ConfigValue::Status(Some(expected))
        );
    }

    #[test]
    fn general_bytes_length() {
        let mut dl = MockRig::new().build();
        dl.set_config(ConfigKey::TypeAP2pGi, vec![0x46, 0x66, 0x6D]).unwrap();
        assert!(dl.set_config(ConfigKey::TypeFP2pGi, vec![0u8; 49]).is_err());
        assert_eq!(
            dl.get_config(ConfigKey::TypeAP2pGi).unwrap(),
            ConfigValue::Bytes(vec![0x46, 0x66, 0x6D])
        );
    }
}
