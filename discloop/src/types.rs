// discloop/src/types.rs

use crate::error::Error;
use derive_more::Display;
use std::convert::TryFrom;

/// Passive polling technologies, in default poll-sequence order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Technology {
    /// ISO 14443 Type A at 106 kbps
    #[display(fmt = "Type A")]
    TypeA = 0,
    /// ISO 14443 Type B at 106 kbps
    #[display(fmt = "Type B")]
    TypeB = 1,
    /// FeliCa at 212 kbps
    #[display(fmt = "Type F 212")]
    TypeF212 = 2,
    /// FeliCa at 424 kbps
    #[display(fmt = "Type F 424")]
    TypeF424 = 3,
    /// ISO 15693
    #[display(fmt = "Type V")]
    TypeV = 4,
    /// ISO 18000-3 mode 3
    #[display(fmt = "ISO 18000-3 mode 3")]
    I18000p3m3 = 5,
}

impl Technology {
    /// Number of passive technologies
    pub const COUNT: usize = 6;

    /// Every technology in default poll order
    pub const ALL: [Technology; Technology::COUNT] = [
        Technology::TypeA,
        Technology::TypeB,
        Technology::TypeF212,
        Technology::TypeF424,
        Technology::TypeV,
        Technology::I18000p3m3,
    ];

    /// Position in per-technology tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit of this technology in a `TechMask`.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Either FeliCa bit rate.
    pub fn is_type_f(self) -> bool {
        matches!(self, Technology::TypeF212 | Technology::TypeF424)
    }
}

impl TryFrom<u8> for Technology {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Technology::ALL
            .get(id as usize)
            .copied()
            .ok_or(Error::InvalidParameter("unknown technology id"))
    }
}

/// Bitmap of technologies, one bit per `Technology` discriminant.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TechMask(u8);

impl TechMask {
    /// No technology
    pub const NONE: Self = Self(0);
    /// Type A
    pub const A: Self = Self(Technology::TypeA.bit());
    /// Type B
    pub const B: Self = Self(Technology::TypeB.bit());
    /// FeliCa 212 kbps
    pub const F212: Self = Self(Technology::TypeF212.bit());
    /// FeliCa 424 kbps
    pub const F424: Self = Self(Technology::TypeF424.bit());
    /// Type V
    pub const V: Self = Self(Technology::TypeV.bit());
    /// ISO 18000-3m3
    pub const I18000P3M3: Self = Self(Technology::I18000p3m3.bit());
    /// Every technology
    pub const ALL: Self = Self(0x3F);
    /// Technologies that exist in active (P2P) mode and in listen mode.
    pub const ACTIVE_CAPABLE: Self = Self(0x01 | 0x04 | 0x08);
    /// Technologies polled in EMVCo mode.
    pub const EMVCO: Self = Self(0x01 | 0x02);

    /// Mask from raw bits; bits above `ALL` are kept so validation can reject them.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// No technology set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `tech` is in the mask.
    pub const fn contains(self, tech: Technology) -> bool {
        self.0 & tech.bit() != 0
    }

    /// Every technology in `self` is also in `other`.
    pub const fn is_subset_of(self, other: TechMask) -> bool {
        self.0 & !other.0 == 0
    }

    /// Add `tech`.
    pub fn insert(&mut self, tech: Technology) {
        self.0 |= tech.bit();
    }

    /// Technologies in either mask.
    pub const fn union(self, other: TechMask) -> Self {
        Self(self.0 | other.0)
    }

    /// Technologies in both masks.
    pub const fn intersection(self, other: TechMask) -> Self {
        Self(self.0 & other.0)
    }

    /// Number of technologies in the mask.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Technologies in the mask, in default poll order.
    pub fn iter(self) -> impl Iterator<Item = Technology> {
        Technology::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl From<Technology> for TechMask {
    fn from(tech: Technology) -> Self {
        Self(tech.bit())
    }
}

impl FromIterator<Technology> for TechMask {
    fn from_iter<I: IntoIterator<Item = Technology>>(iter: I) -> Self {
        let mut mask = TechMask::NONE;
        for t in iter {
            mask.insert(t);
        }
        mask
    }
}

/// Poll state, advanced by the caller through `ConfigKey::NextPollState`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Check the field for each enabled technology.
    #[default]
    Detection,
    /// Resolve tags of one detected technology.
    CollisionResolution,
    /// Wait until the activated device leaves the field.
    Removal,
}

/// Which rule set the loop and the PALs follow.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// NFC Forum rules.
    #[default]
    Nfc,
    /// EMVCo contactless rules: Type A and B only, ISO-DEP only, one card at a time.
    Emvco,
    /// Plain ISO rules.
    Iso,
}

/// Where `DiscLoop::run` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Poll as reader or initiator.
    Poll,
    /// Wait to be activated as a target.
    Listen,
}

impl TryFrom<u8> for EntryPoint {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(EntryPoint::Poll),
            1 => Ok(EntryPoint::Listen),
            _ => Err(Error::InvalidParameter("unknown entry point")),
        }
    }
}

/// Outcome of a discovery-loop call that did not fail.
///
/// `NoTechDetected` is the routine "nothing in the field" answer; callers
/// are expected to run the loop again.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing answered.
    NoTechDetected,
    /// One technology answered.
    TechDetected,
    /// Several technologies answered; narrow `PasPollTechCfg` to pick one.
    MultiTechDetected,
    /// A collision was seen and anticollision is off.
    CollisionPending,
    /// Resolution ran and found no tag.
    NoDeviceResolved,
    /// Exactly one tag resolved.
    DeviceResolved,
    /// Several tags resolved; pick one with `activate_card`.
    MultiDeviceResolved,
    /// A tag was activated.
    DeviceActivated,
    /// A passive NFC-DEP target was activated.
    PassiveTargetActivated,
    /// An active-mode peer answered ATR_REQ.
    ActiveTargetActivated,
    /// Type A tag supports ISO-DEP and NFC-DEP; the caller picks the protocol.
    MergedSelResFound,
    /// Another field was present when ours was switched on.
    ExternalRfOn,
    /// The external field dropped while listening.
    ExternalRfOff,
    /// A remote initiator activated us.
    ActivatedByPeer,
}

/// Type V addressing used for activation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeVMode {
    #[default]
    NonAddressed = 0,
    Addressed = 1,
    Selected = 2,
}

impl TryFrom<u8> for TypeVMode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(TypeVMode::NonAddressed),
            1 => Ok(TypeVMode::Addressed),
            2 => Ok(TypeVMode::Selected),
            _ => Err(Error::InvalidParameter("unknown Type V mode")),
        }
    }
}

/// ISO 14443-3A cascade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeLevel {
    One,
    Two,
    Three,
}

impl CascadeLevel {
    /// Cascade levels in selection order
    pub const ALL: [CascadeLevel; 3] = [CascadeLevel::One, CascadeLevel::Two, CascadeLevel::Three];
}

/// ATQA - Newtype Pattern (2 バイト)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Atqa([u8; 2]);

impl Atqa {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }

    /// Jewel/Topaz tags answer with no UID size and no anticollision bits.
    pub fn is_jewel(&self) -> bool {
        self.0[0] & 0x1F == 0
    }
}

/// UID of a Type A or Type V tag (4, 7, 8 or 10 bytes).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uid(Vec<u8>);

impl Uid {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UID length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No UID bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(&self.0)
    }
}

/// ATQB (12 バイト, 13 with extended ATQB)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atqb(Vec<u8>);

impl Atqb {
    /// Raw ATQB.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// PUPI, bytes 1..5 of the ATQB.
    pub fn pupi(&self) -> [u8; 4] {
        let mut pupi = [0u8; 4];
        pupi.copy_from_slice(&self.0[1..5]);
        pupi
    }
}

impl TryFrom<&[u8]> for Atqb {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 12 && bytes.len() != 13 {
            return Err(Error::InvalidParameter("ATQB must be 12 or 13 bytes"));
        }
        if bytes[0] != 0x50 {
            return Err(Error::InvalidParameter("ATQB must start with 0x50"));
        }
        Ok(Self(bytes.to_vec()))
    }
}

/// IDm - Newtype Pattern (8 バイト)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Idm([u8; 8]);

impl Idm {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// NFC-DEP capable targets use the `01 FE` IDm prefix.
    pub fn is_nfc_dep(&self) -> bool {
        self.0[0] == 0x01 && self.0[1] == 0xFE
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(self.as_bytes())
    }
}

/// PMm - Newtype Pattern (8 バイト)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pmm([u8; 8]);

impl Pmm {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

/// SystemCode (u16)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemCode(u16);

impl SystemCode {
    /// Wildcard, every card answers
    pub const ANY: Self = Self(0xffff);
    /// NFC-DEP system code
    pub const NFC_DEP: Self = Self(0x12fc);

    /// Wrap a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Default for SystemCode {
    fn default() -> Self {
        SystemCode::ANY
    }
}

/// One SENSF_RES as returned by a FeliCa ReqC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FelicaResponse {
    pub idm: Idm,
    pub pmm: Pmm,
}

/// Type V inventory answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VicinityTag {
    pub uid: Uid,
    pub dsfid: u8,
}

/// UII (EPC) of an ISO 18000-3 mode 3 tag.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uii(Vec<u8>);

impl Uii {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Result of one slot of a slotted inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    Empty,
    Collision,
    Found(T),
}

/// ISO 14443-4 parameters negotiated during activation and handed to the
/// ISO 14443-4 PAL.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolParams {
    pub cid_enabled: bool,
    pub cid: u8,
    pub nad_supported: bool,
    pub nad: u8,
    pub fwi: u8,
    pub fsdi: u8,
    pub fsci: u8,
}

/// Parameters of an ISO 18092 ATR_REQ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtrRequest {
    /// NFCID3 sent in the request (passive Type F reuses the IDm).
    pub nfcid3: [u8; 10],
    pub did: u8,
    pub lri: u8,
    pub nad_enabled: bool,
    pub nad: u8,
    pub general_bytes: Vec<u8>,
}

/// Activation information received while listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenActivation {
    pub technology: Technology,
    pub active: bool,
    /// First frame received from the peer after activation.
    pub frame: Vec<u8>,
}
