// discloop/src/target/mod.rs
//! Per-technology target information filled by detection, collision
//! resolution and activation, and read by the caller after `run`.

use crate::types::{Atqa, Atqb, Idm, Pmm, ProtocolParams, Technology as T, Uid, Uii};

/// ISO 18092 (NFC-DEP) parameters used for the last activation of one
/// technology.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct P2pInfo {
    pub did: u8,
    pub lri: u8,
    pub nad_enabled: bool,
    pub nad: u8,
    pub general_bytes: Vec<u8>,
    /// ATR_RES of the last activated peer, empty before activation.
    pub atr_res: Vec<u8>,
}

/// ISO 14443-4 parameters requested during activation together with what
/// the card agreed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct I3p4Info {
    pub fsdi: u8,
    pub cid: u8,
    pub dri: u8,
    pub dsi: u8,
    /// ATS (Type A) or empty (Type B).
    pub ats: Vec<u8>,
    pub negotiated: Option<ProtocolParams>,
}

/// Type A tag found by anticollision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeATag {
    pub atqa: Atqa,
    pub uid: Uid,
    pub sak: u8,
}

/// Type A tags and the parameters of the active one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeAInfo {
    /// ATQA of the last REQA/WUPA answered without collision.
    pub atqa: Atqa,
    pub total_tags: u8,
    pub tags: Vec<TypeATag>,
    /// Tag currently in ACTIVE state, if any.
    pub selected: Option<usize>,
    pub collision_pending: bool,
    pub jewel: bool,
    pub i3p4: I3p4Info,
    pub p2p: P2pInfo,
}

/// Type B tag found by slot marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBTag {
    pub atqb: Atqb,
    /// HLTB was sent to this tag during resolution.
    pub halted: bool,
}

/// Type B tags and ATTRIB parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeBInfo {
    pub total_tags: u8,
    pub tags: Vec<TypeBTag>,
    pub collision_pending: bool,
    pub i3p4: I3p4Info,
}

/// Type F bit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FelicaBaud {
    #[default]
    Kbps212,
    Kbps424,
}

/// FeliCa card found by ReqC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFTag {
    pub idm: Idm,
    pub pmm: Pmm,
    pub baud: FelicaBaud,
    /// Passive P2P target put to sleep with DSL_REQ; wakes with WUP_REQ.
    pub sleep_af: bool,
}

/// FeliCa cards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeFInfo {
    pub total_tags: u8,
    pub tags: Vec<TypeFTag>,
    pub collision_pending: bool,
    pub p2p: P2pInfo,
}

/// Type V tag found by inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVTag {
    pub uid: Uid,
    pub dsfid: u8,
}

/// Type V tags and inventory flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeVInfo {
    pub total_tags: u8,
    pub tags: Vec<TypeVTag>,
    pub collision_pending: bool,
    /// Tag addressed or selected by the last activation.
    pub activated: Option<usize>,
}

/// ISO 18000-3m3 tag found by inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18000p3m3Tag {
    pub uii: Uii,
    /// Handle from Req_RN, set once activated.
    pub handle: Option<u16>,
}

/// ISO 18000-3m3 tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct I18000p3m3Info {
    pub total_tags: u8,
    pub tags: Vec<I18000p3m3Tag>,
    pub collision_pending: bool,
}

/// Target information of every technology.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetInfo {
    pub type_a: TypeAInfo,
    pub type_b: TypeBInfo,
    pub type_f: TypeFInfo,
    pub type_v: TypeVInfo,
    pub i18000p3m3: I18000p3m3Info,
}

impl TargetInfo {
    /// Number of tags stored for `tech`. Type F 212 and 424 share one
    /// record and are told apart by the per-tag baud rate.
    pub fn total_tags(&self, tech: T) -> u8 {
        match tech {
            T::TypeA => self.type_a.total_tags,
            T::TypeB => self.type_b.total_tags,
            T::TypeF212 | T::TypeF424 => self.type_f.total_tags,
            T::TypeV => self.type_v.total_tags,
            T::I18000p3m3 => self.i18000p3m3.total_tags,
        }
    }

    /// Collision seen for `tech` and not yet resolved.
    pub fn collision_pending(&self, tech: T) -> bool {
        match tech {
            T::TypeA => self.type_a.collision_pending,
            T::TypeB => self.type_b.collision_pending,
            T::TypeF212 | T::TypeF424 => self.type_f.collision_pending,
            T::TypeV => self.type_v.collision_pending,
            T::I18000p3m3 => self.i18000p3m3.collision_pending,
        }
    }

    /// Remember an unresolved collision for `tech`.
    pub fn mark_collision(&mut self, tech: T) {
        match tech {
            T::TypeA => self.type_a.collision_pending = true,
            T::TypeB => self.type_b.collision_pending = true,
            T::TypeF212 | T::TypeF424 => self.type_f.collision_pending = true,
            T::TypeV => self.type_v.collision_pending = true,
            T::I18000p3m3 => self.i18000p3m3.collision_pending = true,
        }
    }

    /// Drop every detected, resolved and activated tag.
    pub fn clear(&mut self) {
        *self = TargetInfo::default();
    }
}
