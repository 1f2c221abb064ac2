// discloop/src/pal/traits.rs

use crate::error::{Component, ErrorKind, LayerError, LayerResult};
use crate::types::{
    Atqa, Atqb, AtrRequest, CascadeLevel, FelicaResponse, Idm, OperationMode, Pmm,
    ProtocolParams, Slot, SystemCode, Uid, Uii, VicinityTag,
};

/// Result of one ISO 14443-3A anticollision loop at a cascade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnticollisionResult {
    /// UID CLn (four bytes, first may be the cascade tag).
    pub uid_cl: [u8; 4],
    /// At least one bit collision was resolved on the way, so other
    /// cards are still in the field.
    pub collision_seen: bool,
}

/// ISO 14443-3A PAL.
pub trait I14443p3a {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()>;

    /// REQA. Collisions in the ATQA come back as `ErrorKind::Collision`.
    fn request_a(&mut self) -> LayerResult<Atqa>;

    /// WUPA, also wakes halted cards.
    fn wakeup_a(&mut self) -> LayerResult<Atqa>;

    /// Bit-level anticollision at `level`; the PAL picks one branch on
    /// every collision.
    fn anticollision(&mut self, level: CascadeLevel) -> LayerResult<AnticollisionResult>;

    /// SELECT at `level`, returns the SAK.
    fn select(&mut self, level: CascadeLevel, uid_cl: &[u8; 4]) -> LayerResult<u8>;

    fn halt_a(&mut self) -> LayerResult<()>;

    /// RID of a Jewel/Topaz tag (UID bytes).
    fn read_jewel_id(&mut self) -> LayerResult<[u8; 4]> {
        Err(LayerError::new(Component::I14443p3a, ErrorKind::Unsupported))
    }
}

/// ISO 14443-4A activation PAL (RATS/PPS).
pub trait I14443p4a {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()>;

    /// RATS, returns the ATS.
    fn rats(&mut self, fsdi: u8, cid: u8) -> LayerResult<Vec<u8>>;

    fn pps(&mut self, dri: u8, dsi: u8) -> LayerResult<()>;

    /// Protocol parameters derived from the last ATS.
    fn protocol_params(&self) -> LayerResult<ProtocolParams>;
}

/// ISO 14443-3B PAL.
pub trait I14443p3b {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()>;

    /// REQB with `2^slot_exponent` slots; answers from slot 1 only.
    fn request_b(&mut self, afi: u8, slot_exponent: u8, extended_atqb: bool) -> LayerResult<Atqb>;

    fn wakeup_b(&mut self, afi: u8, slot_exponent: u8, extended_atqb: bool) -> LayerResult<Atqb>;

    /// Slot-MARKER for slot number `slot` (2..=16).
    fn slot_marker(&mut self, slot: u8) -> LayerResult<Atqb>;

    fn halt_b(&mut self, pupi: &[u8; 4]) -> LayerResult<()>;

    /// ATTRIB, returns the MBLI/CID byte of the answer.
    fn attrib(&mut self, atqb: &Atqb, fsdi: u8, cid: u8, dri: u8, dsi: u8) -> LayerResult<u8>;

    /// Protocol parameters derived from the ATQB and ATTRIB answer.
    fn protocol_params(&self) -> LayerResult<ProtocolParams>;
}

/// ISO 14443-4 half-duplex block transmission PAL.
pub trait I14443p4 {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()>;

    fn set_protocol(&mut self, params: &ProtocolParams) -> LayerResult<()>;
}

/// FeliCa PAL.
pub trait Felica {
    /// ReqC (SENSF_REQ). `time_slot` is the number of slots minus one; the
    /// PAL returns every answer it received without error.
    fn request_c(
        &mut self,
        system_code: SystemCode,
        request_code: u8,
        time_slot: u8,
    ) -> LayerResult<Vec<FelicaResponse>>;

    /// Bind subsequent exchanges to the given card.
    fn activate_card(&mut self, idm: &Idm, pmm: &Pmm) -> LayerResult<()>;
}

/// ISO 15693 PAL.
pub trait Sli15693 {
    /// Single-slot INVENTORY with the given mask.
    fn inventory(&mut self, flags: u8, mask: u64, mask_len: u8) -> LayerResult<VicinityTag>;

    /// 16-slot INVENTORY with the given mask, one entry per slot.
    fn inventory_16(
        &mut self,
        flags: u8,
        mask: u64,
        mask_len: u8,
    ) -> LayerResult<Vec<Slot<VicinityTag>>>;

    fn select(&mut self, uid: &Uid) -> LayerResult<()>;

    /// Use `uid` for addressed commands.
    fn set_uid(&mut self, uid: &Uid) -> LayerResult<()>;
}

/// ISO 18000-3 mode 3 PAL.
pub trait I18000p3m3 {
    /// Select + BeginRound with Q = 0.
    fn begin_round(&mut self) -> LayerResult<Uii>;

    /// One inventory round with `2^q` slots.
    fn inventory_round(&mut self, q: u8) -> LayerResult<Vec<Slot<Uii>>>;

    /// Req_RN, returns the tag handle.
    fn req_rn(&mut self, uii: &Uii) -> LayerResult<u16>;
}

/// ISO 18092 passive/active initiator PAL.
pub trait I18092mPi {
    /// ATR_REQ, returns the ATR_RES.
    fn atr(&mut self, request: &AtrRequest) -> LayerResult<Vec<u8>>;

    /// WUP_REQ for a target put to sleep with DSL_REQ.
    fn wakeup(&mut self, nfcid3: &[u8; 10], did: u8) -> LayerResult<()>;

    /// DSL_REQ (`sleep`) or RLS_REQ.
    fn deselect(&mut self, sleep: bool) -> LayerResult<()>;
}
