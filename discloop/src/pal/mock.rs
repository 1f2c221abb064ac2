// discloop/src/pal/mock.rs
//! Simulated PALs for unit and integration tests.
//!
//! Each mock models the cards in the field with the state machine of its
//! protocol (idle/ready/active/halt) so that detection and collision
//! resolution behave as they would against real tags. Every call is
//! journaled, and errors can be injected per operation name. Clones share
//! state, so a test keeps one handle while the discovery loop owns another.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::{Component, ErrorKind, LayerError, LayerResult};
use crate::pal::traits::*;
use crate::types::{
    Atqa, Atqb, AtrRequest, CascadeLevel, FelicaResponse, Idm, OperationMode, Pmm,
    ProtocolParams, Slot, SystemCode, Uid, Uii, VicinityTag,
};

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<&'static str>,
    injected: HashMap<&'static str, VecDeque<ErrorKind>>,
}

impl Journal {
    fn enter(&mut self, op: &'static str, component: Component) -> LayerResult<()> {
        self.calls.push(op);
        match self.injected.get_mut(op).and_then(|q| q.pop_front()) {
            Some(kind) => Err(LayerError::new(component, kind)),
            None => Ok(()),
        }
    }
}

fn timeout(component: Component) -> LayerError {
    LayerError::new(component, ErrorKind::IoTimeout)
}

fn collision(component: Component) -> LayerError {
    LayerError::new(component, ErrorKind::Collision)
}

/// Answer of a single response slot: nobody, one card, or a collision.
fn single_answer<T: Clone>(component: Component, answers: &[T]) -> LayerResult<T> {
    match answers {
        [] => Err(timeout(component)),
        [one] => Ok(one.clone()),
        _ => Err(collision(component)),
    }
}

macro_rules! journal_accessors {
    ($mock:ty) => {
        impl $mock {
            /// Make the next call of `op` fail with `kind`.
            pub fn inject(&self, op: &'static str, kind: ErrorKind) {
                self.state
                    .borrow_mut()
                    .journal
                    .injected
                    .entry(op)
                    .or_default()
                    .push_back(kind);
            }

            /// Operations called so far, oldest first.
            pub fn calls(&self) -> Vec<&'static str> {
                self.state.borrow().journal.calls.clone()
            }

            /// How many times `op` ran.
            pub fn count(&self, op: &str) -> usize {
                self.state
                    .borrow()
                    .journal
                    .calls
                    .iter()
                    .filter(|c| **c == op)
                    .count()
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardState {
    Idle,
    Ready,
    Active,
    Halt,
}

// ---------------------------------------------------------------------------
// ISO 14443-3A
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SimCardA {
    uid: Vec<u8>,
    sak: u8,
    atqa: Atqa,
    state: CardState,
    /// Cascade levels already selected.
    level: usize,
}

impl SimCardA {
    fn levels(&self) -> usize {
        match self.uid.len() {
            4 => 1,
            7 => 2,
            _ => 3,
        }
    }

    fn uid_cl(&self, level: usize) -> [u8; 4] {
        let u = &self.uid;
        let last = level + 1 == self.levels();
        if last {
            let start = u.len() - 4;
            [u[start], u[start + 1], u[start + 2], u[start + 3]]
        } else {
            let start = level * 3;
            [crate::constants::CASCADE_TAG, u[start], u[start + 1], u[start + 2]]
        }
    }
}

fn level_index(level: CascadeLevel) -> usize {
    match level {
        CascadeLevel::One => 0,
        CascadeLevel::Two => 1,
        CascadeLevel::Three => 2,
    }
}

#[derive(Debug, Default)]
struct P3aState {
    journal: Journal,
    cards: Vec<SimCardA>,
    mode: Option<OperationMode>,
}

/// Simulated ISO 14443-3A field.
#[derive(Debug, Clone, Default)]
pub struct MockI14443p3a {
    state: Rc<RefCell<P3aState>>,
}

journal_accessors!(MockI14443p3a);

impl MockI14443p3a {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a card with the given UID (4, 7 or 10 bytes) and SAK into the
    /// field. The ATQA encodes the UID size.
    pub fn add_card(&self, uid: &[u8], sak: u8) {
        let size_bits = match uid.len() {
            4 => 0x00,
            7 => 0x40,
            _ => 0x80,
        };
        self.add_card_with_atqa(uid, sak, Atqa::from_bytes([size_bits | 0x04, 0x00]));
    }

    /// Card with an explicit ATQA.
    pub fn add_card_with_atqa(&self, uid: &[u8], sak: u8, atqa: Atqa) {
        self.state.borrow_mut().cards.push(SimCardA {
            uid: uid.to_vec(),
            sak,
            atqa,
            state: CardState::Idle,
            level: 0,
        });
    }

    /// Last mode handed over.
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.state.borrow().mode
    }

    fn answer(st: &mut P3aState, wake_halted: bool) -> LayerResult<Atqa> {
        let mut atqas = Vec::new();
        for card in st.cards.iter_mut() {
            let wakes = match card.state {
                CardState::Idle | CardState::Ready => true,
                CardState::Halt => wake_halted,
                CardState::Active => false,
            };
            if wakes {
                card.state = CardState::Ready;
                card.level = 0;
                atqas.push(card.atqa);
            }
        }
        single_answer(Component::I14443p3a, &atqas)
    }
}

impl I14443p3a for MockI14443p3a {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_operation_mode", Component::I14443p3a)?;
        st.mode = Some(mode);
        Ok(())
    }

    fn request_a(&mut self) -> LayerResult<Atqa> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("request_a", Component::I14443p3a)?;
        Self::answer(&mut st, false)
    }

    fn wakeup_a(&mut self) -> LayerResult<Atqa> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("wakeup_a", Component::I14443p3a)?;
        Self::answer(&mut st, true)
    }

    fn anticollision(&mut self, level: CascadeLevel) -> LayerResult<AnticollisionResult> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("anticollision", Component::I14443p3a)?;
        let idx = level_index(level);
        let mut cls: Vec<[u8; 4]> = st
            .cards
            .iter()
            .filter(|c| c.state == CardState::Ready && c.level == idx && idx < c.levels())
            .map(|c| c.uid_cl(idx))
            .collect();
        cls.sort();
        let first = *cls.first().ok_or(timeout(Component::I14443p3a))?;
        Ok(AnticollisionResult {
            uid_cl: first,
            collision_seen: cls.iter().any(|cl| *cl != first),
        })
    }

    fn select(&mut self, level: CascadeLevel, uid_cl: &[u8; 4]) -> LayerResult<u8> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("select", Component::I14443p3a)?;
        let idx = level_index(level);
        let mut sak = None;
        for card in st.cards.iter_mut() {
            if card.state != CardState::Ready || card.level != idx || idx >= card.levels() {
                continue;
            }
            if card.uid_cl(idx) == *uid_cl {
                if idx + 1 == card.levels() {
                    card.state = CardState::Active;
                    card.level = 0;
                    sak = Some(card.sak);
                } else {
                    card.level += 1;
                    sak = Some(crate::constants::SAK_CASCADE_BIT);
                }
            } else {
                card.state = CardState::Idle;
                card.level = 0;
            }
        }
        sak.ok_or(timeout(Component::I14443p3a))
    }

    fn halt_a(&mut self) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("halt_a", Component::I14443p3a)?;
        for card in st.cards.iter_mut().filter(|c| c.state == CardState::Active) {
            card.state = CardState::Halt;
        }
        Ok(())
    }

    fn read_jewel_id(&mut self) -> LayerResult<[u8; 4]> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("read_jewel_id", Component::I14443p3a)?;
        let ids: Vec<[u8; 4]> = st
            .cards
            .iter_mut()
            .filter(|c| c.state == CardState::Ready && c.atqa.is_jewel())
            .map(|c| {
                c.state = CardState::Active;
                [c.uid[0], c.uid[1], c.uid[2], c.uid[3]]
            })
            .collect();
        single_answer(Component::I14443p3a, &ids)
    }
}

// ---------------------------------------------------------------------------
// ISO 14443-4A and ISO 14443-4
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct P4aState {
    journal: Journal,
    ats: Vec<u8>,
    rats: Option<(u8, u8)>,
    pps: Option<(u8, u8)>,
    mode: Option<OperationMode>,
}

/// ISO 14443-4A mock answering RATS with a fixed ATS.
#[derive(Debug, Clone, Default)]
pub struct MockI14443p4a {
    state: Rc<RefCell<P4aState>>,
}

journal_accessors!(MockI14443p4a);

impl MockI14443p4a {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        let mock = Self::default();
        mock.state.borrow_mut().ats = vec![0x05, 0x78, 0x80, 0x70, 0x02];
        mock
    }

    /// Last (FSDI, CID) sent with RATS.
    pub fn last_rats(&self) -> Option<(u8, u8)> {
        self.state.borrow().rats
    }

    /// Last (DRI, DSI) sent with PPS.
    pub fn last_pps(&self) -> Option<(u8, u8)> {
        self.state.borrow().pps
    }

    /// Last mode handed over.
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.state.borrow().mode
    }
}

impl I14443p4a for MockI14443p4a {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_operation_mode", Component::I14443p4a)?;
        st.mode = Some(mode);
        Ok(())
    }

    fn rats(&mut self, fsdi: u8, cid: u8) -> LayerResult<Vec<u8>> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("rats", Component::I14443p4a)?;
        st.rats = Some((fsdi, cid));
        Ok(st.ats.clone())
    }

    fn pps(&mut self, dri: u8, dsi: u8) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("pps", Component::I14443p4a)?;
        st.pps = Some((dri, dsi));
        Ok(())
    }

    fn protocol_params(&self) -> LayerResult<ProtocolParams> {
        let st = self.state.borrow();
        let (fsdi, cid) = st.rats.ok_or(LayerError::new(Component::I14443p4a, ErrorKind::Internal))?;
        Ok(ProtocolParams {
            cid_enabled: true,
            cid,
            nad_supported: false,
            nad: 0,
            fwi: 7,
            fsdi,
            fsci: st.ats.get(1).map(|t0| t0 & 0x0F).unwrap_or(2),
        })
    }
}

#[derive(Debug, Default)]
struct P4State {
    journal: Journal,
    protocol: Option<ProtocolParams>,
    mode: Option<OperationMode>,
}

/// ISO 14443-4 mock recording the protocol parameters it receives.
#[derive(Debug, Clone, Default)]
pub struct MockI14443p4 {
    state: Rc<RefCell<P4State>>,
}

journal_accessors!(MockI14443p4);

impl MockI14443p4 {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters handed to the last RATS.
    pub fn protocol(&self) -> Option<ProtocolParams> {
        self.state.borrow().protocol
    }

    /// Last mode handed over.
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.state.borrow().mode
    }
}

impl I14443p4 for MockI14443p4 {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_operation_mode", Component::I14443p4)?;
        st.mode = Some(mode);
        Ok(())
    }

    fn set_protocol(&mut self, params: &ProtocolParams) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_protocol", Component::I14443p4)?;
        st.protocol = Some(*params);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ISO 14443-3B
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SimCardB {
    atqb: Atqb,
    state: CardState,
}

impl SimCardB {
    fn slot(&self, slot_exponent: u8) -> u8 {
        let n = 1u8 << slot_exponent;
        (self.atqb.pupi()[3] & (n - 1)) + 1
    }
}

#[derive(Debug, Default)]
struct P3bState {
    journal: Journal,
    cards: Vec<SimCardB>,
    slot_exponent: u8,
    attrib: Option<(u8, u8, u8, u8)>,
    mode: Option<OperationMode>,
}

/// Simulated ISO 14443-3B field. Cards pick their REQB slot from the low
/// bits of the last PUPI byte.
#[derive(Debug, Clone, Default)]
pub struct MockI14443p3b {
    state: Rc<RefCell<P3bState>>,
}

journal_accessors!(MockI14443p3b);

impl MockI14443p3b {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Card answering with `pupi`.
    pub fn add_card(&self, pupi: [u8; 4]) {
        let mut bytes = vec![0x50];
        bytes.extend_from_slice(&pupi);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x80, 0x71, 0x71]);
        let atqb = match Atqb::try_from(&bytes[..]) {
            Ok(atqb) => atqb,
            Err(_) => return,
        };
        self.state.borrow_mut().cards.push(SimCardB {
            atqb,
            state: CardState::Idle,
        });
    }

    /// Last (FSDI, CID, DRI, DSI) sent with ATTRIB.
    pub fn last_attrib(&self) -> Option<(u8, u8, u8, u8)> {
        self.state.borrow().attrib
    }

    /// Last mode handed over.
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.state.borrow().mode
    }

    fn request(st: &mut P3bState, slot_exponent: u8, wake_halted: bool) -> LayerResult<Atqb> {
        st.slot_exponent = slot_exponent;
        let mut answers = Vec::new();
        for card in st.cards.iter_mut() {
            let wakes = match card.state {
                CardState::Idle | CardState::Ready => true,
                CardState::Halt => wake_halted,
                CardState::Active => false,
            };
            if wakes {
                card.state = CardState::Ready;
                if card.slot(slot_exponent) == 1 {
                    answers.push(card.atqb.clone());
                }
            }
        }
        single_answer(Component::I14443p3b, &answers)
    }
}

impl I14443p3b for MockI14443p3b {
    fn set_operation_mode(&mut self, mode: OperationMode) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_operation_mode", Component::I14443p3b)?;
        st.mode = Some(mode);
        Ok(())
    }

    fn request_b(&mut self, _afi: u8, slot_exponent: u8, _extended_atqb: bool) -> LayerResult<Atqb> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("request_b", Component::I14443p3b)?;
        Self::request(&mut st, slot_exponent, false)
    }

    fn wakeup_b(&mut self, _afi: u8, slot_exponent: u8, _extended_atqb: bool) -> LayerResult<Atqb> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("wakeup_b", Component::I14443p3b)?;
        Self::request(&mut st, slot_exponent, true)
    }

    fn slot_marker(&mut self, slot: u8) -> LayerResult<Atqb> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("slot_marker", Component::I14443p3b)?;
        let exp = st.slot_exponent;
        let answers: Vec<Atqb> = st
            .cards
            .iter()
            .filter(|c| c.state == CardState::Ready && c.slot(exp) == slot)
            .map(|c| c.atqb.clone())
            .collect();
        single_answer(Component::I14443p3b, &answers)
    }

    fn halt_b(&mut self, pupi: &[u8; 4]) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("halt_b", Component::I14443p3b)?;
        let card = st
            .cards
            .iter_mut()
            .find(|c| c.atqb.pupi() == *pupi && c.state != CardState::Halt)
            .ok_or(timeout(Component::I14443p3b))?;
        card.state = CardState::Halt;
        Ok(())
    }

    fn attrib(&mut self, atqb: &Atqb, fsdi: u8, cid: u8, dri: u8, dsi: u8) -> LayerResult<u8> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("attrib", Component::I14443p3b)?;
        let pupi = atqb.pupi();
        let card = st
            .cards
            .iter_mut()
            .find(|c| c.atqb.pupi() == pupi && c.state == CardState::Ready)
            .ok_or(timeout(Component::I14443p3b))?;
        card.state = CardState::Active;
        st.attrib = Some((fsdi, cid, dri, dsi));
        Ok(cid & 0x0F)
    }

    fn protocol_params(&self) -> LayerResult<ProtocolParams> {
        let st = self.state.borrow();
        let (fsdi, cid, _, _) = st
            .attrib
            .ok_or(LayerError::new(Component::I14443p3b, ErrorKind::Internal))?;
        Ok(ProtocolParams {
            cid_enabled: true,
            cid,
            nad_supported: false,
            nad: 0,
            fwi: 7,
            fsdi,
            fsci: 8,
        })
    }
}

// ---------------------------------------------------------------------------
// FeliCa
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FelicaState {
    journal: Journal,
    cards: Vec<FelicaResponse>,
    last_request: Option<(SystemCode, u8, u8)>,
    activated: Option<Idm>,
}

/// Simulated FeliCa field. A card answers in slot `IDm[7] % slots`; cards
/// sharing a slot are lost to the collision.
#[derive(Debug, Clone, Default)]
pub struct MockFelica {
    state: Rc<RefCell<FelicaState>>,
}

journal_accessors!(MockFelica);

impl MockFelica {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Card answering ReqC with `idm` and `pmm`.
    pub fn add_card(&self, idm: [u8; 8], pmm: [u8; 8]) {
        self.state.borrow_mut().cards.push(FelicaResponse {
            idm: Idm::from_bytes(idm),
            pmm: Pmm::from_bytes(pmm),
        });
    }

    /// Last (system code, request code, time slot) of a ReqC.
    pub fn last_request(&self) -> Option<(SystemCode, u8, u8)> {
        self.state.borrow().last_request
    }

    /// Card left selected by activation.
    pub fn activated(&self) -> Option<Idm> {
        self.state.borrow().activated
    }
}

impl Felica for MockFelica {
    fn request_c(
        &mut self,
        system_code: SystemCode,
        request_code: u8,
        time_slot: u8,
    ) -> LayerResult<Vec<FelicaResponse>> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("request_c", Component::Felica)?;
        st.last_request = Some((system_code, request_code, time_slot));
        if st.cards.is_empty() {
            return Err(timeout(Component::Felica));
        }
        let slots = time_slot as usize + 1;
        let slot_of = |r: &FelicaResponse| r.idm.as_bytes()[7] as usize % slots;
        let answers: Vec<FelicaResponse> = st
            .cards
            .iter()
            .filter(|r| st.cards.iter().filter(|o| slot_of(o) == slot_of(r)).count() == 1)
            .copied()
            .collect();
        if answers.is_empty() {
            return Err(collision(Component::Felica));
        }
        Ok(answers)
    }

    fn activate_card(&mut self, idm: &Idm, _pmm: &Pmm) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("activate_card", Component::Felica)?;
        st.activated = Some(*idm);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ISO 15693
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SliState {
    journal: Journal,
    tags: Vec<VicinityTag>,
    selected: Option<Uid>,
    addressed: Option<Uid>,
}

fn uid_value(uid: &Uid) -> u64 {
    let mut bytes = [0u8; 8];
    for (dst, src) in bytes.iter_mut().zip(uid.as_bytes()) {
        *dst = *src;
    }
    u64::from_le_bytes(bytes)
}

fn mask_matches(value: u64, mask: u64, mask_len: u8) -> bool {
    match mask_len {
        0 => true,
        64.. => value == mask,
        len => value & ((1u64 << len) - 1) == mask,
    }
}

/// Simulated ISO 15693 field; UIDs are compared LSB first as in the
/// inventory mask.
#[derive(Debug, Clone, Default)]
pub struct MockSli15693 {
    state: Rc<RefCell<SliState>>,
}

journal_accessors!(MockSli15693);

impl MockSli15693 {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag answering inventory with `uid` and `dsfid`.
    pub fn add_tag(&self, uid: [u8; 8], dsfid: u8) {
        self.state.borrow_mut().tags.push(VicinityTag {
            uid: Uid::from_bytes(uid.to_vec()),
            dsfid,
        });
    }

    /// Tag left selected.
    pub fn selected(&self) -> Option<Uid> {
        self.state.borrow().selected.clone()
    }

    /// Tag left addressed.
    pub fn addressed(&self) -> Option<Uid> {
        self.state.borrow().addressed.clone()
    }
}

impl Sli15693 for MockSli15693 {
    fn inventory(&mut self, _flags: u8, mask: u64, mask_len: u8) -> LayerResult<VicinityTag> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("inventory", Component::Sli15693)?;
        let answers: Vec<VicinityTag> = st
            .tags
            .iter()
            .filter(|t| mask_matches(uid_value(&t.uid), mask, mask_len))
            .cloned()
            .collect();
        single_answer(Component::Sli15693, &answers)
    }

    fn inventory_16(
        &mut self,
        _flags: u8,
        mask: u64,
        mask_len: u8,
    ) -> LayerResult<Vec<Slot<VicinityTag>>> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("inventory_16", Component::Sli15693)?;
        let mut slots = Vec::with_capacity(16);
        for slot in 0..16u64 {
            let answers: Vec<&VicinityTag> = st
                .tags
                .iter()
                .filter(|t| {
                    let v = uid_value(&t.uid);
                    mask_len < 64 && mask_matches(v, mask, mask_len) && (v >> mask_len) & 0x0F == slot
                })
                .collect();
            slots.push(match answers.as_slice() {
                [] => Slot::Empty,
                [one] => Slot::Found((*one).clone()),
                _ => Slot::Collision,
            });
        }
        Ok(slots)
    }

    fn select(&mut self, uid: &Uid) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("select", Component::Sli15693)?;
        st.selected = Some(uid.clone());
        Ok(())
    }

    fn set_uid(&mut self, uid: &Uid) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("set_uid", Component::Sli15693)?;
        st.addressed = Some(uid.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ISO 18000-3 mode 3
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct I18000State {
    journal: Journal,
    tags: Vec<Uii>,
}

/// Simulated ISO 18000-3m3 field. A tag replies in slot
/// `sum(UII) % 2^Q`.
#[derive(Debug, Clone, Default)]
pub struct MockI18000p3m3 {
    state: Rc<RefCell<I18000State>>,
}

journal_accessors!(MockI18000p3m3);

impl MockI18000p3m3 {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag answering inventory with `uii`.
    pub fn add_tag(&self, uii: &[u8]) {
        self.state.borrow_mut().tags.push(Uii::from_bytes(uii.to_vec()));
    }
}

impl I18000p3m3 for MockI18000p3m3 {
    fn begin_round(&mut self) -> LayerResult<Uii> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("begin_round", Component::I18000p3m3)?;
        single_answer(Component::I18000p3m3, &st.tags)
    }

    fn inventory_round(&mut self, q: u8) -> LayerResult<Vec<Slot<Uii>>> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("inventory_round", Component::I18000p3m3)?;
        let slots = 1usize << q;
        let slot_of = |u: &Uii| u.as_bytes().iter().map(|b| *b as usize).sum::<usize>() % slots;
        Ok((0..slots)
            .map(|slot| {
                let answers: Vec<&Uii> = st.tags.iter().filter(|u| slot_of(u) == slot).collect();
                match answers.as_slice() {
                    [] => Slot::Empty,
                    [one] => Slot::Found((*one).clone()),
                    _ => Slot::Collision,
                }
            })
            .collect())
    }

    fn req_rn(&mut self, uii: &Uii) -> LayerResult<u16> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("req_rn", Component::I18000p3m3)?;
        st.tags
            .iter()
            .position(|u| u == uii)
            .map(|i| 0x1000 + i as u16)
            .ok_or(timeout(Component::I18000p3m3))
    }
}

// ---------------------------------------------------------------------------
// ISO 18092 initiator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PiState {
    journal: Journal,
    atr_results: VecDeque<LayerResult<Vec<u8>>>,
    last_atr: Option<AtrRequest>,
    last_wakeup: Option<([u8; 10], u8)>,
}

/// ISO 18092 initiator mock with a queue of ATR_REQ results; an empty
/// queue times out.
#[derive(Debug, Clone, Default)]
pub struct MockI18092mPi {
    state: Rc<RefCell<PiState>>,
}

journal_accessors!(MockI18092mPi);

impl MockI18092mPi {
    /// Mock with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next ATR_RES.
    pub fn push_atr(&self, result: LayerResult<Vec<u8>>) {
        self.state.borrow_mut().atr_results.push_back(result);
    }

    /// Last ATR_REQ sent.
    pub fn last_atr(&self) -> Option<AtrRequest> {
        self.state.borrow().last_atr.clone()
    }

    /// Last WUP_REQ sent.
    pub fn last_wakeup(&self) -> Option<([u8; 10], u8)> {
        self.state.borrow().last_wakeup
    }
}

impl I18092mPi for MockI18092mPi {
    fn atr(&mut self, request: &AtrRequest) -> LayerResult<Vec<u8>> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("atr", Component::I18092mPi)?;
        st.last_atr = Some(request.clone());
        st.atr_results
            .pop_front()
            .unwrap_or(Err(timeout(Component::I18092mPi)))
    }

    fn wakeup(&mut self, nfcid3: &[u8; 10], did: u8) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        st.journal.enter("wakeup", Component::I18092mPi)?;
        st.last_wakeup = Some((*nfcid3, did));
        Ok(())
    }

    fn deselect(&mut self, sleep: bool) -> LayerResult<()> {
        let mut st = self.state.borrow_mut();
        let op = if sleep { "deselect_sleep" } else { "deselect_release" };
        st.journal.enter(op, Component::I18092mPi)
    }
}
