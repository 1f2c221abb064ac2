// discloop/src/hal/mock.rs

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{Component, ErrorKind, LayerError, LayerResult};
use crate::hal::traits::{Hal, HalConfig, RfMode, WaitUnit};
use crate::types::{ListenActivation, TechMask};

/// Recorded HAL call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalCall {
    FieldOn,
    FieldOff,
    Wait(WaitUnit, u16),
    Lpcd,
    ApplyProtocolSettings(RfMode),
    SetConfig(HalConfig),
    Autocoll(TechMask, TechMask),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<HalCall>,
    field_on: bool,
    field_on_results: VecDeque<LayerResult<()>>,
    lpcd_results: VecDeque<LayerResult<()>>,
    autocoll_results: VecDeque<LayerResult<ListenActivation>>,
}

/// Mock HAL for unit tests. It records every call and returns queued
/// results; unqueued `field_on`/`lpcd` succeed and unqueued `autocoll`
/// times out.
///
/// Clones share the same state so a test can keep one handle while the
/// discovery loop owns another.
#[derive(Debug, Clone, Default)]
pub struct MockHal {
    state: Rc<RefCell<State>>,
}

impl MockHal {
    /// Mock with an empty journal and nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `field_on`.
    pub fn push_field_on(&self, result: LayerResult<()>) {
        self.state.borrow_mut().field_on_results.push_back(result);
    }

    /// Queue the result of the next LPCD wait.
    pub fn push_lpcd(&self, result: LayerResult<()>) {
        self.state.borrow_mut().lpcd_results.push_back(result);
    }

    /// Queue the result of the next autocollision.
    pub fn push_autocoll(&self, result: LayerResult<ListenActivation>) {
        self.state.borrow_mut().autocoll_results.push_back(result);
    }

    /// Every HAL call so far, oldest first.
    pub fn calls(&self) -> Vec<HalCall> {
        self.state.borrow().calls.clone()
    }

    /// How many times `call` was made.
    pub fn count(&self, call: &HalCall) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    /// Whether the mock field is currently on.
    pub fn is_field_on(&self) -> bool {
        self.state.borrow().field_on
    }

    /// Guard waits issued, in order, in microseconds.
    pub fn waits_us(&self) -> Vec<u32> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                HalCall::Wait(WaitUnit::Micros, t) => Some(*t as u32),
                HalCall::Wait(WaitUnit::Millis, t) => Some(*t as u32 * 1000),
                _ => None,
            })
            .collect()
    }

    /// Forget the journal.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record(&self, call: HalCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Hal for MockHal {
    fn field_on(&mut self) -> LayerResult<()> {
        self.record(HalCall::FieldOn);
        let mut st = self.state.borrow_mut();
        let result = st.field_on_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            st.field_on = true;
        }
        result
    }

    fn field_off(&mut self) -> LayerResult<()> {
        self.record(HalCall::FieldOff);
        self.state.borrow_mut().field_on = false;
        Ok(())
    }

    fn wait(&mut self, unit: WaitUnit, ticks: u16) -> LayerResult<()> {
        self.record(HalCall::Wait(unit, ticks));
        Ok(())
    }

    fn lpcd(&mut self) -> LayerResult<()> {
        self.record(HalCall::Lpcd);
        self.state.borrow_mut().lpcd_results.pop_front().unwrap_or(Ok(()))
    }

    fn apply_protocol_settings(&mut self, mode: RfMode) -> LayerResult<()> {
        self.record(HalCall::ApplyProtocolSettings(mode));
        Ok(())
    }

    fn set_config(&mut self, config: HalConfig) -> LayerResult<()> {
        self.record(HalCall::SetConfig(config));
        Ok(())
    }

    fn autocoll(&mut self, passive: TechMask, active: TechMask) -> LayerResult<ListenActivation> {
        self.record(HalCall::Autocoll(passive, active));
        self.state
            .borrow_mut()
            .autocoll_results
            .pop_front()
            .unwrap_or(Err(LayerError::new(Component::Hal, ErrorKind::IoTimeout)))
    }
}
