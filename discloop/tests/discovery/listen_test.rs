#[path = "../common/mod.rs"]
mod common;

use discloop::hal::HalCall;
use discloop::prelude::*;
use discloop::test_support::MockRig;
use discloop::types::ListenActivation;
use discloop::{Component, ErrorKind};

#[test]
fn listen_without_configuration_is_rejected() {
    let rig = MockRig::new();
    let mut dl = rig.build();
    let err = dl.run(EntryPoint::Listen).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert!(rig.hal.calls().iter().all(|c| !matches!(c, HalCall::Autocoll(..))));
}

#[test]
fn passive_activation_by_peer() {
    common::init_logging();
    let rig = MockRig::new();
    let activation = ListenActivation {
        technology: Technology::TypeA,
        active: false,
        frame: common::fixtures::atr_res(),
    };
    rig.hal.push_autocoll(Ok(activation.clone()));
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasLisTechCfg, TechMask::A.union(TechMask::F212))
        .unwrap();

    assert_eq!(dl.run(EntryPoint::Listen).unwrap(), Status::ActivatedByPeer);
    assert_eq!(dl.listen_activation(), Some(&activation));
}

#[test]
fn listen_gives_up_after_retries() {
    let rig = MockRig::new();
    for _ in 0..3 {
        rig.hal
            .push_autocoll(Err(LayerError::new(Component::Hal, ErrorKind::IoTimeout)));
    }
    let mut dl = rig.build();
    dl.set_config(ConfigKey::ActLisTechCfg, TechMask::F424).unwrap();
    dl.set_config(ConfigKey::TargetRetryCount, 2u8).unwrap();

    let err = dl.run(EntryPoint::Listen).unwrap_err();
    assert_eq!(
        err,
        Error::Failure(LayerError::new(Component::Hal, ErrorKind::IoTimeout))
    );
    assert_eq!(
        rig.hal
            .calls()
            .iter()
            .filter(|c| matches!(c, HalCall::Autocoll(..)))
            .count(),
        3
    );
}

#[test]
fn listen_rejects_technologies_that_cannot_listen() {
    let mut dl = MockRig::new().build();
    assert!(dl.set_config(ConfigKey::PasLisTechCfg, TechMask::V).is_err());
    assert!(dl.set_config(ConfigKey::ActLisTechCfg, TechMask::B).is_err());
}
