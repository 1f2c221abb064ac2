#[path = "../common/mod.rs"]
mod common;

use discloop::hal::HalCall;
use discloop::prelude::*;
use discloop::test_support::MockRig;

#[test]
fn active_peer_wins_over_passive_card() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&common::fixtures::type_a_uid(), 0x00);
    rig.pi.push_atr(Ok(common::fixtures::atr_res()));
    let mut dl = rig.build();
    dl.set_config(ConfigKey::ActPollTechCfg, TechMask::A).unwrap();
    dl.set_config(ConfigKey::TypeAP2pGi, vec![0x46, 0x66, 0x6D]).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::ActiveTargetActivated);
    assert_eq!(rig.p3a.count("request_a"), 0);
    assert_eq!(dl.targets().type_a.p2p.atr_res, common::fixtures::atr_res());
    assert_eq!(
        rig.pi.last_atr().unwrap().general_bytes,
        vec![0x46, 0x66, 0x6D]
    );
}

#[test]
fn silent_active_poll_falls_through_to_passive() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&common::fixtures::type_a_uid(), 0x00);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::ActPollTechCfg, TechMask::ACTIVE_CAPABLE)
        .unwrap();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::A).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(rig.pi.count("atr"), 3);
    let calls = rig.hal.calls();
    let last_active = calls
        .iter()
        .rposition(|c| *c == HalCall::ApplyProtocolSettings(RfMode::ActiveF424))
        .unwrap();
    let first_passive = calls
        .iter()
        .position(|c| *c == HalCall::ApplyProtocolSettings(RfMode::PassiveA106))
        .unwrap();
    assert!(last_active < first_passive);
}

#[test]
fn active_poll_needs_the_initiator_pal() {
    let mut dl = MockRig::type_a_only().build();
    assert!(dl.set_config(ConfigKey::ActPollTechCfg, TechMask::A).is_err());
}
