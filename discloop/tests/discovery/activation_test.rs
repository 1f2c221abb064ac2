#[path = "../common/mod.rs"]
mod common;

use discloop::prelude::*;
use discloop::test_support::MockRig;

#[test]
fn caller_picks_the_tag_after_multi_device_resolution() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&[0x01, 0x00, 0x00, 0x01], 0x00);
    rig.p3a.add_card(&[0x02, 0x00, 0x00, 0x02], 0x20);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::A).unwrap();
    dl.set_config(ConfigKey::TypeADeviceLimit, 5u8).unwrap();
    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::MultiDeviceResolved);

    let index = dl
        .targets()
        .type_a
        .tags
        .iter()
        .position(|t| t.sak == 0x20)
        .unwrap() as u8;
    assert_eq!(dl.activate_card(Technology::TypeA, index).unwrap(), Status::DeviceActivated);
    assert_eq!(dl.targets().type_a.selected, Some(index as usize));
    assert_eq!(rig.p4a.count("rats"), 1);
}

#[test]
fn passive_p2p_target_over_type_f() {
    common::init_logging();
    let rig = MockRig::new();
    rig.felica
        .add_card(common::fixtures::nfc_dep_idm(), common::fixtures::felica_pmm());
    rig.pi.push_atr(Ok(common::fixtures::atr_res()));
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::F424).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::PassiveTargetActivated);
    assert_eq!(dl.targets().type_f.p2p.atr_res, common::fixtures::atr_res());

    dl.deactivate_target(Technology::TypeF424, 0, false).unwrap();
    assert_eq!(rig.pi.count("deselect_release"), 1);
    assert!(!dl.targets().type_f.tags[0].sleep_af);
}

#[test]
fn activation_index_must_exist() {
    let mut dl = MockRig::new().build();
    let err = dl.activate_card(Technology::TypeB, 3).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}
