#[path = "../common/mod.rs"]
mod common;

use discloop::prelude::*;
use discloop::test_support::MockRig;
use discloop::types::{Idm, TypeVMode, Uid};

#[test]
fn single_type_a_card_is_detected_resolved_and_activated() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&common::fixtures::type_a_uid(), 0x20);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::A).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(dl.detected_techs(), TechMask::A);
    assert_eq!(dl.num_of_cards(), 1);
    let type_a = &dl.targets().type_a;
    assert_eq!(type_a.tags[0].uid.as_bytes(), &common::fixtures::type_a_uid()[..]);
    assert_eq!(type_a.tags[0].sak, 0x20);
    assert_eq!(rig.p4a.last_rats(), Some((8, 0)));
    assert!(rig.p4.protocol().is_some());
}

#[test]
fn double_size_uid_is_assembled() {
    common::init_logging();
    let rig = MockRig::type_a_only();
    rig.p3a.add_card(&common::fixtures::type_a_double_uid(), 0x00);
    let mut dl = rig.build();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(
        dl.targets().type_a.tags[0].uid.as_bytes(),
        &common::fixtures::type_a_double_uid()[..]
    );
}

#[test]
fn init_twice_matches_init_once() {
    let rig = MockRig::new();
    let mut dl = rig.build();
    dl.set_config(ConfigKey::TypeADeviceLimit, 4u8).unwrap();
    dl.set_config(ConfigKey::GtA, 6000u16).unwrap();
    dl.set_config(ConfigKey::PasPollBailOut, TechMask::B).unwrap();

    dl.init();
    let keys = [
        ConfigKey::TypeADeviceLimit,
        ConfigKey::GtA,
        ConfigKey::PasPollBailOut,
        ConfigKey::PasPollTechCfg,
        ConfigKey::NextPollState,
    ];
    let once: Vec<ConfigValue> = keys.iter().map(|k| dl.get_config(*k).unwrap()).collect();
    dl.init();
    let twice: Vec<ConfigValue> = keys.iter().map(|k| dl.get_config(*k).unwrap()).collect();
    assert_eq!(once, twice);
    assert_eq!(once[0], ConfigValue::Byte(1));
    assert_eq!(once[1], ConfigValue::Word(5100));
}

#[test]
fn device_limit_caps_resolution() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&[0x01, 0x00, 0x00, 0x01], 0x00);
    rig.p3a.add_card(&[0x02, 0x00, 0x00, 0x02], 0x00);
    rig.p3a.add_card(&[0x03, 0x00, 0x00, 0x03], 0x00);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::A).unwrap();
    dl.set_config(ConfigKey::TypeADeviceLimit, 2u8).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::MultiDeviceResolved);
    assert_eq!(dl.targets().type_a.total_tags, 2);
    assert_eq!(dl.num_of_cards(), 2);
}

#[test]
fn device_limit_out_of_range_is_rejected() {
    let mut dl = MockRig::new().build();
    assert!(dl.set_config(ConfigKey::TypeADeviceLimit, 0u8).is_err());
    assert!(dl.set_config(ConfigKey::TypeBDeviceLimit, 6u8).is_err());
    assert_eq!(
        dl.get_config(ConfigKey::TypeADeviceLimit).unwrap(),
        ConfigValue::Byte(1)
    );
}

#[test]
fn bail_out_stops_detection_early() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3a.add_card(&common::fixtures::type_a_uid(), 0x00);
    rig.felica
        .add_card(common::fixtures::felica_idm(), common::fixtures::felica_pmm());
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollBailOut, TechMask::A).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(dl.detected_techs(), TechMask::A);
    assert_eq!(rig.felica.count("request_c"), 0);
    assert_eq!(rig.p3b.count("request_b"), 0);
}

#[test]
fn guard_time_f_after_b_has_a_floor() {
    let mut dl = MockRig::new().build();
    let err = dl.set_config(ConfigKey::GtFb, 20399u16).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert_eq!(dl.get_config(ConfigKey::GtFb).unwrap(), ConfigValue::Word(20400));
    dl.set_config(ConfigKey::GtFb, 20400u16).unwrap();
}

#[test]
fn type_b_card_is_activated() {
    common::init_logging();
    let rig = MockRig::new();
    rig.p3b.add_card(common::fixtures::type_b_pupi());
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::B).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(
        dl.targets().type_b.tags[0].atqb.pupi(),
        common::fixtures::type_b_pupi()
    );
    assert_eq!(rig.p3b.count("attrib"), 1);
}

#[test]
fn plain_felica_card_is_activated() {
    let rig = MockRig::new();
    rig.felica
        .add_card(common::fixtures::felica_idm(), common::fixtures::felica_pmm());
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::F212).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(
        rig.felica.activated(),
        Some(Idm::from_bytes(common::fixtures::felica_idm()))
    );
}

#[test]
fn vicinity_tag_is_selected() {
    let rig = MockRig::new();
    rig.sli.add_tag(common::fixtures::vicinity_uid(), 0x00);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::V).unwrap();
    dl.set_config(ConfigKey::TypeVMode, TypeVMode::Selected as u8).unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    assert_eq!(
        rig.sli.selected(),
        Some(Uid::from_bytes(common::fixtures::vicinity_uid().to_vec()))
    );
}

#[test]
fn i18000p3m3_tag_gets_a_handle() {
    let rig = MockRig::new();
    rig.i18000.add_tag(&common::fixtures::sample_uii());
    let mut dl = rig.build();
    dl.set_config(ConfigKey::PasPollTechCfg, TechMask::I18000P3M3)
        .unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);
    let tags = &dl.targets().i18000p3m3.tags;
    assert_eq!(tags[0].uii.as_bytes(), &common::fixtures::sample_uii()[..]);
    assert!(tags[0].handle.is_some());
}

#[test]
fn emvco_mode_ignores_vicinity_tags() {
    let rig = MockRig::new();
    rig.sli.add_tag(common::fixtures::vicinity_uid(), 0x00);
    let mut dl = rig.build();
    dl.set_config(ConfigKey::OperationMode, OperationMode::Emvco)
        .unwrap();

    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::NoTechDetected);
    assert_eq!(rig.sli.count("inventory"), 0);
}

#[test]
fn removal_reports_card_still_present() {
    common::init_logging();
    let rig = MockRig::type_a_only();
    rig.p3a.add_card(&common::fixtures::type_a_uid(), 0x00);
    let mut dl = rig.build();
    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::DeviceActivated);

    dl.set_config(ConfigKey::NextPollState, PollState::Removal)
        .unwrap();
    assert_eq!(dl.run(EntryPoint::Poll).unwrap(), Status::TechDetected);
    assert_eq!(dl.detected_techs(), TechMask::A);
}
