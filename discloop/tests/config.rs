// Property tests for the configuration register.

#[path = "common/mod.rs"]
mod common;

use discloop::prelude::*;
use discloop::test_support::MockRig;
use proptest::prelude::*;

const GUARD_KEYS: [ConfigKey; 7] = [
    ConfigKey::GtA,
    ConfigKey::GtB,
    ConfigKey::GtF,
    ConfigKey::GtBf,
    ConfigKey::GtV,
    ConfigKey::Gt18000p3m3,
    ConfigKey::GtActive,
];

proptest! {
    #[test]
    fn guard_times_read_back(idx in 0usize..GUARD_KEYS.len(), micros in any::<u16>()) {
        let mut dl = MockRig::new().build();
        let key = GUARD_KEYS[idx];
        dl.set_config(key, micros).unwrap();
        prop_assert_eq!(dl.get_config(key).unwrap(), ConfigValue::Word(micros));
    }

    #[test]
    fn rejected_device_limit_keeps_previous(good in 1u8..=5, bad in 6u8..) {
        let mut dl = MockRig::new().build();
        dl.set_config(ConfigKey::TypeBDeviceLimit, good).unwrap();
        prop_assert!(dl.set_config(ConfigKey::TypeBDeviceLimit, bad).is_err());
        prop_assert_eq!(
            dl.get_config(ConfigKey::TypeBDeviceLimit).unwrap(),
            ConfigValue::Byte(good)
        );
    }

    #[test]
    fn time_slot_accepts_only_listed_values(slot in any::<u8>()) {
        let mut dl = MockRig::new().build();
        let accepted = dl.set_config(ConfigKey::TypeFTimeSlot, slot).is_ok();
        prop_assert_eq!(accepted, [0u8, 1, 3, 7, 15].contains(&slot));
        let expected = if accepted { slot } else { 3 };
        prop_assert_eq!(
            dl.get_config(ConfigKey::TypeFTimeSlot).unwrap(),
            ConfigValue::Byte(expected)
        );
    }

    #[test]
    fn poll_mask_within_capabilities(bits in 0u8..0x40) {
        let mut dl = MockRig::type_a_only().build();
        let techs = TechMask::from_bits(bits);
        let accepted = dl.set_config(ConfigKey::PasPollTechCfg, techs).is_ok();
        prop_assert_eq!(accepted, techs.is_subset_of(TechMask::A));
    }
}

#[test]
fn read_only_keys_cannot_be_written() {
    common::init_logging();
    let mut dl = MockRig::new().build();
    for key in [
        ConfigKey::NrTagsFound,
        ConfigKey::TechDetected,
        ConfigKey::AdditionalInfo,
    ] {
        assert!(dl.set_config(key, 0u8).is_err());
    }
    assert_eq!(dl.get_config(ConfigKey::NrTagsFound).unwrap(), ConfigValue::Byte(0));
}

#[test]
fn mismatched_value_type_is_rejected() {
    let mut dl = MockRig::new().build();
    let err = dl.set_config(ConfigKey::AntiColl, 1u8).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert_eq!(dl.get_config(ConfigKey::AntiColl).unwrap(), ConfigValue::Flag(true));
}

#[test]
fn operation_mode_reaches_the_pals() {
    let rig = MockRig::new();
    let mut dl = rig.build();
    dl.set_config(ConfigKey::OperationMode, OperationMode::Iso)
        .unwrap();
    assert_eq!(rig.p3a.operation_mode(), Some(OperationMode::Iso));
    assert_eq!(rig.p3b.operation_mode(), Some(OperationMode::Iso));
    assert_eq!(rig.p4.operation_mode(), Some(OperationMode::Iso));
    assert_eq!(
        dl.get_config(ConfigKey::OperationMode).unwrap(),
        ConfigValue::Mode(OperationMode::Iso)
    );
}

/// Every writable key with one accepted and one rejected value.
fn writable_keys() -> Vec<(ConfigKey, ConfigValue, ConfigValue)> {
    use ConfigValue::{Byte, Bytes, Flag, Mode, PollState as State, Techs, Word};
    vec![
        (ConfigKey::PasPollTechCfg, Techs(TechMask::B), Techs(TechMask::from_bits(0x40))),
        (ConfigKey::PasLisTechCfg, Techs(TechMask::F212), Techs(TechMask::V)),
        (ConfigKey::ActPollTechCfg, Techs(TechMask::A), Techs(TechMask::B)),
        (ConfigKey::ActLisTechCfg, Techs(TechMask::F424), Techs(TechMask::B)),
        (
            ConfigKey::PasPollBailOut,
            Techs(TechMask::A.union(TechMask::B)),
            Techs(TechMask::from_bits(0x80)),
        ),
        (ConfigKey::NextPollState, State(PollState::Removal), Byte(2)),
        (ConfigKey::EnableLpcd, Flag(true), Byte(1)),
        (ConfigKey::AntiColl, Flag(false), Byte(0)),
        (ConfigKey::CollisionPending, Flag(true), Byte(1)),
        (ConfigKey::OperationMode, Mode(OperationMode::Iso), Byte(2)),
        (ConfigKey::GtA, Word(6000), Flag(true)),
        (ConfigKey::GtB, Word(6000), Flag(true)),
        (ConfigKey::GtF, Word(21000), Flag(true)),
        (ConfigKey::GtFb, Word(25000), Word(100)),
        (ConfigKey::GtBf, Word(16000), Flag(true)),
        (ConfigKey::GtV, Word(6000), Flag(true)),
        (ConfigKey::Gt18000p3m3, Word(11000), Flag(true)),
        (ConfigKey::GtActive, Word(6000), Flag(true)),
        (ConfigKey::TypeADeviceLimit, Byte(2), Byte(0)),
        (ConfigKey::TypeBDeviceLimit, Byte(2), Byte(6)),
        (ConfigKey::TypeFDeviceLimit, Byte(2), Byte(0)),
        (ConfigKey::TypeVDeviceLimit, Byte(2), Byte(6)),
        (ConfigKey::I18000p3m3DeviceLimit, Byte(2), Byte(0)),
        (ConfigKey::TypeAI3p4Fsdi, Byte(5), Byte(9)),
        (ConfigKey::TypeAI3p4Cid, Byte(3), Byte(15)),
        (ConfigKey::TypeAI3p4Dri, Byte(2), Byte(4)),
        (ConfigKey::TypeAI3p4Dsi, Byte(2), Byte(4)),
        (ConfigKey::TypeAP2pDid, Byte(3), Byte(15)),
        (ConfigKey::TypeAP2pLri, Byte(2), Byte(4)),
        (ConfigKey::TypeAP2pNadEnable, Flag(true), Byte(1)),
        (ConfigKey::TypeAP2pNad, Byte(5), Flag(true)),
        (ConfigKey::TypeAP2pGi, Bytes(vec![0x46, 0x66, 0x6d]), Bytes(vec![0; 49])),
        (ConfigKey::TypeBAfi, Byte(0x10), Flag(true)),
        (ConfigKey::TypeBExtendedAtqb, Flag(true), Byte(1)),
        (ConfigKey::TypeBI3p4Fsdi, Byte(5), Byte(9)),
        (ConfigKey::TypeBI3p4Cid, Byte(3), Byte(15)),
        (ConfigKey::TypeBI3p4Dri, Byte(2), Byte(4)),
        (ConfigKey::TypeBI3p4Dsi, Byte(2), Byte(4)),
        (ConfigKey::TypeFSystemCode, Word(0x12fc), Byte(0x12)),
        (ConfigKey::TypeFTimeSlot, Byte(7), Byte(2)),
        (ConfigKey::TypeFP2pDid, Byte(3), Byte(15)),
        (ConfigKey::TypeFP2pLri, Byte(2), Byte(4)),
        (ConfigKey::TypeFP2pNadEnable, Flag(true), Byte(1)),
        (ConfigKey::TypeFP2pNad, Byte(5), Flag(true)),
        (ConfigKey::TypeFP2pGi, Bytes(vec![0x46, 0x66, 0x6d]), Bytes(vec![0; 49])),
        (ConfigKey::TypeVFlags, Byte(0x22), Flag(true)),
        (ConfigKey::TypeVMode, Byte(1), Byte(3)),
        (ConfigKey::TargetRetryCount, Byte(4), Flag(true)),
    ]
}

#[test]
fn every_writable_key_validates_and_keeps_previous_value() {
    common::init_logging();
    let table = writable_keys();
    assert_eq!(table.len(), 48);
    for (key, good, bad) in table {
        assert!(!key.is_read_only());
        let mut dl = MockRig::new().build();
        dl.set_config(key, good.clone())
            .unwrap_or_else(|e| panic!("{:?} rejected {:?}: {}", key, good, e));
        assert_eq!(dl.get_config(key).unwrap(), good, "{:?} read back", key);

        let err = dl.set_config(key, bad.clone()).unwrap_err();
        assert!(
            matches!(err, Error::InvalidParameter(_)),
            "{:?} = {:?} gave {:?}",
            key,
            bad,
            err
        );
        assert_eq!(dl.get_config(key).unwrap(), good, "{:?} kept after {:?}", key, bad);
    }
}
