// fixtures.rs: identifiers of the simulated cards used across tests

fn decode<const N: usize>(s: &str) -> [u8; N] {
    let bytes = hex::decode(s).expect("fixture hex");
    bytes.try_into().expect("fixture length")
}

/// Single-size UID of a plain Type A card.
pub fn type_a_uid() -> Vec<u8> {
    hex::decode("04a1b2c3").unwrap()
}

/// Double-size UID, resolved over two cascade levels.
pub fn type_a_double_uid() -> Vec<u8> {
    hex::decode("04112233445566").unwrap()
}

pub fn type_b_pupi() -> [u8; 4] {
    decode("a0b0c0d0")
}

/// FeliCa IDm of a plain card (not NFC-DEP).
pub fn felica_idm() -> [u8; 8] {
    decode("012e4cd1a2b3c4d5")
}

/// IDm starting 01 FE: the tag speaks NFC-DEP.
pub fn nfc_dep_idm() -> [u8; 8] {
    decode("01fe0a0b0c0d0e0f")
}

pub fn felica_pmm() -> [u8; 8] {
    decode("0120220427674eff")
}

pub fn vicinity_uid() -> [u8; 8] {
    decode("e004010012345678")
}

pub fn sample_uii() -> Vec<u8> {
    hex::decode("3000e2801160").unwrap()
}

pub fn atr_res() -> Vec<u8> {
    hex::decode("d50100112233445566778899000000000e32").unwrap()
}
