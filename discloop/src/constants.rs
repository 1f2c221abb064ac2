// discloop/src/constants.rs
//! Protocol constants and configuration defaults used across the crate

/// Maximum number of Type A/B/F tags tracked per technology
pub const MAX_CARDS_SUPPORTED: u8 = 5;

/// Maximum number of Type V and ISO 18000-3m3 tags tracked
pub const MAX_VICINITY_CARDS_SUPPORTED: u8 = 5;

/// Guard times in microseconds (NFC Forum Digital / ISO 15693 / 18000-3m3)
pub const TYPEA_GT_US: u16 = 5100;
/// Type B guard time
pub const TYPEB_GT_US: u16 = 5100;
/// Type F guard time
pub const TYPEF_GT_US: u16 = 20400;
/// Type B polled right after Type F with the field kept on
pub const F_TO_B_GT_US: u16 = 15300;
/// Type V guard time
pub const TYPEV_GT_US: u16 = 5200;
/// ISO 18000-3m3 guard time
pub const I18000P3M3_GT_US: u16 = 10000;
/// Field-off time before an active-mode attempt
pub const ACTIVE_GT_US: u16 = 5100;

/// ISO 14443 cascade tag, first byte of a partial UID
pub const CASCADE_TAG: u8 = 0x88;

/// SAK bits
pub const SAK_CASCADE_BIT: u8 = 0x04;
/// ISO 14443-4 compliant
pub const SAK_ISO14443_4: u8 = 0x20;
/// NFC-DEP compliant
pub const SAK_NFC_DEP: u8 = 0x40;
/// ISO 14443-4 and NFC-DEP in one tag
pub const SAK_MERGED: u8 = SAK_ISO14443_4 | SAK_NFC_DEP;

/// ISO 14443-4 / ISO 18092 parameter limits
pub const MAX_FSDI: u8 = 8;
/// Highest CID
pub const MAX_CID: u8 = 14;
/// Highest DRI/DSI exponent
pub const MAX_DRI_DSI: u8 = 3;
/// Highest NFC-DEP DID
pub const MAX_DID: u8 = 14;
/// Highest length reduction index
pub const MAX_LRI: u8 = 3;
/// Maximum ATR_REQ general bytes
pub const MAX_GENERAL_BYTES: usize = 48;

/// Default ISO 14443-4 frame size for the reader (FSD = 256)
pub const DEFAULT_FSDI: u8 = 8;

/// Type F time slots accepted by ReqC (number of slots minus one)
pub const TYPEF_TIME_SLOTS: [u8; 5] = [0, 1, 3, 7, 15];

/// Type V inventory request flags: high data rate, inventory, one slot
pub const TYPEV_DEFAULT_FLAGS: u8 = 0x26;

/// Type B slot exponents tried during resolution (N = 1..16)
pub const TYPEB_MAX_SLOT_EXPONENT: u8 = 4;

/// Inventory rounds used by ISO 18000-3m3 resolution
pub const I18000P3M3_MAX_Q: u8 = 15;
/// Rounds before resolution gives up
pub const I18000P3M3_MAX_ROUNDS: u8 = 4;

/// Bits in a Type V UID, bounds the inventory mask
pub const TYPEV_UID_BITS: u8 = 64;
/// 16-slot inventories sent by one Type V resolution
pub const TYPEV_MAX_INVENTORY_ROUNDS: u8 = 16;
