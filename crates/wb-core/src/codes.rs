//! Classification-code taxonomy of the water observation product.
//!
//! Each observation pixel carries a bit-flag code: bit 7 (0x80) = water
//! detected, bit 3 (0x08) = low solar angle, bit 2 (0x04) = over sea.
//! A pixel counts as wet or dry only for the exact combinations below;
//! every other value (cloud, cloud shadow, terrain shadow, nodata, ...) is
//! unclassified. The taxonomy is fixed product data, not configuration.

/// Semantic class of one observation pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterClass {
    Wet,
    Dry,
    Invalid,
}

/// Clear open water.
pub const WET_CLEAR: u8 = 128;
/// Water over sea.
pub const WET_SEA: u8 = 132;
/// Water at low solar angle.
pub const WET_LOW_SOLAR: u8 = 136;
/// Water over sea at low solar angle.
pub const WET_SEA_LOW_SOLAR: u8 = 140;

/// Clear dry land.
pub const DRY_CLEAR: u8 = 0;
/// Dry over sea.
pub const DRY_SEA: u8 = 4;
/// Dry at low solar angle.
pub const DRY_LOW_SOLAR: u8 = 8;
/// Dry over sea at low solar angle.
pub const DRY_SEA_LOW_SOLAR: u8 = 12;

/// Classify one observation code. Total over `u8`; anything outside the
/// closed wet/dry sets is [`WaterClass::Invalid`].
pub const fn classify(code: u8) -> WaterClass {
    match code {
        WET_CLEAR | WET_SEA | WET_LOW_SOLAR | WET_SEA_LOW_SOLAR => WaterClass::Wet,
        DRY_CLEAR | DRY_SEA | DRY_LOW_SOLAR | DRY_SEA_LOW_SOLAR => WaterClass::Dry,
        _ => WaterClass::Invalid,
    }
}
