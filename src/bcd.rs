//! Packed binary-coded decimal helpers.
//!
//! Neither function validates its input, matching the chip, which stores
//! whatever is written.

/// Packs `n` (0-99) into one byte, tens in the high nibble.
#[must_use]
pub const fn decimal_to_bcd(n: u8) -> u8 {
    n.wrapping_add(6 * (n / 10))
}

/// Unpacks a BCD byte. Non-BCD input yields an unspecified value.
#[must_use]
pub const fn bcd_to_decimal(bcd: u8) -> u8 {
    bcd - 6 * (bcd >> 4)
}
