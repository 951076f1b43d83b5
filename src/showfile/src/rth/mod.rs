pub mod decoder;
pub mod encoder;
pub mod plan;
pub mod points;

#[cfg(test)]
pub(crate) mod testdata;

/// Largest scaling factor, bounded by the single byte it is stored in.
pub const MAX_SCALE: u8 = u8::MAX;

/// Action code of an entry that repeats the action and target of the
/// previous entry.
pub(crate) const ACTION_REPEAT: u8 = 0;

/// Flag bit: a post-delay byte follows the entry.
pub(crate) const FLAG_POST_DELAY: u8 = 0x01;

/// Flag bit: a pre-delay byte follows the entry.
pub(crate) const FLAG_PRE_DELAY: u8 = 0x02;

/// Bits of the low nibble that are reserved and must be zero.
pub(crate) const FLAG_RESERVED: u8 = 0x0C;

/// Most distinct points an entry can address with its one-byte index.
pub(crate) const MAX_POINTS: usize = u8::MAX as usize + 1;

/// quantize converts a coordinate in meters to millimeters divided by `scale`,
/// rounding half to even. Returns `None` if the result does not fit in an i16.
pub fn quantize(value: f64, scale: u8) -> Option<i16> {
    if scale == 0 {
        return None;
    }

    let q = (value * 1000.0 / scale as f64).round_ties_even();
    if q.is_finite() && q >= i16::MIN as f64 && q <= i16::MAX as f64 {
        Some(q as i16)
    } else {
        None
    }
}

/// dequantize is the inverse of quantize, up to the rounding error of at most
/// half a quantization step.
pub fn dequantize(raw: i16, scale: u8) -> f64 {
    raw as f64 * scale as f64 / 1000.0
}

pub(crate) fn fits_scale(value: f64, scale: u8) -> bool {
    quantize(value, scale).is_some()
}
