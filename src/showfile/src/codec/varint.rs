//! Unsigned LEB128 integers: seven payload bits per byte, least significant
//! group first, the high bit marks that another byte follows.

/// MAX_VARINT_LEN64 is the maximum number of bytes a varint-encoded u64 takes.
pub const MAX_VARINT_LEN64: usize = 10;

const MSB: u8 = 0x80;
const DROP_MSB: u8 = 0x7F;

pub trait VarInt: Sized + Copy {
    /// required_space returns how many bytes encode_var needs for this value.
    fn required_space(self) -> usize;

    /// encode_var writes the value to the start of `dst` and returns the number
    /// of bytes written. `dst` must be at least `required_space()` long.
    fn encode_var(self, dst: &mut [u8]) -> usize;

    /// decode_var reads a value from the start of `src`. Returns `None` when
    /// the input ends mid-value or is longer than MAX_VARINT_LEN64 bytes.
    fn decode_var(src: &[u8]) -> Option<(Self, usize)>;

    fn encode_var_vec(self, dst: &mut Vec<u8>) -> usize {
        let mut buf = [0_u8; MAX_VARINT_LEN64];
        let n = self.encode_var(&mut buf);
        dst.extend_from_slice(&buf[..n]);
        n
    }
}

impl VarInt for u64 {
    fn required_space(self) -> usize {
        let mut v = self;
        let mut n = 1;
        while v >= MSB as u64 {
            v >>= 7;
            n += 1;
        }
        n
    }

    fn encode_var(self, dst: &mut [u8]) -> usize {
        debug_assert!(dst.len() >= self.required_space());

        let mut v = self;
        let mut i = 0;
        while v >= MSB as u64 {
            dst[i] = (v as u8) | MSB;
            v >>= 7;
            i += 1;
        }
        dst[i] = v as u8;
        i + 1
    }

    fn decode_var(src: &[u8]) -> Option<(Self, usize)> {
        let mut result = 0_u64;
        let mut shift = 0;

        for (i, b) in src.iter().enumerate() {
            if i == MAX_VARINT_LEN64 {
                return None;
            }
            // the tenth byte may only carry the single remaining bit
            if i == MAX_VARINT_LEN64 - 1 && *b > 1 {
                return None;
            }

            result |= ((b & DROP_MSB) as u64) << shift;
            if b & MSB == 0 {
                return Some((result, i + 1));
            }
            shift += 7;
        }

        None
    }
}
