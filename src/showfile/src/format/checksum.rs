use crc32fast::Hasher;

/// Checksum accumulates the CRC32 stored in version 2 show files.
///
/// The format uses the reflected IEEE polynomial with a zero initial register
/// and no final inversion, computed over the whole file with the checksum
/// field itself zeroed. crc32fast inverts the register on entry and on exit,
/// so starting from `!0` and inverting the result yields exactly that.
#[derive(Clone)]
pub struct Checksum {
    h: Hasher,
}

impl Checksum {
    pub fn new() -> Self {
        Self {
            h: Hasher::new_with_initial(!0),
        }
    }

    pub fn update(&mut self, buf: &[u8]) {
        self.h.update(buf);
    }

    /// value returns the checksum of everything fed so far without
    /// consuming the accumulator.
    pub fn value(&self) -> u32 {
        !self.h.clone().finalize()
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

pub fn checksum(buf: &[u8]) -> u32 {
    let mut c = Checksum::new();
    c.update(buf);
    c.value()
}
