use bytes::BufMut;
use skyb_storage::{RandomAccessFile, RandomAccessFileExt};

use crate::error::{Result, ShowFileError};
use crate::format::{is_supported_version, Features, CHECKSUM_SIZE, MAGIC, VERSION_2};

/// ShowFileHeader is the fixed-layout start of a show file:
///
/// | magic(4B) | version(1B) | [v2+] features(1B) | [CRC32] checksum(4B, LE) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowFileHeader {
    version: u8,
    features: Features,
    checksum: Option<u32>,
}

impl ShowFileHeader {
    pub fn new(version: u8, features: Features) -> Result<Self> {
        if !is_supported_version(version) {
            return Err(ShowFileError::UnsupportedVersion(version));
        }

        if version < VERSION_2 && !features.is_empty() {
            return Err(ShowFileError::UnsupportedFeatures {
                version,
                features: features.bits(),
            });
        }

        let checksum = features.contains(Features::CRC32).then_some(0);
        Ok(Self {
            version,
            features,
            checksum,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// checksum returns the stored checksum, if the file carries one.
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    pub(crate) fn set_checksum(&mut self, checksum: u32) {
        if self.checksum.is_some() {
            self.checksum = Some(checksum);
        }
    }

    pub fn has_feature_byte(&self) -> bool {
        self.version >= VERSION_2
    }

    /// size returns the encoded size of the header in bytes.
    pub fn size(&self) -> usize {
        let mut n = MAGIC.len() + 1;
        if self.has_feature_byte() {
            n += 1;
        }
        if self.checksum.is_some() {
            n += CHECKSUM_SIZE;
        }
        n
    }

    /// checksum_offset returns where the checksum field starts.
    pub fn checksum_offset(&self) -> Option<usize> {
        self.checksum.map(|_| MAGIC.len() + 2)
    }

    pub fn append_to<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(MAGIC);
        dst.put_u8(self.version);
        if self.has_feature_byte() {
            dst.put_u8(self.features.bits());
        }
        if let Some(checksum) = self.checksum {
            dst.put_u32_le(checksum);
        }
    }

    /// read_from parses and validates the header at the start of `source`. The
    /// checksum is only read here; verifying it is up to the caller.
    pub async fn read_from<R: RandomAccessFile + ?Sized>(source: &R) -> Result<Self> {
        let len = source.len();

        let mut magic = [0_u8; 4];
        if len < magic.len() as u64 {
            return Err(ShowFileError::InvalidMagic);
        }
        source.read_exact_at(0, &mut magic).await?;
        if &magic != MAGIC {
            return Err(ShowFileError::InvalidMagic);
        }

        let mut offset = MAGIC.len() as u64;
        let version = read_u8(source, offset, "version").await?;
        offset += 1;
        if !is_supported_version(version) {
            return Err(ShowFileError::UnsupportedVersion(version));
        }

        let mut features = Features::empty();
        if version >= VERSION_2 {
            let bits = read_u8(source, offset, "feature flags").await?;
            offset += 1;
            features = Features::from_bits_retain(bits);
        }

        let mut checksum = None;
        if features.contains(Features::CRC32) {
            if len < offset + CHECKSUM_SIZE as u64 {
                return Err(ShowFileError::truncated(
                    "checksum",
                    CHECKSUM_SIZE as u64,
                    len.saturating_sub(offset),
                ));
            }
            checksum = Some(source.read_u32_le(offset).await?);
        }

        Ok(Self {
            version,
            features,
            checksum,
        })
    }
}

async fn read_u8<R: RandomAccessFile + ?Sized>(
    source: &R,
    offset: u64,
    what: &'static str,
) -> Result<u8> {
    if source.len() <= offset {
        return Err(ShowFileError::truncated(what, 1, 0));
    }
    Ok(source.read_u8(offset).await?)
}
