pub mod block;
pub mod checksum;
pub mod header;
pub mod reader;
pub mod registry;
pub mod writer;

#[cfg(test)]
pub(crate) mod testdata;

use bitflags::bitflags;

/// MAGIC is written as the first 4 bytes of a show file to identify it as a
/// Skybrush binary show file.
pub const MAGIC: &[u8; 4] = b"skyb";

/// The original format: magic and version only, no feature flags.
pub const VERSION_1: u8 = 1;

/// Adds a feature flag byte and an optional CRC32 checksum to the header.
pub const VERSION_2: u8 = 2;

pub const SUPPORTED_VERSIONS: [u8; 2] = [VERSION_1, VERSION_2];

pub const DEFAULT_VERSION: u8 = VERSION_2;

/// size in bytes of the block type and body length fields of a block
pub const BLOCK_HEADER_SIZE: usize = 3;

/// Max size of a block body, bounded by its 16-bit length field
pub const MAX_BLOCK_BODY_SIZE: usize = (1 << (2 * 8)) - 1;

/// size in bytes of the checksum field
pub const CHECKSUM_SIZE: usize = 4;

bitflags! {
    /// Features is the bitmask stored in the header of version 2+ files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u8 {
        /// A CRC32 checksum of the file follows the feature byte.
        const CRC32 = 0x01;
    }
}

impl Features {
    /// default_for_version returns the features a new file of the given version
    /// is written with unless the caller asks otherwise.
    pub fn default_for_version(version: u8) -> Self {
        if version >= VERSION_2 {
            Features::CRC32
        } else {
            Features::empty()
        }
    }
}

pub fn is_supported_version(version: u8) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}
