use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, ShowFileError};
use crate::format::block::BlockType;

lazy_static! {
    static ref SKYBRUSH_REGISTRY: Arc<BlockTypeRegistry> = Arc::new(BlockTypeRegistry::skybrush());
}

/// BlockTypeRegistry maps block types to the single-byte codes written to
/// show files. A registry is immutable once built and is handed to readers
/// and writers explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTypeRegistry {
    codes: BTreeMap<BlockType, u8>,
    types: BTreeMap<u8, BlockType>,
}

impl BlockTypeRegistry {
    pub fn builder() -> BlockTypeRegistryBuilder {
        BlockTypeRegistryBuilder::default()
    }

    /// skybrush returns the codes used by Skybrush show files.
    fn skybrush() -> Self {
        let mut codes = BTreeMap::new();
        let mut types = BTreeMap::new();
        for (typ, code) in [
            (BlockType::Trajectory, 1),
            (BlockType::LightProgram, 2),
            (BlockType::Comment, 3),
            (BlockType::RthPlan, 4),
            (BlockType::YawControl, 5),
        ] {
            codes.insert(typ, code);
            types.insert(code, typ);
        }
        Self { codes, types }
    }

    /// shared returns the process-wide default registry.
    pub fn shared() -> Arc<BlockTypeRegistry> {
        SKYBRUSH_REGISTRY.clone()
    }

    /// code_of returns the code to write for `typ`. `Other` types carry their
    /// own code.
    pub fn code_of(&self, typ: BlockType) -> Result<u8> {
        match typ {
            BlockType::Other(code) => Ok(code),
            named => self
                .codes
                .get(&named)
                .copied()
                .ok_or(ShowFileError::UnregisteredBlockType(named)),
        }
    }

    /// type_of resolves a code read from a file. Unknown codes are never an
    /// error.
    pub fn type_of(&self, code: u8) -> BlockType {
        self.types
            .get(&code)
            .copied()
            .unwrap_or(BlockType::Other(code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for BlockTypeRegistry {
    fn default() -> Self {
        Self::skybrush()
    }
}

#[derive(Debug, Default)]
pub struct BlockTypeRegistryBuilder {
    codes: BTreeMap<BlockType, u8>,
    types: BTreeMap<u8, BlockType>,
}

impl BlockTypeRegistryBuilder {
    /// with_defaults starts from the Skybrush codes. Later `register` calls
    /// replace the code of a type that is already mapped.
    pub fn with_defaults() -> Self {
        let BlockTypeRegistry { codes, types } = BlockTypeRegistry::skybrush();
        Self { codes, types }
    }

    pub fn register(mut self, typ: BlockType, code: u8) -> Result<Self> {
        if let BlockType::Other(_) = typ {
            return Err(ShowFileError::Config(format!(
                "cannot register unnamed block type {}",
                typ
            )));
        }

        if let Some(existing) = self.types.get(&code) {
            if *existing != typ {
                return Err(ShowFileError::DuplicateBlockType(format!(
                    "code {} ({} and {})",
                    code, existing, typ
                )));
            }
        }

        if let Some(old) = self.codes.insert(typ, code) {
            self.types.remove(&old);
        }
        self.types.insert(code, typ);

        Ok(self)
    }

    pub fn build(self) -> BlockTypeRegistry {
        BlockTypeRegistry {
            codes: self.codes,
            types: self.types,
        }
    }
}
