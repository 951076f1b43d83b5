use std::fmt::{Display, Formatter};
use std::sync::Arc;

use bytes::{BufMut, Bytes};
use skyb_storage::{RandomAccessFile, RandomAccessFileExt};

use crate::error::{Result, ShowFileError};
use crate::format::{BLOCK_HEADER_SIZE, MAX_BLOCK_BODY_SIZE};

/// BlockType identifies the payload of a block. The numeric code written to
/// the file comes from a BlockTypeRegistry; codes the registry does not know
/// are carried as `Other` so newer files can still be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockType {
    Trajectory,
    LightProgram,
    Comment,
    RthPlan,
    YawControl,
    Other(u8),
}

impl BlockType {
    pub const NAMED: [BlockType; 5] = [
        BlockType::Trajectory,
        BlockType::LightProgram,
        BlockType::Comment,
        BlockType::RthPlan,
        BlockType::YawControl,
    ];

    /// name returns the configuration name of a named block type.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            BlockType::Trajectory => Some("trajectory"),
            BlockType::LightProgram => Some("lightProgram"),
            BlockType::Comment => Some("comment"),
            BlockType::RthPlan => Some("rthPlan"),
            BlockType::YawControl => Some("yawControl"),
            BlockType::Other(_) => None,
        }
    }

    pub fn from_name(name: &str) -> Option<BlockType> {
        Self::NAMED.into_iter().find(|t| t.name() == Some(name))
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Other(code) => write!(f, "other({})", code),
            named => write!(f, "{}", named.name().unwrap_or_default()),
        }
    }
}

/// BlockHeader is the fixed part of a frame: | type(1B) | body length(2B, LE) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub code: u8,
    pub length: u16,
}

impl BlockHeader {
    pub fn new(code: u8, body_len: usize) -> Result<Self> {
        if body_len > MAX_BLOCK_BODY_SIZE {
            return Err(ShowFileError::BodyTooLarge(body_len));
        }

        Ok(Self {
            code,
            length: body_len as u16,
        })
    }

    pub fn append_to<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.code);
        dst.put_u16_le(self.length);
    }

    pub fn unmarshal_binary(b: &[u8]) -> Result<Self> {
        if b.len() < BLOCK_HEADER_SIZE {
            return Err(ShowFileError::truncated(
                "block header",
                BLOCK_HEADER_SIZE as u64,
                b.len() as u64,
            ));
        }

        Ok(Self {
            code: b[0],
            length: u16::from_le_bytes([b[1], b[2]]),
        })
    }

    /// frame_size returns the number of bytes the whole frame occupies.
    pub fn frame_size(&self) -> usize {
        BLOCK_HEADER_SIZE + self.length as usize
    }
}

/// encode_block frames `body` as a block with the given type code and appends
/// it to `dst`. Returns the number of bytes appended. Nothing is written when
/// the body is too large.
pub fn encode_block<B: BufMut>(dst: &mut B, code: u8, body: &[u8]) -> Result<usize> {
    let header = BlockHeader::new(code, body.len())?;
    header.append_to(dst);
    dst.put_slice(body);
    Ok(header.frame_size())
}

/// decode_block reads one frame from the start of `b` and returns its header,
/// its body and the number of bytes consumed.
pub fn decode_block(b: &[u8]) -> Result<(BlockHeader, &[u8], usize)> {
    let header = BlockHeader::unmarshal_binary(b)?;
    let end = header.frame_size();
    if b.len() < end {
        return Err(ShowFileError::truncated(
            "block body",
            header.length as u64,
            (b.len() - BLOCK_HEADER_SIZE) as u64,
        ));
    }

    Ok((header, &b[BLOCK_HEADER_SIZE..end], end))
}

/// Block is a block of a show file that is open for reading. Its body stays in
/// the underlying source until `read` is called.
#[derive(Clone)]
pub struct Block {
    typ: BlockType,
    header: BlockHeader,
    /// offset of the body within the source
    offset: u64,
    source: Arc<dyn RandomAccessFile>,
}

impl Block {
    pub(crate) fn new(
        typ: BlockType,
        header: BlockHeader,
        offset: u64,
        source: Arc<dyn RandomAccessFile>,
    ) -> Self {
        Self {
            typ,
            header,
            offset,
            source,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.typ
    }

    pub fn code(&self) -> u8 {
        self.header.code
    }

    pub fn declared_length(&self) -> u16 {
        self.header.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// read loads the body of the block from the underlying source.
    pub async fn read(&self) -> Result<Bytes> {
        let len = self.header.length as usize;
        let available = self.source.len().saturating_sub(self.offset);
        if available < len as u64 {
            return Err(ShowFileError::truncated("block body", len as u64, available));
        }

        let mut body = vec![0_u8; len];
        self.source.read_exact_at(self.offset, &mut body).await?;
        Ok(Bytes::from(body))
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("type", &self.typ)
            .field("code", &self.header.code)
            .field("length", &self.header.length)
            .field("offset", &self.offset)
            .finish()
    }
}
