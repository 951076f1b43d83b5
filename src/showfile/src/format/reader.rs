use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use skyb_storage::{MemoryFile, MmapReadableFile, RandomAccessFile, RandomAccessFileExt};

use crate::common::iterator::AsyncIterator;
use crate::error::{Result, ShowFileError};
use crate::format::block::{Block, BlockHeader, BlockType};
use crate::format::checksum::Checksum;
use crate::format::header::ShowFileHeader;
use crate::format::registry::BlockTypeRegistry;
use crate::format::{Features, BLOCK_HEADER_SIZE};
use crate::rth::decoder::decode_rth_plan;
use crate::rth::plan::RthPlan;

/// size of the chunks the checksum is computed over
const CHECKSUM_CHUNK_SIZE: usize = 64 * 1024;

/// ShowFileReader gives access to the blocks of a show file. The header is
/// validated, and the checksum verified, before any block is exposed. Block
/// bodies are only read when asked for.
pub struct ShowFileReader {
    header: ShowFileHeader,
    source: Arc<dyn RandomAccessFile>,
    registry: Arc<BlockTypeRegistry>,
}

impl ShowFileReader {
    pub async fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let source = Arc::new(MemoryFile::new(data));
        Self::open(source, BlockTypeRegistry::shared()).await
    }

    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_file_with(path, BlockTypeRegistry::shared()).await
    }

    pub async fn open_file_with(
        path: impl AsRef<Path>,
        registry: Arc<BlockTypeRegistry>,
    ) -> Result<Self> {
        let source = Arc::new(MmapReadableFile::open(path).await?);
        Self::open(source, registry).await
    }

    pub async fn open(
        source: Arc<dyn RandomAccessFile>,
        registry: Arc<BlockTypeRegistry>,
    ) -> Result<Self> {
        let header = ShowFileHeader::read_from(source.as_ref()).await?;

        let reader = Self {
            header,
            source,
            registry,
        };

        if let Some(expected) = header.checksum() {
            reader.verify_checksum(expected).await?;
        }

        debug!(
            version = header.version(),
            features = header.features().bits(),
            size = reader.source.len(),
            "opened show file"
        );

        Ok(reader)
    }

    async fn verify_checksum(&self, expected: u32) -> Result<()> {
        let mut checksum = Checksum::new();

        let mut zeroed = self.header;
        zeroed.set_checksum(0);
        let mut header_buf = Vec::with_capacity(zeroed.size());
        zeroed.append_to(&mut header_buf);
        checksum.update(&header_buf);

        let len = self.source.len();
        let mut offset = self.header.size() as u64;
        let mut chunk = vec![0_u8; CHECKSUM_CHUNK_SIZE];
        while offset < len {
            let n = CHECKSUM_CHUNK_SIZE.min((len - offset) as usize);
            self.source.read_exact_at(offset, &mut chunk[..n]).await?;
            checksum.update(&chunk[..n]);
            offset += n as u64;
        }

        let actual = checksum.value();
        if actual != expected {
            warn!(expected, actual, "show file checksum mismatch");
            return Err(ShowFileError::ChecksumMismatch { expected, actual });
        }

        trace!(checksum = actual, "show file checksum verified");
        Ok(())
    }

    pub fn header(&self) -> &ShowFileHeader {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.header.version()
    }

    pub fn features(&self) -> Features {
        self.header.features()
    }

    pub fn checksum(&self) -> Option<u32> {
        self.header.checksum()
    }

    pub fn registry(&self) -> &Arc<BlockTypeRegistry> {
        &self.registry
    }

    /// blocks returns a lazy iterator over the blocks of the file in stream
    /// order.
    pub fn blocks(&self) -> BlockIterator {
        BlockIterator {
            source: self.source.clone(),
            registry: self.registry.clone(),
            offset: self.header.size() as u64,
            len: self.source.len(),
            failure: None,
        }
    }

    /// read_all_blocks returns every block of the file, or the first error.
    pub async fn read_all_blocks(&self) -> Result<Vec<Block>> {
        self.blocks().try_collect().await
    }

    /// find_block returns the first block of the given type.
    pub async fn find_block(&self, typ: BlockType) -> Result<Option<Block>> {
        let mut itr = self.blocks();
        while let Some(block) = itr.try_next().await? {
            if block.block_type() == typ {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    /// read_comments returns the text of every COMMENT block.
    pub async fn read_comments(&self) -> Result<Vec<String>> {
        let mut comments = vec![];
        let mut itr = self.blocks();
        while let Some(block) = itr.try_next().await? {
            if block.block_type() == BlockType::Comment {
                let body = block.read().await?;
                comments.push(String::from_utf8(body.to_vec())?);
            }
        }
        Ok(comments)
    }

    /// read_rth_plan decodes the first RTH_PLAN block of the file.
    pub async fn read_rth_plan(&self) -> Result<Option<RthPlan>> {
        match self.find_block(BlockType::RthPlan).await? {
            Some(block) => {
                let body = block.read().await?;
                decode_rth_plan(&body).map(Some)
            }
            None => Ok(None),
        }
    }

    /// close releases the underlying source. Blocks handed out earlier keep
    /// their own reference to it.
    pub fn close(self) {
        drop(self)
    }
}

/// BlockIterator walks the frames of a show file. Once it fails it stays
/// failed, so a damaged stream is never reported as complete.
pub struct BlockIterator {
    source: Arc<dyn RandomAccessFile>,
    registry: Arc<BlockTypeRegistry>,
    offset: u64,
    len: u64,
    failure: Option<String>,
}

impl BlockIterator {
    async fn read_next(&mut self) -> Result<Block> {
        let available = self.len - self.offset;
        if available < BLOCK_HEADER_SIZE as u64 {
            return Err(ShowFileError::truncated(
                "block header",
                BLOCK_HEADER_SIZE as u64,
                available,
            ));
        }

        let mut buf = [0_u8; BLOCK_HEADER_SIZE];
        self.source.read_exact_at(self.offset, &mut buf).await?;
        let header = BlockHeader::unmarshal_binary(&buf)?;

        let body_offset = self.offset + BLOCK_HEADER_SIZE as u64;
        let available = self.len - body_offset;
        if available < header.length as u64 {
            return Err(ShowFileError::truncated(
                "block body",
                header.length as u64,
                available,
            ));
        }

        let typ = self.registry.type_of(header.code);
        if let BlockType::Other(code) = typ {
            warn!(code, offset = self.offset, "skipping over unknown block type");
        }
        trace!(%typ, length = header.length, offset = self.offset, "read block");

        self.offset += header.frame_size() as u64;
        Ok(Block::new(typ, header, body_offset, self.source.clone()))
    }
}

#[async_trait]
impl AsyncIterator for BlockIterator {
    type Item = Block;

    async fn try_next(&mut self) -> Result<Option<Self::Item>> {
        if let Some(reason) = &self.failure {
            return Err(ShowFileError::Malformed(format!(
                "block stream aborted earlier: {}",
                reason
            )));
        }

        if self.offset >= self.len {
            return Ok(None);
        }

        match self.read_next().await {
            Ok(block) => Ok(Some(block)),
            Err(e) => {
                self.failure = Some(e.to_string());
                Err(e)
            }
        }
    }
}
