use std::path::Path;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use skyb_storage::{MemoryWritable, Writable, WritableFile};

use crate::config::ShowFileOptions;
use crate::error::{Result, ShowFileError};
use crate::format::block::{encode_block, BlockType};
use crate::format::checksum::Checksum;
use crate::format::header::ShowFileHeader;
use crate::format::registry::BlockTypeRegistry;
use crate::format::{Features, MAX_BLOCK_BODY_SIZE};
use crate::rth::encoder::{encode_rth_plan, RthPlanEncoder};
use crate::rth::plan::RthPlan;

enum WriterState {
    Open,
    /// holds the complete file as it was handed to the sink
    Finalized(Bytes),
    /// a write to the sink failed half way; nothing more can be done
    Poisoned,
}

/// ShowFileWriter builds a show file block by block. Blocks are buffered and
/// the whole file, header first, goes to the sink on finalize, once the
/// checksum over all blocks is known.
pub struct ShowFileWriter<W: Writable> {
    sink: W,
    header: ShowFileHeader,
    registry: Arc<BlockTypeRegistry>,

    buf: BytesMut,
    checksum: Option<Checksum>,
    blocks: usize,

    state: WriterState,
}

impl ShowFileWriter<MemoryWritable> {
    pub fn create_in_memory(version: u8) -> Result<Self> {
        Self::create_in_memory_with(ShowFileOptions::for_version(version))
    }

    pub fn create_in_memory_with(options: ShowFileOptions) -> Result<Self> {
        Self::new(MemoryWritable::new(), options)
    }
}

impl ShowFileWriter<WritableFile> {
    /// create_file prepares a new show file at path. An existing file is
    /// never overwritten, and nothing is written to disk before finalize.
    pub async fn create_file(path: impl AsRef<Path>, options: ShowFileOptions) -> Result<Self> {
        let sink = WritableFile::create(path).await?;
        Self::new(sink, options)
    }
}

impl<W: Writable> ShowFileWriter<W> {
    pub fn new(sink: W, options: ShowFileOptions) -> Result<Self> {
        let header = ShowFileHeader::new(options.version, options.features)?;

        let checksum = header.checksum().map(|_| {
            // the checksum field is still zero at this point
            let mut buf = Vec::with_capacity(header.size());
            header.append_to(&mut buf);

            let mut checksum = Checksum::new();
            checksum.update(&buf);
            checksum
        });

        Ok(Self {
            sink,
            header,
            registry: options.registry,
            buf: BytesMut::with_capacity(4096),
            checksum,
            blocks: 0,
            state: WriterState::Open,
        })
    }

    pub fn version(&self) -> u8 {
        self.header.version()
    }

    pub fn features(&self) -> Features {
        self.header.features()
    }

    /// block_count returns the number of blocks added so far.
    pub fn block_count(&self) -> usize {
        self.blocks
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, WriterState::Finalized(_))
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Finalized(_) => Err(ShowFileError::AlreadyFinalized),
            WriterState::Poisoned => Err(ShowFileError::WriterPoisoned),
        }
    }

    /// add_block appends a block with the given type and body. A rejected
    /// block leaves the writer untouched.
    pub async fn add_block(&mut self, typ: BlockType, body: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if body.len() > MAX_BLOCK_BODY_SIZE {
            return Err(ShowFileError::BodyTooLarge(body.len()));
        }
        let code = self.registry.code_of(typ)?;

        let start = self.buf.len();
        encode_block(&mut self.buf, code, body)?;
        if let Some(checksum) = self.checksum.as_mut() {
            checksum.update(&self.buf[start..]);
        }
        self.blocks += 1;

        trace!(%typ, code, length = body.len(), "added block");
        Ok(())
    }

    pub async fn add_comment(&mut self, comment: &str) -> Result<()> {
        self.add_block(BlockType::Comment, comment.as_bytes()).await
    }

    /// add_rth_plan encodes the plan with the smallest scale that fits all
    /// of its targets and appends it as an RTH_PLAN block.
    pub async fn add_rth_plan(&mut self, plan: &RthPlan) -> Result<()> {
        let body = encode_rth_plan(plan, None)?;
        self.add_block(BlockType::RthPlan, &body).await
    }

    pub async fn add_rth_plan_with_scale(&mut self, plan: &RthPlan, scale: u8) -> Result<()> {
        let body = RthPlanEncoder::new(scale).encode(plan)?;
        self.add_block(BlockType::RthPlan, &body).await
    }

    /// finalize fills in the checksum and writes the file to the sink.
    pub async fn finalize(&mut self) -> Result<()> {
        self.ensure_open()?;

        if let Some(checksum) = &self.checksum {
            self.header.set_checksum(checksum.value());
        }

        let mut out = BytesMut::with_capacity(self.header.size() + self.buf.len());
        self.header.append_to(&mut out);
        out.extend_from_slice(&self.buf);
        let contents = out.freeze();

        if let Err(e) = self.emit(&contents).await {
            self.state = WriterState::Poisoned;
            return Err(e);
        }

        debug!(
            version = self.header.version(),
            blocks = self.blocks,
            size = contents.len(),
            "finalized show file"
        );

        self.buf = BytesMut::new();
        self.state = WriterState::Finalized(contents);
        Ok(())
    }

    async fn emit(&mut self, contents: &[u8]) -> Result<()> {
        self.sink.append(contents).await?;
        self.sink.flush().await?;
        Ok(())
    }

    /// get_bytes returns the complete file. Only available after finalize.
    pub fn get_bytes(&self) -> Result<Bytes> {
        match &self.state {
            WriterState::Finalized(contents) => Ok(contents.clone()),
            WriterState::Open => Err(ShowFileError::NotFinalized),
            WriterState::Poisoned => Err(ShowFileError::WriterPoisoned),
        }
    }

    /// close finalizes the file if that has not happened yet, makes it durable
    /// and hands back the sink.
    pub async fn close(mut self) -> Result<W> {
        match self.state {
            WriterState::Open => self.finalize().await?,
            WriterState::Poisoned => return Err(ShowFileError::WriterPoisoned),
            WriterState::Finalized(_) => {}
        }

        self.sink.sync().await?;
        Ok(self.sink)
    }
}
