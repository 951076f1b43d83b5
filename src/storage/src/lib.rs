#[macro_use]
extern crate async_trait;

use std::io;
use std::io::ErrorKind;

pub mod file;
pub mod memory;
pub mod mmap;

pub use file::writable_file::WritableFile;
pub use memory::{MemoryFile, MemoryWritable};
pub use mmap::MmapReadableFile;

/// RandomAccessFile is a readable byte source addressed by absolute offsets.
/// Show files are parsed through it so block bodies can be fetched on demand.
#[async_trait]
pub trait RandomAccessFile: Send + Sync {
    /// read fills `buf` with the bytes starting at `offset` and returns the
    /// number of bytes copied. Reading past the end fails with `UnexpectedEof`.
    async fn read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// len returns the total size of the source in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait RandomAccessFileExt: RandomAccessFile {
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let n = self.read(offset, buf).await?;
        if n != buf.len() {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("short read at {}: got {}, exp {}", offset, n, buf.len()),
            ));
        }
        Ok(())
    }

    async fn read_u8(&self, offset: u64) -> io::Result<u8> {
        let mut buf = [0; 1];
        self.read_exact_at(offset, &mut buf).await?;
        Ok(buf[0])
    }

    async fn read_u16_le(&self, offset: u64) -> io::Result<u16> {
        let mut buf = [0; 2];
        self.read_exact_at(offset, &mut buf).await?;
        Ok(u16::from_le_bytes(buf))
    }

    async fn read_u32_le(&self, offset: u64) -> io::Result<u32> {
        let mut buf = [0; 4];
        self.read_exact_at(offset, &mut buf).await?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl<R: RandomAccessFile + ?Sized> RandomAccessFileExt for R {}

/// Writable is an append-only byte sink.
#[async_trait]
pub trait Writable: Send {
    async fn append(&mut self, data: &[u8]) -> io::Result<usize>;

    async fn flush(&mut self) -> io::Result<()>;

    /// sync makes appended data durable. In-memory sinks treat it as a no-op.
    async fn sync(&mut self) -> io::Result<()>;
}

/// check_range validates that `len` bytes starting at `offset` lie within a
/// source of `size` bytes.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> io::Result<usize> {
    let upper = offset.checked_add(len as u64);
    match upper {
        Some(upper) if upper <= size => Ok(offset as usize),
        _ => Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("read of {} bytes at {} exceeds size {}", len, offset, size),
        )),
    }
}
