use std::io;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{check_range, RandomAccessFile, Writable};

/// MemoryFile serves reads from an in-memory buffer.
#[derive(Clone)]
pub struct MemoryFile {
    data: Bytes,
}

impl MemoryFile {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl RandomAccessFile for MemoryFile {
    async fn read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let size = buf.len();
        if size == 0 {
            return Ok(0);
        }

        let start = check_range(offset, size, self.data.len() as u64)?;
        buf.copy_from_slice(&self.data[start..start + size]);
        Ok(size)
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

/// MemoryWritable collects appended bytes in a growable buffer.
#[derive(Default)]
pub struct MemoryWritable {
    buf: BytesMut,
}

impl MemoryWritable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// contents returns a snapshot of everything appended so far.
    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

#[async_trait]
impl Writable for MemoryWritable {
    async fn append(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.put_slice(data);
        Ok(data.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use crate::memory::{MemoryFile, MemoryWritable};
    use crate::{RandomAccessFile, RandomAccessFileExt, Writable};

    #[tokio::test]
    async fn test_memory_file_reads() {
        let f = MemoryFile::new(&b"skyb\x02\x01\x28\xda\xd0\x83"[..]);
        assert_eq!(f.len(), 10);

        let mut magic = [0_u8; 4];
        f.read_exact_at(0, &mut magic).await.unwrap();
        assert_eq!(&magic, b"skyb");
        assert_eq!(f.read_u8(4).await.unwrap(), 2);
        assert_eq!(f.read_u32_le(6).await.unwrap(), 0x83d0da28);

        let err = f.read_u32_le(8).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_memory_writable_collects() {
        let mut w = MemoryWritable::with_capacity(16);
        w.append(b"sky").await.unwrap();
        w.append(b"b").await.unwrap();
        w.flush().await.unwrap();

        assert_eq!(&w.contents()[..], b"skyb");
        assert_eq!(&w.into_bytes()[..], b"skyb");
    }
}
