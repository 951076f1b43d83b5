use std::io;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use tokio::fs::File;

use crate::{check_range, RandomAccessFile};

/// MmapReadableFile exposes a file on disk through a read-only memory map.
/// Empty files are not mapped at all since a zero-length mapping is rejected
/// on some platforms.
pub struct MmapReadableFile {
    f: File,
    len: u64,
    mmap: Option<Mmap>,
}

impl MmapReadableFile {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let f = File::open(path).await?;

        let meta = f.metadata().await?;
        let len = meta.len();

        let mmap = if len == 0 {
            None
        } else {
            Some(unsafe { MmapOptions::new().offset(0).len(len as usize).map(&f)? })
        };

        Ok(Self { f, len, mmap })
    }

    pub async fn close(self) -> io::Result<()> {
        let Self { f, mmap, .. } = self;
        drop(mmap);
        drop(f);
        Ok(())
    }
}

#[async_trait]
impl RandomAccessFile for MmapReadableFile {
    async fn read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let size = buf.len();
        if size == 0 {
            return Ok(0);
        }

        let start = check_range(offset, size, self.len)?;
        match &self.mmap {
            Some(mmap) => {
                buf.copy_from_slice(&mmap[start..start + size]);
                Ok(size)
            }
            None => Ok(0),
        }
    }

    fn len(&self) -> u64 {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use tokio::fs::File;
    use tokio::io;
    use tokio::io::AsyncWriteExt;

    use crate::mmap::MmapReadableFile;
    use crate::{RandomAccessFile, RandomAccessFileExt};

    #[tokio::test]
    async fn test_mmap_readable_file() -> io::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let show_file = dir.as_ref().join("show.skyb");

        let data = "0123456789".as_bytes();
        {
            let mut f = File::create(&show_file).await?;
            f.write_all(data).await?;
            f.sync_all().await?;
        }

        let accessor = MmapReadableFile::open(&show_file).await?;
        assert_eq!(accessor.len(), data.len() as u64);

        let mut buf = vec![0_u8; data.len()];
        accessor.read(0, &mut buf[..]).await?;
        assert_eq!(buf.as_slice(), data);

        assert_eq!(accessor.read_u16_le(2).await?, u16::from_le_bytes(*b"23"));

        let mut buf = [0_u8; 4];
        let err = accessor.read(8, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        accessor.close().await
    }

    #[tokio::test]
    async fn test_mmap_empty_file() -> io::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let show_file = dir.as_ref().join("empty.skyb");
        File::create(&show_file).await?.sync_all().await?;

        let accessor = MmapReadableFile::open(&show_file).await?;
        assert!(accessor.is_empty());

        let mut buf = [0_u8; 1];
        assert!(accessor.read_u8(0).await.is_err());
        assert_eq!(accessor.read(0, &mut buf[..0]).await?, 0);

        Ok(())
    }
}
