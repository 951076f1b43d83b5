use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::Writable;

/// WritableFile appends to a newly created file. An existing file at the
/// same path is never overwritten. The file only appears on disk with the
/// first append, so a sink dropped before writing leaves nothing behind.
pub struct WritableFile {
    path: PathBuf,
    f: Option<File>,
}

impl WritableFile {
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if tokio::fs::try_exists(&path).await? {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }

        Ok(Self { path, f: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn file(&mut self) -> io::Result<&mut File> {
        if self.f.is_none() {
            let f = OpenOptions::new()
                .create_new(true)
                .write(true)
                .append(true)
                .open(&self.path)
                .await?;
            self.f = Some(f);
        }

        self.f
            .as_mut()
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "file not open"))
    }
}

#[async_trait]
impl Writable for WritableFile {
    async fn append(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file().await?.write_all(data).await?;
        Ok(data.len())
    }

    async fn flush(&mut self) -> io::Result<()> {
        match self.f.as_mut() {
            Some(f) => f.flush().await,
            None => Ok(()),
        }
    }

    async fn sync(&mut self) -> io::Result<()> {
        match self.f.as_mut() {
            Some(f) => f.sync_all().await,
            None => Ok(()),
        }
    }
}
