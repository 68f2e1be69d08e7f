use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::application::ports::{OutputSink, SinkError};
use crate::domain::entities::Target;

/// Write buffer capacity; 512KB keeps syscalls low for multi-megabyte stubs
const WRITE_BUFFER_SIZE: usize = 512 * 1024;

/// Output sink writing the artifact to a file on disk.
///
/// The destination is created (or truncated) up front. A run that fails
/// leaves the partial file in place.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    durable: bool,
    bytes_written: u64,
}

impl FileSink {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        Self::with_durability(path, false).await
    }

    /// Create a sink that also fsyncs the file on close when `durable` is set
    pub async fn with_durability(path: impl Into<PathBuf>, durable: bool) -> Result<Self, SinkError> {
        let path = path.into();
        let file = File::create(&path).await?;
        debug!(path = ?path, durable, "Opened artifact for writing");
        Ok(Self {
            path,
            writer: Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
            durable,
            bytes_written: 0,
        })
    }

    /// Create a sink for the target's output, refusing to truncate its stub
    pub async fn for_target(target: &Target, durable: bool) -> Result<Self, SinkError> {
        if same_file(&target.stub_path, &target.output_path).await {
            return Err(SinkError::OutputIsStub(target.output_path.clone()));
        }
        Self::with_durability(target.output_path.clone(), durable).await
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        let mut writer = self.writer.take().ok_or(SinkError::Closed)?;
        writer.flush().await?;

        // fsync() is expensive, only pay for it when asked to
        if self.durable {
            writer.get_mut().sync_all().await?;
        }

        debug!(path = ?self.path, bytes = self.bytes_written, "Artifact closed");
        Ok(())
    }
}

/// Whether both paths exist and resolve to the same file
async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");

        let mut sink = FileSink::create(&path).await.unwrap();
        sink.write(b"hello ").await.unwrap();
        sink.write(b"world").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.bytes_written(), 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_durable_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");

        let mut sink = FileSink::with_durability(&path, true).await.unwrap();
        sink.write(b"synced").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"synced");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::create(dir.path().join("artifact")).await.unwrap();
        sink.close().await.unwrap();

        assert!(matches!(sink.write(b"late").await, Err(SinkError::Closed)));
        assert!(matches!(sink.close().await, Err(SinkError::Closed)));
    }

    #[tokio::test]
    async fn test_for_target_refuses_to_overwrite_stub() {
        let dir = TempDir::new().unwrap();
        let stub = dir.path().join("node");
        std::fs::write(&stub, b"runtime").unwrap();

        // Same file through a different spelling of the path
        let output = dir.path().join(".").join("node");
        let result = FileSink::for_target(&Target::new(&stub, &output), false).await;

        assert!(matches!(result, Err(SinkError::OutputIsStub(_))));
        assert_eq!(std::fs::read(&stub).unwrap(), b"runtime");
    }

    #[tokio::test]
    async fn test_for_target_creates_output() {
        let dir = TempDir::new().unwrap();
        let stub = dir.path().join("node");
        std::fs::write(&stub, b"runtime").unwrap();
        let output = dir.path().join("app");

        let mut sink = FileSink::for_target(&Target::new(&stub, &output), false)
            .await
            .unwrap();
        sink.write(b"packed").await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"packed");
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = FileSink::create(dir.path().join("missing").join("artifact")).await;
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
