use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink already closed")]
    Closed,

    #[error("Output {0} is the stub binary")]
    OutputIsStub(PathBuf),
}

/// Port for the destination of the assembled artifact.
///
/// Chunks arrive in final file order. `close` is only called once every
/// segment has been written; a run that fails never closes the sink.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OutputSink: Send {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError>;

    /// Flush and close the destination, signalling a complete artifact
    async fn close(&mut self) -> Result<(), SinkError>;
}
