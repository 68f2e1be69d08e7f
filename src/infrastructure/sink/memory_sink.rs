use async_trait::async_trait;

use crate::application::ports::{OutputSink, SinkError};

/// Output sink collecting the artifact in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Vec<u8>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.closed = true;
        Ok(())
    }
}
