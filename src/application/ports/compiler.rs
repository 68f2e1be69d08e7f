use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::domain::entities::Target;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Compilation failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for the source-to-bytecode transform applied to code entries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Transform `source` for `target`; the result is embedded in place of it
    async fn compile(
        &self,
        options: &[String],
        target: &Target,
        source: Bytes,
    ) -> Result<Bytes, CompileError>;
}
