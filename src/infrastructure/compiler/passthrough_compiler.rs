use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{CompileError, Compiler};
use crate::domain::entities::Target;

/// Compiler that embeds code entries as their unchanged source
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCompiler;

#[async_trait]
impl Compiler for PassthroughCompiler {
    async fn compile(
        &self,
        _options: &[String],
        _target: &Target,
        source: Bytes,
    ) -> Result<Bytes, CompileError> {
        Ok(source)
    }
}
