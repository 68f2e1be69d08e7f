use std::io::Cursor;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::BufReader;
use tracing::debug;

use crate::application::assembler::SegmentReader;
use crate::application::errors::PackError;
use crate::application::ports::Compiler;
use crate::domain::entities::{Entry, EntryKey, EntrySource, Target};
use crate::domain::value_objects::StorageKind;

/// Buffer size for entry file reads
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// An entry ready to be drained into the payload
pub struct ResolvedEntry {
    pub key: EntryKey,
    /// Entry key, plus the file path for file-backed entries
    pub origin: String,
    pub reader: SegmentReader,
}

/// Turns an entry into the byte source that ends up in the payload:
/// files are streamed, content buffers pass through verbatim, and code
/// buffers go through the compiler first.
pub struct EntryResolver {
    compiler: Arc<dyn Compiler>,
    options: Vec<String>,
    target: Target,
}

impl EntryResolver {
    pub fn new(compiler: Arc<dyn Compiler>, options: Vec<String>, target: Target) -> Self {
        Self {
            compiler,
            options,
            target,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub async fn resolve(&self, entry: Entry) -> Result<ResolvedEntry, PackError> {
        let (key, source) = entry.into_parts();
        let mut origin = key.to_string();

        let reader: SegmentReader = match source {
            EntrySource::File(path) => {
                if key.storage_kind != StorageKind::Content {
                    return Err(PackError::MalformedEntry {
                        snapshot: key.snapshot.to_string(),
                        reason: format!(
                            "file-backed entries must be stored as content, not {}",
                            key.storage_kind
                        ),
                    });
                }

                debug!(entry = %key, path = ?path, "Streaming entry from file");
                origin = format!("{} from {}", key, path.display());
                let file = File::open(&path)
                    .await
                    .map_err(|source| PackError::File { path, source })?;
                Box::pin(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            }
            EntrySource::Buffer(source) if key.storage_kind == StorageKind::Code => {
                debug!(entry = %key, size = source.len(), "Compiling code entry");
                let compiled = self
                    .compiler
                    .compile(&self.options, &self.target, source)
                    .await
                    .map_err(|source| PackError::CompileFailure {
                        snapshot: key.snapshot.to_string(),
                        source,
                    })?;
                Box::pin(Cursor::new(compiled))
            }
            EntrySource::Buffer(source) => Box::pin(Cursor::new(source)),
        };

        Ok(ResolvedEntry {
            key,
            origin,
            reader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CompileError, MockCompiler};
    use crate::domain::value_objects::SnapshotId;
    use bytes::Bytes;
    use tokio::io::AsyncReadExt;

    fn snap() -> SnapshotId {
        SnapshotId::new("/snapshot/app/index.js").unwrap()
    }

    fn resolver(compiler: MockCompiler) -> EntryResolver {
        EntryResolver::new(
            Arc::new(compiler),
            vec!["--flag".to_string()],
            Target::new("stub", "out"),
        )
    }

    async fn drain(mut reader: SegmentReader) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_content_buffer_passes_through() {
        let mut compiler = MockCompiler::new();
        compiler.expect_compile().times(0);

        let resolved = resolver(compiler)
            .resolve(Entry::buffer(snap(), StorageKind::Content, "verbatim"))
            .await
            .unwrap();

        assert_eq!(resolved.key.storage_kind, StorageKind::Content);
        assert_eq!(resolved.origin, "/snapshot/app/index.js (content)");
        assert_eq!(drain(resolved.reader).await, b"verbatim");
    }

    #[tokio::test]
    async fn test_content_file_is_streamed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"on disk").unwrap();

        let resolved = resolver(MockCompiler::new())
            .resolve(Entry::file(snap(), StorageKind::Content, file.path()))
            .await
            .unwrap();

        assert!(resolved.origin.starts_with("/snapshot/app/index.js (content) from "));
        assert!(resolved.origin.ends_with(&file.path().display().to_string()));
        assert_eq!(drain(resolved.reader).await, b"on disk");
    }

    #[tokio::test]
    async fn test_code_buffer_is_compiled() {
        let mut compiler = MockCompiler::new();
        compiler
            .expect_compile()
            .times(1)
            .withf(|options, target, source| {
                options.len() == 1
                    && options[0] == "--flag"
                    && target.stub_path.to_str() == Some("stub")
                    && &source[..] == b"console.log(1)"
            })
            .returning(|_, _, _| Ok(Bytes::from_static(b"BYTECODE")));

        let resolved = resolver(compiler)
            .resolve(Entry::buffer(snap(), StorageKind::Code, "console.log(1)"))
            .await
            .unwrap();

        assert_eq!(drain(resolved.reader).await, b"BYTECODE");
    }

    #[tokio::test]
    async fn test_compile_error_names_entry() {
        let mut compiler = MockCompiler::new();
        compiler
            .expect_compile()
            .returning(|_, _, _| Err(CompileError::Failed("syntax error".to_string())));

        let result = resolver(compiler)
            .resolve(Entry::buffer(snap(), StorageKind::Code, "("))
            .await;

        match result {
            Err(PackError::CompileFailure { snapshot, .. }) => {
                assert_eq!(snapshot, "/snapshot/app/index.js")
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected compile failure"),
        }
    }

    #[tokio::test]
    async fn test_code_file_is_malformed() {
        let mut compiler = MockCompiler::new();
        compiler.expect_compile().times(0);

        // The path does not exist; rejection must happen before any read
        let result = resolver(compiler)
            .resolve(Entry::file(snap(), StorageKind::Code, "/nonexistent/index.js"))
            .await;

        assert!(matches!(result, Err(PackError::MalformedEntry { .. })));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = resolver(MockCompiler::new())
            .resolve(Entry::file(
                snap(),
                StorageKind::Content,
                "/nonexistent/data.bin",
            ))
            .await;

        match result {
            Err(err) => assert!(err.is_io()),
            Ok(_) => panic!("expected I/O failure"),
        }
    }
}
