use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use crate::application::assembler::{EntryResolver, Segment, SegmentKind, Sequencer};
use crate::application::errors::PackError;
use crate::application::ports::{Compiler, OutputSink};
use crate::domain::entities::{Backpack, Target, VirtualFilesystem};

/// Bytes moved from a segment to the sink per read. 256KB balances
/// throughput and memory for sequential copies.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 256 * 1024;

/// Inputs of one assembly run
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub backpack: Backpack,
    pub options: Vec<String>,
    pub target: Target,
}

/// Absolute placement of one segment in the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentRecord {
    pub kind: SegmentKind,
    pub offset: u64,
    pub length: u64,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub total_bytes: u64,
    /// SHA-256 of the whole artifact, hex encoded
    pub sha256: String,
    pub segments: Vec<SegmentRecord>,
    pub vfs: VirtualFilesystem,
}

impl AssemblyReport {
    pub fn segment(&self, kind: SegmentKind) -> Option<&SegmentRecord> {
        self.segments.iter().find(|record| record.kind == kind)
    }
}

/// Use case: assemble stub, options, payload and prelude into one artifact
pub struct AssembleExecutableUseCase {
    compiler: Arc<dyn Compiler>,
    copy_buffer_size: usize,
}

impl AssembleExecutableUseCase {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self {
            compiler,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
        }
    }

    pub fn with_copy_buffer_size(mut self, copy_buffer_size: usize) -> Self {
        self.copy_buffer_size = copy_buffer_size;
        self
    }

    /// Execute the assembly workflow.
    ///
    /// The sink is closed only when every segment was written. On failure
    /// it is left as is; whatever reached the destination stays there.
    pub async fn execute(
        &self,
        request: AssemblyRequest,
        sink: &mut dyn OutputSink,
    ) -> Result<AssemblyReport, PackError> {
        // 1. Preflight: the copy buffer must exist and the options must
        // frame cleanly before any byte moves
        let mut buffer = allocate_copy_buffer(self.copy_buffer_size)?;

        let AssemblyRequest {
            backpack,
            options,
            target,
        } = request;
        validate_options(&options)?;

        if !backpack.has_placeholder() {
            warn!("Prelude template has no %VIRTUAL_FILESYSTEM% placeholder; index is not embedded");
        }

        info!(
            stub = ?target.stub_path,
            output = ?target.output_path,
            entries = backpack.stripe.len(),
            options = options.len(),
            "Starting assembly"
        );

        let resolver = EntryResolver::new(Arc::clone(&self.compiler), options, target);
        let mut sequencer = Sequencer::new(backpack, resolver);

        // 2. Pull segments one at a time, draining each before the next
        let mut hasher = Sha256::new();
        let mut segments = Vec::new();
        let mut offset = 0u64;

        loop {
            let segment = match sequencer.next_segment().await {
                Ok(Some(segment)) => segment,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, offset, "Assembly failed");
                    return Err(e);
                }
            };

            let kind = segment.kind();
            let length = match drain_segment(segment, sink, &mut buffer, &mut hasher).await {
                Ok(length) => length,
                Err(e) => {
                    sequencer.fail();
                    error!(
                        error = %e,
                        segment = %kind,
                        offset,
                        remaining_entries = sequencer.remaining_entries(),
                        "Failed to drain segment"
                    );
                    return Err(e);
                }
            };

            sequencer.complete_segment(length)?;
            segments.push(SegmentRecord {
                kind,
                offset,
                length,
            });
            offset += length;
        }

        // 3. Only a fully written artifact gets closed
        sink.close().await?;

        let sha256 = hex::encode(hasher.finalize());
        info!(total_bytes = offset, sha256 = %sha256, "Assembly complete");

        Ok(AssemblyReport {
            total_bytes: offset,
            sha256,
            segments,
            vfs: sequencer.into_vfs(),
        })
    }
}

fn allocate_copy_buffer(size: usize) -> Result<Vec<u8>, PackError> {
    if size == 0 {
        return Err(PackError::EnvironmentUnsupported(
            "copy buffer size must be non-zero".to_string(),
        ));
    }

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(size).map_err(|e| {
        PackError::EnvironmentUnsupported(format!(
            "cannot allocate a {} byte copy buffer: {}",
            size, e
        ))
    })?;
    buffer.resize(size, 0);
    Ok(buffer)
}

/// Reject options the options box cannot carry
fn validate_options(options: &[String]) -> Result<(), PackError> {
    match options.iter().position(|option| option.contains('\0')) {
        Some(index) => Err(PackError::InvalidOption {
            index,
            reason: format!("{:?} contains a NUL byte", options[index]),
        }),
        None => Ok(()),
    }
}

/// Stream a segment into the sink, returning the number of bytes moved
async fn drain_segment(
    segment: Segment,
    sink: &mut dyn OutputSink,
    buffer: &mut [u8],
    hasher: &mut Sha256,
) -> Result<u64, PackError> {
    let kind = segment.kind();
    let origin = segment.origin();
    let mut reader = segment.into_reader();
    let mut total_bytes = 0u64;

    loop {
        let n = reader
            .read(buffer)
            .await
            .map_err(|source| PackError::Read {
                segment: kind,
                origin: origin.clone(),
                source,
            })?;
        if n == 0 {
            break;
        }

        hasher.update(&buffer[..n]);
        sink.write(&buffer[..n]).await?;
        total_bytes += n as u64;
    }

    Ok(total_bytes)
}
