use tokio::fs::File;
use tokio::io::BufReader;
use tracing::{debug, info};

use crate::application::assembler::{AssemblyState, EntryResolver, Segment, SegmentKind};
use crate::application::errors::PackError;
use crate::domain::entities::{Backpack, EntryKey, Stripe, VirtualFilesystem};
use crate::format::{encode_options_box, encode_payload_header_box, encode_prelude_box, padding};

/// Buffer size for reading the stub binary
const STUB_BUFFER_SIZE: usize = 256 * 1024;

/// Sequencer phases, in artifact order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stub,
    StubPadding,
    OptionsBox,
    OptionsPadding,
    PayloadHeader,
    /// One segment per stripe entry, then the payload padding
    Entries,
    PreludeBox,
    Done,
    Failed,
}

/// Pull-based state machine producing the artifact's segments in order.
///
/// At most one segment is in flight: after [`Sequencer::next_segment`] the
/// caller drains the segment and reports its length through
/// [`Sequencer::complete_segment`] before asking for the next one. Paddings
/// and index offsets are derived from those reported lengths.
pub struct Sequencer {
    phase: Phase,
    in_flight: Option<SegmentKind>,
    last_length: u64,
    entries_started: usize,
    recent: Option<EntryKey>,
    stripe: Stripe,
    template: String,
    resolver: EntryResolver,
    state: AssemblyState,
}

impl Sequencer {
    pub fn new(backpack: Backpack, resolver: EntryResolver) -> Self {
        let state = AssemblyState::seeded(&backpack.stripe);
        Self {
            phase: Phase::Stub,
            in_flight: None,
            last_length: 0,
            entries_started: 0,
            recent: None,
            stripe: backpack.stripe,
            template: backpack.prelude,
            resolver,
            state,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Entries not yet taken from the stripe
    pub fn remaining_entries(&self) -> usize {
        self.stripe.len()
    }

    pub fn vfs(&self) -> &VirtualFilesystem {
        self.state.vfs()
    }

    pub fn into_vfs(self) -> VirtualFilesystem {
        self.state.into_vfs()
    }

    /// Produce the next segment, or `None` once the prelude box is out
    pub async fn next_segment(&mut self) -> Result<Option<Segment>, PackError> {
        if let Some(kind) = self.in_flight {
            return Err(PackError::SequenceViolation(format!(
                "next segment requested while {} is still in flight",
                kind
            )));
        }

        match self.produce().await {
            Ok(segment) => {
                self.in_flight = segment.as_ref().map(Segment::kind);
                Ok(segment)
            }
            Err(PackError::Aborted) => Err(PackError::Aborted),
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    /// Report that the in-flight segment was fully drained
    pub fn complete_segment(&mut self, length: u64) -> Result<(), PackError> {
        match self.in_flight.take() {
            Some(kind) => {
                debug!(segment = %kind, length, "Segment complete");
                self.last_length = length;
                Ok(())
            }
            None => Err(PackError::SequenceViolation(
                "completion reported with no segment in flight".to_string(),
            )),
        }
    }

    /// Abort the run, e.g. after the sink failed to take a segment
    pub fn fail(&mut self) {
        self.in_flight = None;
        self.phase = Phase::Failed;
    }

    async fn produce(&mut self) -> Result<Option<Segment>, PackError> {
        match self.phase {
            Phase::Stub => {
                let path = self.resolver.target().stub_path.clone();
                info!(stub = ?path, "Reading stub binary");
                let origin = path.display().to_string();
                let file = File::open(&path)
                    .await
                    .map_err(|source| PackError::File { path, source })?;
                self.phase = Phase::StubPadding;
                Ok(Some(
                    Segment::from_reader(
                        SegmentKind::Stub,
                        Box::pin(BufReader::with_capacity(STUB_BUFFER_SIZE, file)),
                    )
                    .with_origin(origin),
                ))
            }
            Phase::StubPadding => {
                self.phase = Phase::OptionsBox;
                Ok(Some(Segment::from_bytes(
                    SegmentKind::StubPadding,
                    padding(self.last_length),
                )))
            }
            Phase::OptionsBox => {
                self.phase = Phase::OptionsPadding;
                Ok(Some(Segment::from_bytes(
                    SegmentKind::OptionsBox,
                    encode_options_box(self.resolver.options())?,
                )))
            }
            Phase::OptionsPadding => {
                self.phase = Phase::PayloadHeader;
                Ok(Some(Segment::from_bytes(
                    SegmentKind::OptionsPadding,
                    padding(self.last_length),
                )))
            }
            Phase::PayloadHeader => {
                self.phase = Phase::Entries;
                Ok(Some(Segment::from_bytes(
                    SegmentKind::PayloadHeader,
                    encode_payload_header_box(),
                )))
            }
            Phase::Entries => self.next_entry().await.map(Some),
            Phase::PreludeBox => {
                let prelude = encode_prelude_box(&self.template, self.state.vfs())?;
                info!(
                    snapshots = self.state.vfs().snapshot_count(),
                    size = prelude.len(),
                    "Encoding prelude box"
                );
                self.phase = Phase::Done;
                Ok(Some(Segment::from_bytes(SegmentKind::PreludeBox, prelude)))
            }
            Phase::Done => Ok(None),
            Phase::Failed => Err(PackError::Aborted),
        }
    }

    async fn next_entry(&mut self) -> Result<Segment, PackError> {
        // The last reported length belongs to the payload header on the
        // first call, and to the previous entry afterwards
        if let Some(key) = self.recent.take() {
            self.state.record(&key, self.last_length);
        }
        self.state.add_payload_bytes(self.last_length);

        let Some(entry) = self.stripe.take_next() else {
            debug!(
                payload_length = self.state.payload_length(),
                "Stripe drained"
            );
            self.phase = Phase::PreludeBox;
            return Ok(Segment::from_bytes(
                SegmentKind::PayloadPadding,
                padding(self.state.payload_length()),
            ));
        };

        let index = self.entries_started;
        self.entries_started += 1;

        let resolved = self.resolver.resolve(entry).await?;
        debug!(entry = %resolved.key, index, offset = self.state.payload_position(), "Entry resolved");
        self.recent = Some(resolved.key);
        Ok(
            Segment::from_reader(SegmentKind::Entry(index), resolved.reader)
                .with_origin(resolved.origin),
        )
    }
}
