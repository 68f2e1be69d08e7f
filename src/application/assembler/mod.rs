//! Segment assembly: resolving entries, indexing them, and ordering every
//! segment of the artifact.

mod resolver;
mod segment;
mod sequencer;
mod state;

pub use resolver::{EntryResolver, ResolvedEntry};
pub use segment::{Segment, SegmentKind, SegmentReader};
pub use sequencer::{Phase, Sequencer};
pub use state::AssemblyState;
