use bytes::Bytes;
use serde::Serialize;
use std::io::Cursor;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Type alias for a segment's byte source
pub type SegmentReader = Pin<Box<dyn AsyncRead + Send>>;

/// Position of a segment in the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    Stub,
    StubPadding,
    OptionsBox,
    OptionsPadding,
    PayloadHeader,
    /// Payload entry by stripe position
    Entry(usize),
    PayloadPadding,
    PreludeBox,
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKind::Stub => write!(f, "stub"),
            SegmentKind::StubPadding => write!(f, "stub-padding"),
            SegmentKind::OptionsBox => write!(f, "options-box"),
            SegmentKind::OptionsPadding => write!(f, "options-padding"),
            SegmentKind::PayloadHeader => write!(f, "payload-header"),
            SegmentKind::Entry(index) => write!(f, "entry-{}", index),
            SegmentKind::PayloadPadding => write!(f, "payload-padding"),
            SegmentKind::PreludeBox => write!(f, "prelude-box"),
        }
    }
}

/// One segment handed to the sink: its kind and a byte source whose
/// length is only known once drained
pub struct Segment {
    kind: SegmentKind,
    origin: Option<String>,
    reader: SegmentReader,
}

impl Segment {
    pub fn from_reader(kind: SegmentKind, reader: SegmentReader) -> Self {
        Self {
            kind,
            origin: None,
            reader,
        }
    }

    /// Name the source the bytes come from, used in read errors
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn from_bytes(kind: SegmentKind, bytes: impl Into<Bytes>) -> Self {
        Self::from_reader(kind, Box::pin(Cursor::new(bytes.into())))
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Source description, falling back to the segment kind
    pub fn origin(&self) -> String {
        self.origin
            .clone()
            .unwrap_or_else(|| self.kind.to_string())
    }

    pub fn into_reader(self) -> SegmentReader {
        self.reader
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_defaults_to_kind() {
        let segment = Segment::from_bytes(SegmentKind::OptionsPadding, vec![0u8; 4]);
        assert_eq!(segment.origin(), "options-padding");

        let segment = Segment::from_bytes(SegmentKind::Entry(3), "abc").with_origin("/a (content)");
        assert_eq!(segment.origin(), "/a (content)");
        assert_eq!(segment.kind().to_string(), "entry-3");
    }
}
