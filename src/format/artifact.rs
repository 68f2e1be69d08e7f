// SPDX-License-Identifier: MIT
//! Read side of the artifact format, locating boxes the way the runtime
//! loader does: by scanning boundary-aligned offsets for sentinels.

use serde::Serialize;

use crate::domain::entities::Extent;
use crate::format::boxes::{decode_options_body, BoxHeader, BoxKind, BOX_HEADER_SIZE};
use crate::format::padding::{align_up, BOUNDARY};
use crate::format::ReadError;

/// Absolute offsets of the boxes inside an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactLayout {
    pub options_offset: u64,
    pub options_length: u32,
    pub payload_offset: u64,
    pub prelude_offset: u64,
    pub prelude_length: u32,
    pub total_size: u64,
}

impl ArtifactLayout {
    /// First byte of entry data
    pub fn payload_start(&self) -> u64 {
        self.payload_offset + BOX_HEADER_SIZE as u64
    }
}

/// Zero-copy reader over a complete artifact
pub struct ArtifactReader<'a> {
    data: &'a [u8],
    layout: ArtifactLayout,
}

fn header_at(data: &[u8], offset: u64) -> Option<BoxHeader> {
    let start = usize::try_from(offset).ok()?;
    let bytes = data.get(start..start.checked_add(BOX_HEADER_SIZE)?)?;
    BoxHeader::from_bytes(bytes).ok()
}

fn aligned_offsets(from: u64, len: u64) -> impl Iterator<Item = u64> {
    (align_up(from)..len).step_by(BOUNDARY as usize)
}

impl<'a> ArtifactReader<'a> {
    pub fn from_slice(data: &'a [u8]) -> Result<Self, ReadError> {
        let total_size = data.len() as u64;

        let (options_offset, options_header) = aligned_offsets(0, total_size)
            .filter_map(|offset| header_at(data, offset).map(|h| (offset, h)))
            .find(|(offset, header)| {
                header.kind() == Some(BoxKind::Options)
                    && offset + BOX_HEADER_SIZE as u64 + header.length as u64 <= total_size
            })
            .ok_or(ReadError::BoxNotFound(BoxKind::Options))?;

        let payload_offset =
            align_up(options_offset + BOX_HEADER_SIZE as u64 + options_header.length as u64);
        match header_at(data, payload_offset) {
            Some(header) if header.kind() == Some(BoxKind::PayloadHeader) => {}
            _ => return Err(ReadError::BoxNotFound(BoxKind::PayloadHeader)),
        }

        let (prelude_offset, prelude_header) =
            aligned_offsets(payload_offset + BOX_HEADER_SIZE as u64, total_size)
                .filter_map(|offset| header_at(data, offset).map(|h| (offset, h)))
                .find(|(offset, header)| {
                    header.kind() == Some(BoxKind::Prelude)
                        && offset + BOX_HEADER_SIZE as u64 + header.length as u64 == total_size
                })
                .ok_or(ReadError::BoxNotFound(BoxKind::Prelude))?;

        Ok(Self {
            data,
            layout: ArtifactLayout {
                options_offset,
                options_length: options_header.length,
                payload_offset,
                prelude_offset,
                prelude_length: prelude_header.length,
                total_size,
            },
        })
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Stub bytes including the padding that follows them
    pub fn stub_region(&self) -> &'a [u8] {
        &self.data[..self.layout.options_offset as usize]
    }

    pub fn options(&self) -> Result<Vec<String>, ReadError> {
        let start = self.layout.options_offset as usize + BOX_HEADER_SIZE;
        let end = start + self.layout.options_length as usize;
        decode_options_body(&self.data[start..end])
    }

    /// Payload region after the header box, including trailing padding
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.layout.payload_start() as usize..self.layout.prelude_offset as usize]
    }

    /// Bytes of one entry, as recorded in the virtual filesystem index
    pub fn payload_slice(&self, extent: Extent) -> Result<&'a [u8], ReadError> {
        let payload = self.payload();
        let start = extent.offset as usize;
        let end = extent.end() as usize;
        payload.get(start..end).ok_or(ReadError::Truncated {
            needed: end,
            available: payload.len(),
        })
    }

    /// Prelude body: the wrapped template with the index substituted
    pub fn prelude(&self) -> Result<&'a str, ReadError> {
        let start = self.layout.prelude_offset as usize + BOX_HEADER_SIZE;
        std::str::from_utf8(&self.data[start..])
            .map_err(|e| ReadError::InvalidUtf8(e.to_string()))
    }
}
