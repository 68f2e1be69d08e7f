// SPDX-License-Identifier: MIT
//! Sentinel boxes: a 16-byte header (three magic words and a body length,
//! all little-endian `u32`) followed by the body.

use crate::format::{EncodeError, ReadError};

/// Header size in bytes
pub const BOX_HEADER_SIZE: usize = 16;

/// The three box kinds of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxKind {
    /// Runtime option strings
    Options,

    /// Marks the start of the payload region
    PayloadHeader,

    /// Wrapped prelude source with the embedded index
    Prelude,
}

impl BoxKind {
    /// Get all box kinds in artifact order
    pub fn all() -> &'static [BoxKind] {
        &[BoxKind::Options, BoxKind::PayloadHeader, BoxKind::Prelude]
    }

    /// Magic words identifying the box kind
    pub const fn magic(&self) -> [u32; 3] {
        match self {
            BoxKind::Options => [0x4818_c4df, 0x7ac3_0670, 0x5655_8a76],
            BoxKind::PayloadHeader => [0x7514_8eba, 0x6fbd_a9b4, 0x2e20_c08d],
            BoxKind::Prelude => [0x26e0_c928, 0x41f3_2b66, 0x3ea1_3ccf],
        }
    }

    pub fn from_magic(magic: [u32; 3]) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.magic() == magic)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BoxKind::Options => "options",
            BoxKind::PayloadHeader => "payload-header",
            BoxKind::Prelude => "prelude",
        }
    }
}

impl std::fmt::Display for BoxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Box header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub magic: [u32; 3],

    /// Declared body length in bytes
    pub length: u32,
}

impl BoxHeader {
    pub fn new(kind: BoxKind, length: u32) -> Self {
        Self {
            magic: kind.magic(),
            length,
        }
    }

    /// Kind named by the magic words, if they match a known box
    pub fn kind(&self) -> Option<BoxKind> {
        BoxKind::from_magic(self.magic)
    }

    /// Parse a header from the first [`BOX_HEADER_SIZE`] bytes of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReadError> {
        if bytes.len() < BOX_HEADER_SIZE {
            return Err(ReadError::Truncated {
                needed: BOX_HEADER_SIZE,
                available: bytes.len(),
            });
        }

        Ok(Self {
            magic: [le_u32(bytes, 0), le_u32(bytes, 4), le_u32(bytes, 8)],
            length: le_u32(bytes, 12),
        })
    }

    pub fn to_bytes(&self) -> [u8; BOX_HEADER_SIZE] {
        let mut bytes = [0u8; BOX_HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.magic[0].to_le_bytes());
        bytes[4..8].copy_from_slice(&self.magic[1].to_le_bytes());
        bytes[8..12].copy_from_slice(&self.magic[2].to_le_bytes());
        bytes[12..16].copy_from_slice(&self.length.to_le_bytes());

        bytes
    }

    #[inline]
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.to_bytes());
    }
}

/// Declared length for a body of `length` bytes
pub fn body_length(kind: BoxKind, length: usize) -> Result<u32, EncodeError> {
    u32::try_from(length).map_err(|_| EncodeError::BodyTooLarge { kind, length })
}

/// Wrap `body` in a box of the given kind
pub fn encode_box(kind: BoxKind, body: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let length = body_length(kind, body.len())?;
    let mut buffer = Vec::with_capacity(BOX_HEADER_SIZE + body.len());
    BoxHeader::new(kind, length).write_to_buffer(&mut buffer);
    buffer.extend_from_slice(body);
    Ok(buffer)
}

/// Options box: every option followed by a NUL, then one more NUL.
///
/// Options must not contain NUL themselves; callers check this up front.
pub fn encode_options_box<S: AsRef<str>>(options: &[S]) -> Result<Vec<u8>, EncodeError> {
    let body_len = options.iter().map(|o| o.as_ref().len() + 1).sum::<usize>() + 1;
    let mut body = Vec::with_capacity(body_len);
    for option in options {
        body.extend_from_slice(option.as_ref().as_bytes());
        body.push(0);
    }
    body.push(0);

    encode_box(BoxKind::Options, &body)
}

/// Payload header box. The length field stays 0; loaders locate the
/// payload end through the prelude box rather than this field.
pub fn encode_payload_header_box() -> Vec<u8> {
    BoxHeader::new(BoxKind::PayloadHeader, 0).to_bytes().to_vec()
}

/// Split an options box body back into its strings
pub fn decode_options_body(body: &[u8]) -> Result<Vec<String>, ReadError> {
    let mut rest = body
        .strip_suffix(&[0])
        .ok_or_else(|| ReadError::Malformed("options body is not NUL-terminated".to_string()))?;

    let mut options = Vec::new();
    while !rest.is_empty() {
        let end = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            ReadError::Malformed("option string is not NUL-terminated".to_string())
        })?;
        let option = std::str::from_utf8(&rest[..end])
            .map_err(|e| ReadError::InvalidUtf8(e.to_string()))?;
        options.push(option.to_string());
        rest = &rest[end + 1..];
    }

    Ok(options)
}
