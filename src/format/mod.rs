// SPDX-License-Identifier: MIT
//! Artifact container format
//!
//! ```text
//! [stub][pad -> 4096][options box][pad -> 4096]
//! [payload header box][entry bytes, back to back][pad -> 4096]
//! [prelude box]
//! ```
//!
//! Every box is a 16-byte little-endian header (three magic words plus the
//! body length) followed by its body.

pub mod artifact;
pub mod boxes;
pub mod padding;
pub mod prelude;

pub use artifact::{ArtifactLayout, ArtifactReader};
pub use boxes::{
    encode_options_box, encode_payload_header_box, BoxHeader, BoxKind, BOX_HEADER_SIZE,
};
pub use padding::{align_up, padding, padding_len, BOUNDARY};
pub use prelude::{encode_prelude_box, render_prelude, VFS_PLACEHOLDER};

/// Errors that can occur while encoding a box
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{kind} box body of {length} bytes does not fit the 32-bit length field")]
    BodyTooLarge { kind: BoxKind, length: usize },

    #[error("Failed to serialize the virtual filesystem: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while reading an artifact
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} box not found")]
    BoxNotFound(BoxKind),

    #[error("Truncated data: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("Malformed box: {0}")]
    Malformed(String),
}
