// SPDX-License-Identifier: MIT
//! Prelude box: the bootstrap template wrapped in a callable boundary,
//! with the virtual filesystem index substituted in.

use crate::domain::entities::VirtualFilesystem;
use crate::format::boxes::{encode_box, BoxKind};
use crate::format::EncodeError;

/// Placeholder token the template carries for the index
pub const VFS_PLACEHOLDER: &str = "%VIRTUAL_FILESYSTEM%";

/// Opens the function boundary the runtime invokes with its well-known arguments
pub const PRELUDE_PREFIX: &str =
    "(function(process, require, console, EXECPATH_FD, PAYLOAD_POSITION, PAYLOAD_SIZE) { ";

/// Closes the boundary. The leading newline keeps a trailing line comment
/// in the template from swallowing the closing brace.
pub const PRELUDE_SUFFIX: &str = "\n})";

/// Substitute the index into every placeholder of `template` and wrap the
/// result. A template without the placeholder is wrapped unchanged.
pub fn render_prelude(template: &str, vfs_json: &str) -> String {
    let substituted = template.replace(VFS_PLACEHOLDER, vfs_json);
    let mut rendered =
        String::with_capacity(PRELUDE_PREFIX.len() + substituted.len() + PRELUDE_SUFFIX.len());
    rendered.push_str(PRELUDE_PREFIX);
    rendered.push_str(&substituted);
    rendered.push_str(PRELUDE_SUFFIX);
    rendered
}

/// Encode the prelude box for `template` carrying `vfs`
pub fn encode_prelude_box(
    template: &str,
    vfs: &VirtualFilesystem,
) -> Result<Vec<u8>, EncodeError> {
    let vfs_json = vfs.to_json()?;
    let rendered = render_prelude(template, &vfs_json);
    encode_box(BoxKind::Prelude, rendered.as_bytes())
}
