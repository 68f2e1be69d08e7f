mod backpack;
mod entry;
mod stripe;
mod target;
mod virtual_filesystem;

pub use backpack::Backpack;
pub use entry::{Entry, EntryKey, EntrySource};
pub use stripe::Stripe;
pub use target::Target;
pub use virtual_filesystem::{Extent, VirtualFilesystem};
