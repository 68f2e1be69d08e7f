//! # Stub Packer - Executable Segment Assembler
//!
//! Produces a single self-contained executable by appending embedded data
//! to a runtime stub, each part aligned to a 4096-byte boundary and framed
//! by a sentinel box the runtime scans for at startup.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Entries, stripes, the virtual filesystem index
//! - **Format**: Box framing, padding, prelude rendering and the artifact reader
//! - **Application**: Segment sequencing, entry resolution and the assembly use case
//! - **Infrastructure**: Output sinks, compilers and manifest loading
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use stub_packer::{
//!     entities::{Backpack, Entry, Stripe, Target},
//!     infrastructure::{compiler::PassthroughCompiler, sink::FileSink},
//!     use_cases::{AssembleExecutableUseCase, AssemblyRequest},
//!     value_objects::{SnapshotId, StorageKind},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stripe = Stripe::from(vec![Entry::file(
//!     SnapshotId::new("/snapshot/app/data.bin")?,
//!     StorageKind::Content,
//!     "data.bin",
//! )]);
//! let request = AssemblyRequest {
//!     backpack: Backpack::new("boot(%VIRTUAL_FILESYSTEM%)", stripe),
//!     options: vec![],
//!     target: Target::new("node", "app"),
//! };
//!
//! let mut sink = FileSink::create("app").await?;
//! let report = AssembleExecutableUseCase::new(Arc::new(PassthroughCompiler))
//!     .execute(request, &mut sink)
//!     .await?;
//! println!("{} bytes, sha256 {}", report.total_bytes, report.sha256);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod format;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use application::errors::PackError;
pub use application::{assembler, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
