//! # zimrecreate
//!
//! Rebuilds a ZIM archive from an existing one, typically to switch its
//! cluster compression (xz or Zstandard), refresh its structural metadata,
//! or regroup its content.
//!
//! The crate is organized around the recreation pipeline in [`recreate`]:
//! entries are read through the [`source`] traits, ordered by the cluster
//! they were stored in, adapted to the [`write::WriterEntry`] contract, and
//! handed to an [`write::ArchiveBuilder`]. [`read::Archive`] and
//! [`write::Creator`] are the ZIM engines the pipeline uses by default.
//!
//! ## Quick Start
//!
//! ### Recreating an Archive
//!
//! ```rust,no_run
//! use zimrecreate::progress::NoProgress;
//! use zimrecreate::{Compression, RecreateOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let options = RecreateOptions::new().compression(Compression::Zstd);
//!     let result = zimrecreate::recreate("old.zim", "new.zim", &options, NoProgress)?;
//!     println!(
//!         "Copied {} entries into {} clusters",
//!         result.entries_submitted, result.summary.clusters_written
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Reading an Archive
//!
//! ```rust,no_run
//! use zimrecreate::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path("wikipedia.zim")?;
//!     if let Some(entry) = archive.find('A', "Main_Page")? {
//!         println!("{}: {} bytes", entry.title(), entry.size()?);
//!     }
//!     archive.verify_checksum()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | Yes | The `zimrecreate` command-line tool |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error::is_source_error`] tells a bad
//! input archive apart from a failure while writing the new one.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod checksum;
pub mod codec;
pub mod error;
pub mod format;
pub mod progress;
pub mod read;
pub mod recreate;
pub mod source;
pub mod write;

pub use codec::Compression;
pub use error::{Error, Result};
pub use read::{Archive, Entry};
pub use recreate::{RecreateOptions, RecreateResult, Recreator, recreate};
pub use source::{SourceArchive, SourceEntry};
pub use write::{ArchiveBuilder, CreateResult, Creator, CreatorOptions, EntryUrl, WriterEntry};

pub use progress::{NoProgress, Phase, ProgressReporter};
