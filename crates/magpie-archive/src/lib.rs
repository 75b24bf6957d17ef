//! Directory archiving for the magpie cache client.
//!
//! A cache entry on the wire is a single compressed tar stream of one build
//! subdirectory. This crate provides the [`Archiver`] seam plus two
//! implementations: a subprocess pipeline driving `tar` with an external
//! streaming compressor (the production path), and an in-process tar+gzip
//! codec that needs no external tools.

pub mod archiver;
pub mod pipeline;
pub mod tarball;

// Re-export main types
pub use archiver::Archiver;
pub use pipeline::ZstdPipeline;
pub use tarball::GzipArchiver;

use magpie_core::error::MagpieError;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, MagpieError>;
