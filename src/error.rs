//! Error types for deckhand.
//!
//! This module defines all error types used throughout deckhand, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors derive from [`DeckError`]
//! - Every variant names the offending path or record id
//! - Nothing is retried; every error aborts the current command
//! - Errors are automatically converted to `miette::Result` for CLI output
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use deckhand::error::{DeckError, Result};
//!
//! fn check_root(path: &Path) -> Result<()> {
//!     if path.file_name().is_none() {
//!         return Err(DeckError::Config {
//!             message: format!("'{}' has no final component", path.display()),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::record::RecordId;

/// Error types that can occur in deckhand operations
#[derive(Error, Debug, Diagnostic)]
pub enum DeckError {
    /// File system I/O error.
    ///
    /// Common causes: permission denied, file vanished between walk and hash,
    /// a stream that broke mid-read, or a failed link replacement.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(deckhand::io_error))]
    Io {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed while scanning the content tree.
    #[error("Failed to walk directory tree at '{path}'")]
    #[diagnostic(
        code(deckhand::scan::walk_error),
        help("Check that every directory under the scan root is readable.")
    )]
    Walk {
        /// The entry the walker could not read
        path: PathBuf,
        /// The underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// Attempted to hash something that is not a regular file.
    #[error("Invalid file type for '{path}': {message}")]
    #[diagnostic(code(deckhand::file::invalid_type))]
    InvalidFileType {
        /// The path of the invalid file
        path: PathBuf,
        /// Description of the file type issue
        message: String,
    },

    /// A record carries a content hash that is not a SHA-256 hex digest.
    #[error("Invalid content hash for '{path}': {message}")]
    #[diagnostic(
        code(deckhand::store::invalid_hash),
        help("The store may be corrupted. Run 'deckhand clear' and scan again.")
    )]
    Hash {
        /// The file the record describes
        path: PathBuf,
        /// What is wrong with the digest
        message: String,
    },

    /// A record id did not resolve to a stored record.
    #[error("No record with id {id} in the store")]
    #[diagnostic(
        code(deckhand::store::record_not_found),
        help("Run 'deckhand scan' and 'deckhand resolve' before linking.")
    )]
    RecordNotFound {
        /// The id that was looked up
        id: RecordId,
    },

    /// Failed to serialize the store snapshot.
    #[error("Failed to serialize store")]
    #[diagnostic(
        code(deckhand::store::serialization_error),
        help("Run 'deckhand clear' to reset the store.")
    )]
    Serialization(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failed to deserialize the store snapshot.
    #[error("Failed to deserialize store at '{path}'")]
    #[diagnostic(
        code(deckhand::store::deserialization_error),
        help("The store file may be corrupted. Run 'deckhand clear' to reset it.")
    )]
    Deserialization {
        /// The store file
        path: PathBuf,
        /// The underlying rkyv error
        #[source]
        source: rkyv::rancor::BoxedError,
    },

    /// Failed to create the parent directory of the store file.
    #[error("Failed to create store directory '{path}'")]
    #[diagnostic(
        code(deckhand::store::create_dir_error),
        help("Ensure you have write permissions for the parent directory.")
    )]
    CreateStoreDir {
        /// The directory path that couldn't be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file no longer holds the content recorded for it.
    ///
    /// Raised by the link phase before anything is deleted, when a duplicate
    /// was edited or its canonical copy was edited or removed after the scan.
    #[error("Content of '{path}' changed since it was scanned: {message}")]
    #[diagnostic(
        code(deckhand::link::content_changed),
        help("Run 'deckhand run' (or scan and resolve again) before linking.")
    )]
    ContentChanged {
        /// The file whose content no longer matches its record
        path: PathBuf,
        /// What was found instead
        message: String,
    },

    /// The scan root's marker could not be located in a path.
    ///
    /// Raised when a record path does not sit under the configured root at
    /// the configured depth, usually because the store was built from a
    /// different root than the one being linked.
    #[error("Root marker mismatch for '{path}': {message}")]
    #[diagnostic(
        code(deckhand::path::root_marker),
        help("Link with the same --root that was used to scan.")
    )]
    RootMarker {
        /// The path that failed to resolve
        path: PathBuf,
        /// Why the marker did not match
        message: String,
    },

    /// Canonical assignments in the store are inconsistent.
    #[error("Canonical invariant violated at record {id}: {message}")]
    #[diagnostic(
        code(deckhand::resolve::invariant),
        help("Run 'deckhand resolve' to recompute canonical assignments.")
    )]
    Invariant {
        /// The record where the violation was found
        id: RecordId,
        /// Description of the violation
        message: String,
    },

    /// Invalid configuration or store version.
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(deckhand::config::error),
        help("Check the required configuration parameters.")
    )]
    Config {
        /// Description of the configuration error
        message: String,
    },
}

impl DeckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DeckError>;
