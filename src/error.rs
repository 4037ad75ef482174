//! Error types for streaming workbook emission

use thiserror::Error;

/// Result type alias for xlsxstream operations
pub type Result<T> = std::result::Result<T, XlsxError>;

/// Main error type for all streaming write operations
#[derive(Error, Debug)]
pub enum XlsxError {
    /// The output destination could not be created or truncated for writing
    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),

    /// `open` was called on a writer that already has a bound destination
    #[error("Writer is already open; a writer binds exactly one destination")]
    AlreadyOpen,

    /// A streaming operation was attempted before the writer was opened
    #[error("Writer has not been opened against a destination")]
    NotOpen,

    /// A cell was written with no worksheet stream open
    #[error("No active worksheet stream")]
    NoActiveWorksheet,

    /// Worksheet title rejected by the workbook registry
    #[error("Invalid worksheet title '{title}': {reason}")]
    InvalidWorksheetTitle { title: String, reason: String },

    /// Any operation attempted after `close()` completed
    #[error("Writer has been closed")]
    WriterClosed,

    /// The underlying sink failed while the archive was being sealed
    #[error("Failed to finalize archive: {0}")]
    ArchiveFinalizeFailure(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip error wrapper
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
