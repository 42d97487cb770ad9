//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// Export collaborator error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// ERP adapter error.
    #[error("ERP error: {0}")]
    Erp(#[from] ErpError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by export collaborators.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to serialize the record.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the output.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// The requested format is not supported by this exporter.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised by ERP adapters.
#[derive(Error, Debug)]
pub enum ErpError {
    /// The adapter was used before a successful connect.
    #[error("not connected to ERP system")]
    NotConnected,

    /// Connection configuration is incomplete.
    #[error("missing required ERP config field: {0}")]
    MissingConfig(String),

    /// The ERP endpoint refused the connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The ERP endpoint rejected the pushed record.
    #[error("push rejected: {0}")]
    Rejected(String),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
