//! Workspace error type.
//!
//! Only `Config` is fatal, and only at startup. `Storage` aborts the current
//! operation, `Transport` aborts the current recipient, `Enrichment` degrades
//! to a text-only send — none of them take the process down.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoosterError {
    /// Subscriber directory operation failed (connectivity, schema, lock).
    #[error("storage error: {0}")]
    Storage(String),

    /// A send to one recipient failed (blocked, bad chat id, network fault).
    #[error("transport error: {0}")]
    Transport(String),

    /// Image search failed or returned nothing usable.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Missing or invalid startup configuration. Fatal at boot.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RoosterError>;
