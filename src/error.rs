//! Error types for batch SQL execution

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The operation \"{0}\" is not supported!")]
    UnsupportedOperation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Executor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
