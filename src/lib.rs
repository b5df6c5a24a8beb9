//! Batched SQL execution for workflow items.
//!
//! # Intention
//!
//! - Run raw queries, inserts, updates and deletes for a list of workflow items.
//! - Group items per table and key, split groups into bounded chunks, and submit
//!   the generated statements concurrently over one connection.
//!
//! # Architectural Boundaries
//!
//! - Drivers, pooling and transport sit behind [`executor::Connector`] and
//!   [`executor::Connection`]; a bundled SQLite backend lives in [`sqlite`].
//! - No workflow host logic or UI metadata.

pub mod batch;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod literal;
pub mod node;
pub mod params;
pub mod sqlite;
pub mod statement;
pub mod value;

pub use config::{ClientLibrary, ConnectionConfig};
pub use error::{Error, Result};
pub use executor::{Connection, Connector, ExecutionOutcome, RowsAffected};
pub use node::{ExecutionItem, NodeOutput, SqlNode};
pub use params::{Operation, ParameterSource, StaticParameters};
pub use sqlite::SqliteConnector;
pub use statement::{SqlMode, Statement};
pub use value::{Record, Value};
