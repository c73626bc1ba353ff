// Error type for the mapping layer
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown attribute '{attribute}' for {type_name}")]
    UnknownAttribute { type_name: String, attribute: String },
    #[error("Schema error for table '{table}': {reason}")]
    Schema { table: String, reason: String },
    #[error("Cannot resolve record type '{type_name}'")]
    ClassResolution { type_name: String },
    #[error("No association '{association}' on {type_name}")]
    AssociationNotFound { type_name: String, association: String },
    #[error("Persistence error for {type_name}: {reason}")]
    Persistence { type_name: String, reason: String },
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("Unknown record type '{type_name}'")]
    UnknownType { type_name: String },
    #[error("Record type '{type_name}' has not been finalized")]
    NotFinalized { type_name: String },
    #[error("Expected a {expected} record, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, Error>;
