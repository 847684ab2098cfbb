//! Error type shared by the dictionary, storage and configuration layers.
//!
//! The typing path never surfaces these: lookups degrade to empty results and
//! background persistence only logs. Errors are returned from explicit load,
//! build and configuration calls.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("fst error: {0}")]
    Fst(#[from] fst::Error),

    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid dictionary: {0}")]
    InvalidDictionary(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

macro_rules! storage_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Error {
            fn from(e: $ty) -> Self {
                Error::Storage(e.into())
            }
        })*
    };
}

// redb reports each transaction phase with its own error type.
storage_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

pub type Result<T> = std::result::Result<T, Error>;
