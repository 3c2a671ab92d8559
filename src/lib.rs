// recordstore - pluggable record storage
// List, ordered-map and fixed-slot backends behind one contract, with an LRU overlay

#![warn(rust_2018_idioms)]

pub mod backend;
pub mod config;
pub mod shell;
pub mod storage;

// Re-exports for convenience
pub use backend::{Backend, BackendKind};
pub use config::StoreConfig;
pub use storage::{Outcome, Record, RecordId, RecordStore, Template, PAGE_SIZE};

/// Record store error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Id {id} is out of range (capacity {capacity})")]
        OutOfRange { id: u64, capacity: u64 },

        #[error("Serialization error: {0}")]
        Serialization(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Backend unavailable: {0}")]
        Unavailable(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }

    impl From<::config::ConfigError> for Error {
        fn from(err: ::config::ConfigError) -> Self {
            Error::Config(err.to_string())
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
