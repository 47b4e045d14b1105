//! Input data loading (corpus lines from a file).
//!
//! This module defines the trait ([`DataLoader`]), models ([`DataItem`],
//! [`Data`]), and error ([`DataError`]); implementations (e.g. [`PathLoader`])
//! live in the `impls` submodule.

mod error;
mod impls;
mod types;

pub use error::DataError;
pub use impls::{load_from_path, PathLoader};
pub use types::{Data, DataItem};

/// Trait for loading input data.
pub trait DataLoader {
    /// Loads data.
    ///
    /// # Errors
    ///
    /// Any [`DataError`]: I/O failure, empty file, or an empty line.
    fn load(&self) -> Result<Data, DataError>;
}
