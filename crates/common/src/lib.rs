//! Common utilities and shared types for foodgram.
//!
//! This crate provides foundational components used across all foodgram crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`],
//!   with field-level validation detail in [`FieldErrors`]
//! - **Storage**: Image storage backends (local filesystem)
//!
//! # Example
//!
//! ```no_run
//! use foodgram_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult, FieldErrors};
pub use storage::{LocalStorage, StorageBackend, StoredFile, generate_storage_key};
