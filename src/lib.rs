pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod export;
pub mod logging;

pub use error::{Error, ExportError, Result};
