pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod probe;
pub mod stream;

pub use error::{Error, Result};
