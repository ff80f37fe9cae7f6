pub mod cli;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod fleet;
pub mod logging;
pub mod parallel;
pub mod resolve;
pub mod stats;

pub use error::{Result, StarforgeError};
