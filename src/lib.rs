pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod readers;
pub mod storage;
pub mod utils;
pub mod writers;

pub use error::{PipelineError, Result};
