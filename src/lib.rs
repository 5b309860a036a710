pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod postprocessing;
pub mod preprocessing;
pub mod server;
pub mod storage;

// Re-export common types
pub use error::InferenceError;
