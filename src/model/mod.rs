pub mod loader;
pub mod restorer;

pub use restorer::{OnnxRestorer, Restorer};
