pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod summary;
pub mod transform;
pub mod units;

pub use error::{Result, ToolError};
