pub mod config;
pub mod error;
pub mod sink;
pub mod types;

pub use config::Config;
pub use error::{HoodrankError, Result};
pub use sink::{read_json, write_csv, write_json, write_rows, OutputFormat};
pub use types::*;
