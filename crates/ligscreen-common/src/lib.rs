//! ligscreen-common: shared error type, CSV table, subprocess and statistics
//! helpers used across all ligscreen crates.

pub mod error;
pub mod process;
pub mod stats;
pub mod table;

// Re-export commonly used types
pub use error::{LigscreenError, Result};
pub use process::{run_tool, ToolOutput};
pub use table::{format_float, format_opt_float, normalize_key, CsvTable};
