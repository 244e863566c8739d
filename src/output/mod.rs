//! Output formatting module
//!
//! Renders run results and canonical trees for the terminal or a file.

mod formatter;

pub use formatter::{format_tree, write_result_to_file, OutputFormat, ResultFormatter};
