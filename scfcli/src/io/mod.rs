//! Reading configuration documents, writing results and logging setup.

mod input;
mod output;

pub use input::{load_document, parse_document, parse_key_value, read_source, substitute, InputFormat};
pub use output::{render, setup_logging, OutputFormat};
