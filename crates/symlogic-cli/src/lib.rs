//! Conversion driver
//!
//! Glues the parser and the rewrite engine together: source text in,
//! rewritten expression out, rendered as text, JSON or a debug tree.

pub mod config;
pub mod driver;

pub use config::{DriverConfig, LoggingConfig, OutputFormat};
pub use driver::{convert, convert_tree, ConvertError, ConvertResult, Converter};
