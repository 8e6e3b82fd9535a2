//! Output surfaces for navigation instructions

pub mod formatting;

pub use formatting::{
    format_fix, CsvFormatter, InstructionFormatter, JsonFormatter, OutputFormat, TextFormatter,
};
