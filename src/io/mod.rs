pub mod output;

pub use output::{JsonWriter, OutputFormat, OutputWriter, TerminalWriter};
