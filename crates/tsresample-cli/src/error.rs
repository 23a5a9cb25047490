use tsresample_core::{AggregateError, ParseTimeError};

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid --{flag} '{value}': {source}"))]
    InvalidFlag {
        flag: &'static str,
        value: String,
        source: AggregateError,
    },

    #[snafu(display("Invalid --log-level '{level}': {source}"))]
    InvalidLogLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[snafu(display("Input file not found or not accessible: {path}"))]
    InputMissing {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read CSV input {path}: {source}"))]
    ReadCsv {
        path: String,
        source: arrow::error::ArrowError,
    },

    #[snafu(display("Input {path} has no data rows"))]
    EmptyInput { path: String },

    #[snafu(display("Column '{column}' not found in {path} (available: {available})"))]
    MissingColumn {
        column: String,
        path: String,
        available: String,
    },

    #[snafu(display("Column '{column}' row {row}: '{value}' is not a number"))]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[snafu(display("Column '{column}' row {row}: {source}"))]
    InvalidTimestamp {
        column: String,
        row: usize,
        source: ParseTimeError,
    },

    #[snafu(display(
        "Intervals must be contiguous: row {row} ends at {end} but the next row starts at {next_start}"
    ))]
    NonContiguousIntervals {
        row: usize,
        end: String,
        next_start: String,
    },

    #[snafu(display("Aggregation failed: {source}"))]
    Aggregate { source: AggregateError },

    #[snafu(display("Failed to build output batch: {source}"))]
    BuildBatch { source: arrow::error::ArrowError },

    #[snafu(display("Failed to create output file: {path}"))]
    CreateOutput {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write CSV output {path}: {source}"))]
    WriteCsv {
        path: String,
        source: arrow::error::ArrowError,
    },

    #[snafu(display("Failed to write output: {source}"))]
    WriteStdout { source: std::io::Error },
}
