use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Utc};
use ndarray::{Array2, Axis};
use snafu::prelude::*;
use tabled::{
    builder::Builder,
    settings::{Style, object::Rows, style::LineText, width::MinWidth},
};

use crate::error::{
    BuildBatchSnafu, CliResult, CreateOutputSnafu, WriteCsvSnafu, WriteStdoutSnafu,
};

#[derive(Debug, Clone)]
pub struct OutputOpts {
    pub max_rows: usize,
    pub output: Option<PathBuf>,
}

/// One row per target window: its bounds plus one value per column.
#[derive(Debug, Clone)]
pub struct Resampled {
    pub columns: Vec<String>,
    pub starts: Vec<DateTime<Utc>>,
    pub ends: Vec<DateTime<Utc>>,
    pub values: Array2<f64>,
    /// Extra `key: value` lines printed after the row count.
    pub summary: Vec<(&'static str, String)>,
}

impl Resampled {
    pub fn new(
        columns: Vec<String>,
        starts: Vec<DateTime<Utc>>,
        ends: Vec<DateTime<Utc>>,
        values: Array2<f64>,
    ) -> Self {
        Self {
            columns,
            starts,
            ends,
            values,
            summary: Vec::new(),
        }
    }

    pub fn with_summary(mut self, key: &'static str, value: impl ToString) -> Self {
        self.summary.push((key, value.to_string()));
        self
    }

    pub fn total_rows(&self) -> usize {
        self.starts.len()
    }

    fn header(&self) -> Vec<String> {
        let mut header = vec!["start".to_string(), "end".to_string()];
        header.extend(self.columns.iter().cloned());
        header
    }

    fn preview_rows(&self, max_rows: usize) -> Vec<Vec<String>> {
        self.starts
            .iter()
            .zip(&self.ends)
            .zip(self.values.axis_iter(Axis(0)))
            .take(max_rows)
            .map(|((start, end), row)| {
                let mut cells = vec![format_instant(*start), format_instant(*end)];
                cells.extend(row.iter().map(|v| format_value(*v)));
                cells
            })
            .collect()
    }

    fn to_record_batch(&self) -> CliResult<RecordBatch> {
        let mut fields = vec![
            Field::new("start", DataType::Utf8, false),
            Field::new("end", DataType::Utf8, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.starts.iter().map(|t| format_instant(*t)),
            )),
            Arc::new(StringArray::from_iter_values(
                self.ends.iter().map(|t| format_instant(*t)),
            )),
        ];
        for (name, column) in self.columns.iter().zip(self.values.axis_iter(Axis(1))) {
            fields.push(Field::new(name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from_iter_values(
                column.iter().copied(),
            )));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context(BuildBatchSnafu)
    }
}

fn format_instant(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v}")
    }
}

fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    const PREVIEW_LABEL: &str = "Preview output";
    const PREVIEW_OFFSET: usize = 6;
    let min_width = PREVIEW_OFFSET + PREVIEW_LABEL.len() + 4;

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::rounded());
    table.with(MinWidth::new(min_width));
    table.with(LineText::new(PREVIEW_LABEL, Rows::first()).offset(PREVIEW_OFFSET));
    // LineText re-estimates dimensions, so re-apply MinWidth afterwards.
    table.with(MinWidth::new(min_width));
    table.to_string()
}

pub fn write_csv(res: &Resampled, path: &Path) -> CliResult<()> {
    let display = path.display().to_string();
    let batch = res.to_record_batch()?;
    let file = File::create(path).context(CreateOutputSnafu {
        path: display.clone(),
    })?;
    let mut writer = arrow_csv::WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch).context(WriteCsvSnafu {
        path: display.clone(),
    })?;
    writer
        .into_inner()
        .flush()
        .context(CreateOutputSnafu { path: display })?;
    Ok(())
}

pub fn print_result(res: &Resampled, opts: &OutputOpts) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    write_result(res, opts, &mut stdout)
}

pub fn write_result<W: Write>(res: &Resampled, opts: &OutputOpts, out: &mut W) -> CliResult<()> {
    if let Some(path) = &opts.output {
        write_csv(res, path)?;
    }

    let rows = res.preview_rows(opts.max_rows);
    if !rows.is_empty() || opts.max_rows == 0 {
        writeln!(out, "{}", render_table(&res.header(), &rows)).context(WriteStdoutSnafu)?;
    }

    if res.total_rows() == 0 {
        writeln!(out, "(no windows)").context(WriteStdoutSnafu)?;
    } else if opts.max_rows == 0 {
        writeln!(out, "(preview suppressed; use --max-rows > 0)").context(WriteStdoutSnafu)?;
    }

    writeln!(out, "total_rows: {}", res.total_rows()).context(WriteStdoutSnafu)?;
    for (key, value) in &res.summary {
        writeln!(out, "{key}: {value}").context(WriteStdoutSnafu)?;
    }
    if let Some(path) = &opts.output {
        writeln!(out, "wrote: {}", path.display()).context(WriteStdoutSnafu)?;
    }
    Ok(())
}
