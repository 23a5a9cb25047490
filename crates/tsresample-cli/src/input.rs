//! CSV input: named columns of time stamps and values.
//!
//! Every column is read as text so that malformed cells can be reported
//! with their column and row instead of failing schema inference.

use std::{fs::File, io::Seek, path::Path, sync::Arc};

use arrow::{
    array::{Array, StringArray},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
};
use arrow_csv::{ReaderBuilder, reader::Format};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use snafu::prelude::*;
use tracing::debug;
use tsresample_core::time_input::parse_timestamp;

use crate::error::{
    CliResult, EmptyInputSnafu, InputMissingSnafu, InvalidTimestampSnafu, InvalidValueSnafu,
    MissingColumnSnafu, NonContiguousIntervalsSnafu, ReadCsvSnafu,
};

#[derive(Debug, Clone)]
pub struct CsvInput {
    path: String,
    names: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
}

impl CsvInput {
    pub fn read(path: &Path) -> CliResult<Self> {
        let display = path.display().to_string();
        let mut file = File::open(path).context(InputMissingSnafu {
            path: display.clone(),
        })?;

        let format = Format::default().with_header(true);
        let (inferred, _) = format
            .infer_schema(&mut file, Some(1))
            .context(ReadCsvSnafu {
                path: display.clone(),
            })?;
        file.rewind().context(InputMissingSnafu {
            path: display.clone(),
        })?;

        let names: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
        let schema = Schema::new(
            names
                .iter()
                .map(|name| Field::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );

        let reader = ReaderBuilder::new(Arc::new(schema))
            .with_format(format)
            .build(file)
            .context(ReadCsvSnafu {
                path: display.clone(),
            })?;

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for batch in reader {
            let batch = batch.context(ReadCsvSnafu {
                path: display.clone(),
            })?;
            for (column, array) in columns.iter_mut().zip(batch.columns()) {
                let strings = array
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| ArrowError::CastError("expected a text column".to_string()))
                    .context(ReadCsvSnafu {
                        path: display.clone(),
                    })?;
                column.extend(strings.iter().map(|cell| cell.map(str::to_string)));
            }
        }

        let input = Self {
            path: display,
            names,
            columns,
        };
        ensure!(
            !input.is_empty(),
            EmptyInputSnafu {
                path: input.path.clone(),
            }
        );
        debug!(path = %input.path, rows = input.len(), columns = ?input.names, "read CSV input");
        Ok(input)
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column(&self, name: &str) -> CliResult<&[Option<String>]> {
        let idx = self.names.iter().position(|n| n == name).context(MissingColumnSnafu {
            column: name,
            path: self.path.clone(),
            available: self.names.join(", "),
        })?;
        Ok(&self.columns[idx])
    }

    pub fn timestamps(&self, name: &str) -> CliResult<Vec<DateTime<Utc>>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                parse_timestamp(cell.as_deref().unwrap_or("").trim()).context(
                    InvalidTimestampSnafu {
                        column: name,
                        row: row + 1,
                    },
                )
            })
            .collect()
    }

    /// Numeric column; empty cells read as NaN.
    pub fn values(&self, name: &str) -> CliResult<Vec<f64>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let text = cell.as_deref().unwrap_or("").trim();
                if text.is_empty() {
                    return Ok(f64::NAN);
                }
                text.parse::<f64>().ok().context(InvalidValueSnafu {
                    column: name,
                    row: row + 1,
                    value: text,
                })
            })
            .collect()
    }

    /// One matrix column per named value column, one row per CSV row.
    pub fn value_matrix(&self, names: &[String]) -> CliResult<Array2<f64>> {
        let columns = names
            .iter()
            .map(|name| self.values(name))
            .collect::<CliResult<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.len(), columns.len()), |(r, c)| {
            columns[c][r]
        }))
    }

    /// Edges of an interval series given as `start`/`end` columns.
    ///
    /// Consecutive rows must share their boundary, so `n` rows yield `n + 1`
    /// edges.
    pub fn interval_edges(&self, start: &str, end: &str) -> CliResult<Vec<DateTime<Utc>>> {
        let starts = self.timestamps(start)?;
        let ends = self.timestamps(end)?;

        for (row, (prev_end, next_start)) in ends.iter().zip(starts.iter().skip(1)).enumerate() {
            ensure!(
                prev_end == next_start,
                NonContiguousIntervalsSnafu {
                    row: row + 1,
                    end: prev_end.to_rfc3339(),
                    next_start: next_start.to_rfc3339(),
                }
            );
        }

        let mut edges = starts;
        edges.extend(ends.last().copied());
        Ok(edges)
    }
}
