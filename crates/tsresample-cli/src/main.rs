//! CLI tool for resampling time series stored as CSV.

mod error;
mod input;
mod output;

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ndarray::Array2;
use snafu::ResultExt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsresample_core::{
    AccumulationMethod, AggregateError, DurationInput, EquidistantParams, EquidistantSeries,
    InterpolationParams, ParseStepError, ParseTimeError, Reduction, RegularGrid, TimeInput,
    aggregate_equidistant, aggregate_in_time, average_over_time_windows, grid::duration_secs,
    mean_over_time_windows, sum_over_time_windows, timestamp_to_index,
};

use crate::{
    error::{AggregateSnafu, CliResult, InvalidFlagSnafu, InvalidLogLevelSnafu},
    input::CsvInput,
    output::{OutputOpts, Resampled, print_result},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Sum,
    Mean,
}

impl From<MethodArg> for AccumulationMethod {
    fn from(v: MethodArg) -> Self {
        match v {
            MethodArg::Sum => AccumulationMethod::Sum,
            MethodArg::Mean => AccumulationMethod::Mean,
        }
    }
}

/// Target grid: windows between consecutive points `start + k * step`.
#[derive(Debug, Args)]
struct GridArgs {
    /// First target edge, e.g. 2008-06-02T00:00:00
    #[arg(long)]
    start: String,

    /// Last target edge
    #[arg(long)]
    end: String,

    /// Target step, e.g. 1h, 15m or hours=1,minutes=30
    #[arg(long)]
    step: String,
}

#[derive(Debug, Args)]
struct OutputArgs {
    #[arg(long, default_value_t = 10)]
    max_rows: usize,

    /// Write all windows as CSV (start,end,<value columns>)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Interval input: contiguous rows with start/end stamps.
#[derive(Debug, Args)]
struct IntervalArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long = "start-column", default_value = "start")]
    start_column: String,

    #[arg(long = "end-column", default_value = "end")]
    end_column: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate a regular series (end stamps) onto a coarser regular grid
    Equidistant {
        #[arg(long)]
        input: PathBuf,

        /// Column with the END stamp of each source step
        #[arg(long = "time-column", default_value = "time")]
        time_column: String,

        #[arg(long)]
        value: String,

        /// Length of one source step, e.g. 5m
        #[arg(long = "source-step")]
        source_step: String,

        #[arg(long, value_enum, default_value_t = MethodArg::Sum)]
        method: MethodArg,

        #[arg(long = "min-valid-percent", default_value_t = 100.0)]
        min_valid_percent: f64,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Reduce interval rows into target windows by edge containment
    InTime {
        #[command(flatten)]
        intervals: IntervalArgs,

        /// Repeatable value column names
        #[arg(long = "value", required = true)]
        values: Vec<String>,

        /// sum, mean, min, max, median, std, var, prod, nansum, nanmean, nanmin, nanmax
        #[arg(long, default_value = "sum")]
        reduction: String,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Exact duration-weighted mean of interval rows over target windows
    WeightedMean {
        #[command(flatten)]
        intervals: IntervalArgs,

        #[arg(long = "value", required = true)]
        values: Vec<String>,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Approximate mean of an irregular point series over target windows
    InterpolatedMean {
        #[arg(long)]
        input: PathBuf,

        #[arg(long = "time-column", default_value = "time")]
        time_column: String,

        #[arg(long = "value", required = true)]
        values: Vec<String>,

        /// Helper points farther than this from any sample are ignored; `0s`
        /// keeps only helper points that coincide with a sample
        #[arg(long = "max-dist", default_value = "1h")]
        max_dist: String,

        #[arg(long = "helper-interval", default_value = "5m")]
        helper_interval: String,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Sum interval rows over target windows, tolerating missing values
    SumWindows {
        #[command(flatten)]
        intervals: IntervalArgs,

        #[arg(long)]
        value: String,

        #[arg(long = "min-valid-percent", default_value_t = 100.0)]
        min_valid_percent: f64,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Index of a time stamp in an equidistant series
    Index {
        #[arg(long)]
        timestamp: String,

        /// Series resolution, e.g. minutes=5 or 1h
        #[arg(long)]
        delta: String,

        /// Time stamp of index 0
        #[arg(long)]
        reference: String,
    },
}

#[derive(Debug, Parser)]
#[command(name = "tsresample", version, about = "Resample time series between temporal grids")]
struct Cli {
    /// Log filter (e.g. debug, tsresample_core=debug); defaults to RUST_LOG or warn
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

fn init_tracing(level: Option<&str>) -> CliResult<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context(InvalidLogLevelSnafu { level })?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn parse_instant(flag: &'static str, value: &str) -> CliResult<DateTime<Utc>> {
    TimeInput::from(value)
        .resolve()
        .map_err(AggregateError::from)
        .context(InvalidFlagSnafu { flag, value })
}

fn parse_duration(flag: &'static str, value: &str) -> CliResult<Duration> {
    DurationInput::from(value)
        .resolve()
        .map_err(AggregateError::from)
        .context(InvalidFlagSnafu { flag, value })
}

/// Like [`parse_duration`], but a zero step spec such as `0s` means no slack.
fn parse_tolerance(flag: &'static str, value: &str) -> CliResult<Duration> {
    match DurationInput::from(value).resolve() {
        Err(ParseTimeError::InvalidStep {
            source: ParseStepError::NonPositive { value: 0, .. },
            ..
        }) => Ok(Duration::zero()),
        other => other
            .map_err(AggregateError::from)
            .context(InvalidFlagSnafu { flag, value }),
    }
}

fn parse_grid(args: &GridArgs) -> CliResult<RegularGrid> {
    let start = parse_instant("start", &args.start)?;
    let end = parse_instant("end", &args.end)?;
    let step = parse_duration("step", &args.step)?;
    RegularGrid::new(start, end, step).context(AggregateSnafu)
}

fn output_opts(out: OutputArgs) -> OutputOpts {
    OutputOpts {
        max_rows: out.max_rows,
        output: out.output,
    }
}

/// Window bounds and column-shaped values for edge-based results.
fn edge_windows(
    edges: &[DateTime<Utc>],
    columns: Vec<String>,
    values: Array2<f64>,
) -> Resampled {
    let starts = edges[..edges.len() - 1].to_vec();
    let ends = edges[1..].to_vec();
    Resampled::new(columns, starts, ends, values)
}

#[allow(clippy::too_many_arguments)]
fn cmd_equidistant(
    input: PathBuf,
    time_column: String,
    value: String,
    source_step: String,
    method: MethodArg,
    min_valid_percent: f64,
    grid: GridArgs,
    out: OutputArgs,
) -> CliResult<()> {
    let grid = parse_grid(&grid)?;
    let step = parse_duration("source-step", &source_step)?;
    let csv = CsvInput::read(&input)?;
    let ends = csv.timestamps(&time_column)?;
    let values = csv.values(&value)?;

    let source = EquidistantSeries {
        ends: &ends,
        step,
        values: &values,
    };
    let params = EquidistantParams {
        method: method.into(),
        min_valid_percent,
    };
    let agg = aggregate_equidistant(&grid, &source, &params).context(AggregateSnafu)?;

    let matrix = Array2::from_shape_fn((agg.len(), 2), |(r, c)| {
        if c == 0 {
            agg.values[r]
        } else {
            agg.coverage[r]
        }
    });
    let res = Resampled::new(
        vec![value, "coverage".to_string()],
        agg.starts.clone(),
        agg.ends.clone(),
        matrix,
    )
    .with_summary("inconsistent_windows", agg.inconsistent_windows);
    print_result(&res, &output_opts(out))
}

fn cmd_in_time(
    intervals: IntervalArgs,
    values: Vec<String>,
    reduction: String,
    grid: GridArgs,
    out: OutputArgs,
) -> CliResult<()> {
    let reduction = reduction
        .parse::<Reduction>()
        .map_err(AggregateError::from)
        .context(InvalidFlagSnafu {
            flag: "reduction",
            value: reduction.as_str(),
        })?;
    let edges_trg = parse_grid(&grid)?.points();
    let csv = CsvInput::read(&intervals.input)?;
    let edges_src = csv.interval_edges(&intervals.start_column, &intervals.end_column)?;
    let src = csv.value_matrix(&values)?;

    let agg = aggregate_in_time(src.view(), &edges_src, &edges_trg, 0, reduction)
        .context(AggregateSnafu)?;
    let res = edge_windows(&edges_trg, values, agg).with_summary("reduction", reduction);
    print_result(&res, &output_opts(out))
}

fn cmd_weighted_mean(
    intervals: IntervalArgs,
    values: Vec<String>,
    grid: GridArgs,
    out: OutputArgs,
) -> CliResult<()> {
    let edges_trg = parse_grid(&grid)?.points();
    let csv = CsvInput::read(&intervals.input)?;
    let edges_src = csv.interval_edges(&intervals.start_column, &intervals.end_column)?;
    let src = csv.value_matrix(&values)?;

    let agg = mean_over_time_windows(src.view(), &edges_src, &edges_trg).context(AggregateSnafu)?;
    print_result(&edge_windows(&edges_trg, values, agg), &output_opts(out))
}

#[allow(clippy::too_many_arguments)]
fn cmd_interpolated_mean(
    input: PathBuf,
    time_column: String,
    values: Vec<String>,
    max_dist: String,
    helper_interval: String,
    grid: GridArgs,
    out: OutputArgs,
) -> CliResult<()> {
    let params = InterpolationParams {
        max_dist_secs: duration_secs(parse_tolerance("max-dist", &max_dist)?),
        helper_interval_secs: duration_secs(parse_duration("helper-interval", &helper_interval)?),
    };
    let edges_trg = parse_grid(&grid)?.points();
    let csv = CsvInput::read(&input)?;
    let stamps = csv.timestamps(&time_column)?;
    let src = csv.value_matrix(&values)?;

    let agg = average_over_time_windows(src.view(), &stamps, &edges_trg, &params)
        .context(AggregateSnafu)?;
    print_result(&edge_windows(&edges_trg, values, agg), &output_opts(out))
}

fn cmd_sum_windows(
    intervals: IntervalArgs,
    value: String,
    min_valid_percent: f64,
    grid: GridArgs,
    out: OutputArgs,
) -> CliResult<()> {
    let edges_trg = parse_grid(&grid)?.points();
    let csv = CsvInput::read(&intervals.input)?;
    let edges_src = csv.interval_edges(&intervals.start_column, &intervals.end_column)?;
    let src = csv.values(&value)?;

    let sums = sum_over_time_windows(&src, &edges_src, &edges_trg, min_valid_percent)
        .context(AggregateSnafu)?;
    let matrix = Array2::from_shape_fn((sums.len(), 1), |(r, _)| sums[r]);
    print_result(&edge_windows(&edges_trg, vec![value], matrix), &output_opts(out))
}

fn cmd_index(timestamp: &str, delta: &str, reference: &str) -> CliResult<()> {
    let ts = parse_instant("timestamp", timestamp)?;
    let delta = parse_duration("delta", delta)?;
    let reference = parse_instant("reference", reference)?;
    let index = timestamp_to_index(ts, delta, reference).context(AggregateSnafu)?;
    println!("{index}");
    Ok(())
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;
    info!(command = ?cli.cmd, "starting");

    match cli.cmd {
        Command::Equidistant {
            input,
            time_column,
            value,
            source_step,
            method,
            min_valid_percent,
            grid,
            out,
        } => cmd_equidistant(
            input,
            time_column,
            value,
            source_step,
            method,
            min_valid_percent,
            grid,
            out,
        ),

        Command::InTime {
            intervals,
            values,
            reduction,
            grid,
            out,
        } => cmd_in_time(intervals, values, reduction, grid, out),

        Command::WeightedMean {
            intervals,
            values,
            grid,
            out,
        } => cmd_weighted_mean(intervals, values, grid, out),

        Command::InterpolatedMean {
            input,
            time_column,
            values,
            max_dist,
            helper_interval,
            grid,
            out,
        } => cmd_interpolated_mean(
            input,
            time_column,
            values,
            max_dist,
            helper_interval,
            grid,
            out,
        ),

        Command::SumWindows {
            intervals,
            value,
            min_valid_percent,
            grid,
            out,
        } => cmd_sum_windows(intervals, value, min_valid_percent, grid, out),

        Command::Index {
            timestamp,
            delta,
            reference,
        } => cmd_index(&timestamp, &delta, &reference),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
