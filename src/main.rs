//! Command line entry point.
//!
//! ```bash
//! coldata forces.dat -c Fx -c Fy -r 100 2000 -s mean -s rms -o results.csv
//! coldata forces.dat -c Fx --cycle-column Fx --cycle-center 0 --cycles 10 --peaks-out peaks.csv
//! coldata --config request.json --json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use coldata::analysis::{self, AnalysisReport};
use coldata::config::{AnalysisRequest, CycleRequest, RangeSelection, SpectrumRequest};
use coldata::processing::{CycleInit, Statistic};
use coldata::report;
use coldata::store::ColumnStore;
use coldata::types::{ColumnId, RowRange, TimestepRange};
use coldata::{AnalysisError, AnalysisResult};

#[derive(Parser, Debug)]
#[command(name = "coldata")]
#[command(about = "Statistics and cycle analysis of column data files", long_about = None)]
struct Cli {
    /// Input data file
    file: Option<PathBuf>,

    /// Field delimiter (auto-detected when omitted)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Column to analyze, by name or 1-based number (repeatable)
    #[arg(short, long = "column")]
    columns: Vec<ColumnId>,

    /// Row range, 0-based and inclusive
    #[arg(short, long, num_args = 2, value_names = ["BEGIN", "END"], conflicts_with = "timesteps")]
    rows: Option<Vec<usize>>,

    /// Timestep range, inclusive
    #[arg(short, long, num_args = 2, value_names = ["BEGIN", "END"], allow_negative_numbers = true)]
    timesteps: Option<Vec<i64>>,

    /// Statistic to compute: min, max, absmin, absmax, mean, rms, frms, cubic-mean (repeatable)
    #[arg(short, long = "stat")]
    statistics: Vec<Statistic>,

    /// Column whose cycles are extracted
    #[arg(long)]
    cycle_column: Option<ColumnId>,

    /// Value the signal oscillates around
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, requires = "cycle_column")]
    cycle_center: f64,

    /// Number of cycles to extract (all complete cycles when omitted)
    #[arg(long = "cycles", requires = "cycle_column")]
    cycle_count: Option<usize>,

    /// Edge the cycles are counted from
    #[arg(long, value_parser = ["first", "last"], default_value = "first", requires = "cycle_column")]
    cycle_init: String,

    /// Rows searched for cycles
    #[arg(long, num_args = 2, value_names = ["BEGIN", "END"], requires = "cycle_column", conflicts_with = "cycle_timesteps")]
    cycle_rows: Option<Vec<usize>>,

    /// Timesteps searched for cycles
    #[arg(long, num_args = 2, value_names = ["BEGIN", "END"], requires = "cycle_column", allow_negative_numbers = true)]
    cycle_timesteps: Option<Vec<i64>>,

    /// Minimum crest-to-trough amplitude of a cycle
    #[arg(long, requires = "cycle_column")]
    min_amplitude: Option<f64>,

    /// Minimum number of rows spanned by a cycle
    #[arg(long, requires = "cycle_column")]
    min_rows: Option<usize>,

    /// Time between consecutive rows, for the cycle frequency
    #[arg(long, requires = "cycle_column", conflicts_with = "time_column")]
    time_increment: Option<f64>,

    /// Column holding the time of each row, for the cycle frequency
    #[arg(long, requires = "cycle_column")]
    time_column: Option<ColumnId>,

    /// Write sorted peaks, crests and troughs to this CSV file
    #[arg(long, requires = "cycle_column")]
    peaks_out: Option<PathBuf>,

    /// Column to transform with an FFT
    #[arg(long)]
    fft: Option<ColumnId>,

    /// Time between samples for the FFT frequencies
    #[arg(long, requires = "fft")]
    fft_interval: Option<f64>,

    /// Write the full spectrum to this CSV file
    #[arg(long, requires = "fft")]
    fft_out: Option<PathBuf>,

    /// Append calculation results to this CSV file (repeatable)
    #[arg(short, long = "output")]
    outputs: Vec<PathBuf>,

    /// Print the selected columns over the analyzed rows
    #[arg(long)]
    print_data: bool,

    /// Write the selected columns over the analyzed rows to this CSV file
    #[arg(long)]
    data_out: Option<PathBuf>,

    /// Load the request from a JSON file; other options override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Worker threads for the statistics
    #[arg(long)]
    threads: Option<usize>,
}

fn pair<T: Copy>(values: &[T]) -> (T, T) {
    (values[0], values[1])
}

impl Cli {
    fn into_request(self) -> AnalysisResult<AnalysisRequest> {
        let mut req = match &self.config {
            Some(path) => AnalysisRequest::from_json_path(path)?,
            None => AnalysisRequest::default(),
        };
        if let Some(file) = self.file {
            req.path = file;
        }
        if self.delimiter.is_some() {
            req.delimiter = self.delimiter;
        }
        if !self.columns.is_empty() {
            req.columns = self.columns;
        }
        if let Some(r) = self.rows.as_deref().map(pair) {
            req.range = Some(RangeSelection::Rows(RowRange::new(r.0, r.1)));
        }
        if let Some(t) = self.timesteps.as_deref().map(pair) {
            req.range = Some(RangeSelection::Timesteps(TimestepRange::new(t.0, t.1)));
        }
        if !self.statistics.is_empty() {
            req.statistics = self.statistics;
        }

        if let Some(column) = self.cycle_column {
            let mut cycle = CycleRequest::new(column, self.cycle_center);
            cycle.count = self.cycle_count;
            cycle.init = self.cycle_init.parse::<CycleInit>()?;
            cycle.range = match (self.cycle_rows.as_deref(), self.cycle_timesteps.as_deref()) {
                (Some(r), _) => {
                    let (b, e) = pair(r);
                    Some(RangeSelection::Rows(RowRange::new(b, e)))
                }
                (None, Some(t)) => {
                    let (b, e) = pair(t);
                    Some(RangeSelection::Timesteps(TimestepRange::new(b, e)))
                }
                (None, None) => None,
            };
            cycle.min_amplitude = self.min_amplitude;
            cycle.min_row_interval = self.min_rows;
            cycle.time_increment = self.time_increment;
            cycle.time_column = self.time_column;
            cycle.peaks_output = self.peaks_out;
            req.cycle = Some(cycle);
        }

        if let Some(column) = self.fft {
            let mut spectrum = SpectrumRequest::new(column);
            spectrum.sample_interval = self.fft_interval;
            spectrum.output = self.fft_out;
            req.spectrum = Some(spectrum);
        }

        req.outputs.extend(self.outputs);
        if self.data_out.is_some() {
            req.data_output = self.data_out;
        }
        req.print_data |= self.print_data;
        if self.threads.is_some() {
            req.num_threads = self.threads;
        }
        Ok(req)
    }
}

fn render(
    out: &mut impl Write,
    store: &ColumnStore,
    request: &AnalysisRequest,
    report: &AnalysisReport,
    json: bool,
) -> AnalysisResult<()> {
    if json {
        writeln!(out, "{}", report::to_json(report)?)?;
        return Ok(());
    }
    report::write_input_summary(out, &report.input)?;
    report::write_results(out, report)?;
    if let (Some(s), Some(spectrum)) = (&request.spectrum, &report.spectrum) {
        report::write_spectrum_summary(out, spectrum, s.top)?;
    }
    if request.print_data {
        let columns = analysis::selected_columns(store, request)?;
        writeln!(out)?;
        report::write_data(&mut *out, store, &columns, report.rows, b'\t')?;
    }
    Ok(())
}

fn run(cli: Cli) -> AnalysisResult<()> {
    let json = cli.json;
    let request = cli.into_request()?;
    let (store, report) = analysis::run(&request)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, &store, &request, &report, json)?;

    let result = report::write_outputs(&store, &request, &report);
    if !json {
        for p in written_paths(&result) {
            writeln!(out, "\nThe output has been written to \"{}\"", p.display())?;
        }
    }
    result.map(|_| ())
}

/// Destinations that were written, including those written alongside failed ones.
fn written_paths(result: &AnalysisResult<Vec<PathBuf>>) -> &[PathBuf] {
    match result {
        Ok(paths) => paths,
        Err(AnalysisError::Output { written, .. }) => written,
        Err(_) => &[],
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n{}", e.user_message());
            match e {
                AnalysisError::Configuration { .. } => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
