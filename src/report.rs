//! Rendering of analysis results.
//!
//! Computation never writes output; everything a run shows or saves goes through here. Text
//! renderers take any [`Write`] so the binary can pass stdout and tests can pass a `Vec<u8>`.
//! File outputs are written with the `csv` crate. [`write_outputs`] attempts every destination
//! a request names and reports all failures together.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisReport, InputSummary};
use crate::config::AnalysisRequest;
use crate::error::{AnalysisError, AnalysisResult, OutputFailure};
use crate::processing::{CycleData, Spectrum};
use crate::store::ColumnStore;
use crate::types::{ColumnKind, DoubleColumn, RowRange};

const RULE: usize = 55;
const FILE_RULE: usize = 70;

/// Summary of the loaded file: layout, timestep column and data columns.
pub fn write_input_summary<W: Write>(out: &mut W, input: &InputSummary) -> io::Result<()> {
    let name = input
        .path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    writeln!(out, "\n{}\n Input file: {name}\n{}\n", "=".repeat(RULE), "=".repeat(RULE))?;
    writeln!(out, "{:<20}{}", " Total columns:", input.columns.len())?;
    writeln!(out, "{:<20}{}", " Total rows:", input.rows)?;
    writeln!(out, "{:<20}{}\n", " Data delimitation:", input.data_delimitation)?;

    let timestep = input
        .columns
        .iter()
        .find(|c| c.kind == ColumnKind::Integer);
    match (timestep, input.timestep_range) {
        (Some(c), Some(range)) => {
            writeln!(out, " Timestep column:\n{}", "-".repeat(30))?;
            writeln!(out, "{:>3}. {}", c.number, c.name)?;
            writeln!(
                out,
                "\n Available timestep range is from {} to {}.\n",
                range.begin, range.end
            )?;
        }
        _ => writeln!(out, " No consistent timestep column was found.\n")?,
    }

    writeln!(out, " Data columns:\n{}", "-".repeat(30))?;
    for c in input.columns.iter().filter(|c| c.kind == ColumnKind::Double) {
        writeln!(out, "{:>3}. {}", c.number, c.name)?;
    }
    writeln!(out, "\n{}", "=".repeat(RULE))
}

fn write_heading<W: Write>(out: &mut W, report: &AnalysisReport, indent: &str) -> io::Result<()> {
    if let Some(t) = report.timesteps {
        writeln!(out, "{indent}Timesteps         => {} to {}", t.begin, t.end)?;
    }
    writeln!(out, "{indent}Rows              => {}", report.rows)?;
    if let Some(c) = &report.cycle {
        write_cycle_block(out, c, indent)?;
    }
    Ok(())
}

fn write_cycle_block<W: Write>(out: &mut W, c: &CycleData, indent: &str) -> io::Result<()> {
    writeln!(out, "{indent}Column for cycles => {}", c.column)?;
    writeln!(out, "{indent}Center for cycles => {}", c.center)?;
    writeln!(out, "{indent}Number of cycles  => {}", c.cycle_count)?;
    writeln!(out)?;
    writeln!(out, "{indent}Crests mean       => {}", c.crests_mean)?;
    writeln!(out, "{indent}Troughs mean      => {}", c.troughs_mean)?;
    writeln!(out)?;
    if let Some(max) = c.peaks_max() {
        writeln!(out, "{indent}Peaks maximum     => {max}")?;
    }
    writeln!(out, "{indent}Peaks mean        => {}", c.peaks_mean)?;
    if let Some(m) = c.peaks_one_third_mean {
        writeln!(out, "{indent}1/3rd peaks mean  => {m}")?;
    }
    if let Some(m) = c.peaks_one_tenth_mean {
        writeln!(out, "{indent}1/10th peaks mean => {m}")?;
    }
    if let Some(f) = c.frequency {
        writeln!(out, "\n{indent}Cycle frequency   => {f}")?;
    }
    Ok(())
}

/// Calculation results per column and statistic, preceded by the range and cycle block.
pub fn write_results<W: Write>(out: &mut W, report: &AnalysisReport) -> io::Result<()> {
    writeln!(out, " Calculation results\n")?;
    write_heading(out, report, " ")?;
    writeln!(out, "{}", "=".repeat(RULE))?;

    for column in &report.results {
        writeln!(out, "\n {}\n{}", column.column, "-".repeat(RULE))?;
        for v in &column.values {
            writeln!(out, " {:<22} = {}", v.statistic.label(), v.value)?;
        }
    }
    writeln!(out, "\n{}", "=".repeat(RULE))
}

/// Largest bins of a spectrum.
pub fn write_spectrum_summary<W: Write>(out: &mut W, spectrum: &Spectrum, top: usize) -> io::Result<()> {
    writeln!(out, "\n FFT partial results (sorted by magnitude)")?;
    writeln!(out, " Column for FFT => {}", spectrum.column)?;
    writeln!(out, "{}\n", "=".repeat(RULE))?;
    writeln!(out, " {:<30}{:<30}{}\n", "Frequency", "Magnitude", "Phase")?;
    for bin in spectrum.dominant(top) {
        writeln!(out, " {:<30}{:<30}{}", bin.frequency, bin.magnitude, bin.phase)?;
    }
    writeln!(out, "\n{}", "=".repeat(RULE))
}

/// Append the results block to `path`, creating the file if needed.
///
/// The block is a short text heading followed by a CSV table with one row per statistic
/// and one column per analyzed column.
pub fn append_results_csv(path: &Path, report: &AnalysisReport) -> AnalysisResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let input = report
        .input
        .path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    writeln!(file, "Input file: {input}\nCalculation results")?;
    write_heading(&mut file, report, "")?;
    writeln!(file, "{}", "`".repeat(FILE_RULE))?;

    {
        let mut w = csv::WriterBuilder::new().flexible(true).from_writer(&mut file);
        let mut header = vec!["Calculations\\Columns".to_string()];
        header.extend(report.results.iter().map(|c| c.column.clone()));
        w.write_record(&header)?;
        for (i, statistic) in report.statistics.iter().enumerate() {
            let mut row = vec![statistic.label().to_string()];
            row.extend(
                report
                    .results
                    .iter()
                    .map(|c| c.values.get(i).map(|v| v.value.to_string()).unwrap_or_default()),
            );
            w.write_record(&row)?;
        }
        w.flush()?;
    }
    writeln!(file, "{}\n", "`".repeat(FILE_RULE))?;
    Ok(())
}

/// Peak table: sorted peaks next to the crests and troughs in walk order.
///
/// Rows past the end of the crest/trough lists leave those cells blank.
pub fn write_peaks_csv(path: &Path, cycle: &CycleData) -> AnalysisResult<()> {
    let mut w = csv::Writer::from_writer(File::create(path)?);
    w.write_record(["Peaks (sorted)", "Crests (unsorted)", "Troughs (unsorted)"])?;
    for (i, peak) in cycle.peaks.iter().enumerate() {
        let cell = |values: &[f64]| values.get(i).map(f64::to_string).unwrap_or_default();
        w.write_record([peak.to_string(), cell(&cycle.crests), cell(&cycle.troughs)])?;
    }
    w.flush()?;
    Ok(())
}

/// Every bin of a spectrum.
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> AnalysisResult<()> {
    let mut w = csv::Writer::from_writer(File::create(path)?);
    w.write_record(["Frequency", "Magnitude", "Phase"])?;
    for bin in &spectrum.bins {
        w.write_record([
            bin.frequency.to_string(),
            bin.magnitude.to_string(),
            bin.phase.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Selected columns over `rows`, timestep column first when present.
pub fn write_data<W: Write>(
    out: W,
    store: &ColumnStore,
    columns: &[&DoubleColumn],
    rows: RowRange,
    delimiter: u8,
) -> AnalysisResult<()> {
    store.check_range(rows)?;
    let timestep = store.timestep_column();
    let mut w = csv::WriterBuilder::new().delimiter(delimiter).from_writer(out);

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    header.extend(timestep.map(|t| t.name()));
    header.extend(columns.iter().map(|c| c.name()));
    w.write_record(&header)?;

    let mut record: Vec<String> = Vec::with_capacity(header.len());
    for row in rows.begin..=rows.end {
        record.clear();
        record.extend(timestep.map(|t| t.values()[row].to_string()));
        record.extend(columns.iter().map(|c| c.values()[row].to_string()));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Pretty JSON rendering of a report.
pub fn to_json(report: &AnalysisReport) -> AnalysisResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write every file output named by `request`.
///
/// A failing destination does not stop the others; all failures are returned together as
/// [`AnalysisError::Output`]. On success the written paths are returned in order.
pub fn write_outputs(
    store: &ColumnStore,
    request: &AnalysisRequest,
    report: &AnalysisReport,
) -> AnalysisResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut failures = Vec::new();
    let mut attempt = |path: &Path, result: AnalysisResult<()>| match result {
        Ok(()) => {
            log::info!("output written to {}", path.display());
            written.push(path.to_path_buf());
        }
        Err(e) => {
            log::warn!("failed to write {}: {e}", path.display());
            failures.push(OutputFailure {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    for path in &request.outputs {
        attempt(path, append_results_csv(path, report));
    }
    if let (Some(c), Some(data)) = (&request.cycle, &report.cycle) {
        if let Some(path) = &c.peaks_output {
            attempt(path, write_peaks_csv(path, data));
        }
    }
    if let (Some(s), Some(data)) = (&request.spectrum, &report.spectrum) {
        if let Some(path) = &s.output {
            attempt(path, write_spectrum_csv(path, data));
        }
    }
    if let Some(path) = &request.data_output {
        let result = crate::analysis::selected_columns(store, request).and_then(|columns| {
            let file = File::create(path)?;
            write_data(file, store, &columns, report.rows, b',')
        });
        attempt(path, result);
    }

    if failures.is_empty() {
        Ok(written)
    } else {
        Err(AnalysisError::Output { written, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::CycleRequest;
    use crate::ingestion::{ingest_from_str, IngestionOptions};
    use crate::types::ColumnId;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("coldata_report_{name}_{nanos}"))
    }

    fn fixture() -> (ColumnStore, AnalysisRequest, AnalysisReport) {
        let text = "t,x,y\n0,1.0,2.5\n1,-1.0,3.5\n2,1.0,2.5\n3,-1.0,3.5\n4,1.0,2.5\n";
        let store = ingest_from_str(text, &IngestionOptions::default()).unwrap();
        let mut req = AnalysisRequest::new("fixture.csv");
        req.cycle = Some(CycleRequest::new(ColumnId::name("x"), 0.0));
        let report = analyze(&store, &req).unwrap();
        (store, req, report)
    }

    #[test]
    fn terminal_rendering_mentions_columns_and_cycles() {
        let (_store, _req, report) = fixture();
        let mut buf = Vec::new();
        write_input_summary(&mut buf, &report.input).unwrap();
        write_results(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(&format!("{:<20}5", " Total rows:")));
        assert!(text.contains("Available timestep range is from 0 to 4."));
        assert!(text.contains("  2. x"));
        assert!(text.contains("Number of cycles  => 2"));
        assert!(text.contains("Cycle frequency   => 0.5"));
        assert!(text.contains(&format!(" {:<22} = ", "Mean")));
    }

    #[test]
    fn peaks_table_leaves_trailing_cells_blank() {
        let (_store, _req, report) = fixture();
        let path = tmp_path("peaks.csv");
        write_peaks_csv(&path, report.cycle.as_ref().unwrap()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Peaks (sorted),Crests (unsorted),Troughs (unsorted)");
        assert_eq!(lines[1], "1,1,-1");
        assert_eq!(lines[3], "1,,");
        assert_eq!(lines.len(), 5);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn results_are_appended_not_overwritten() {
        let (_store, _req, report) = fixture();
        let path = tmp_path("results.csv");
        append_results_csv(&path, &report).unwrap();
        append_results_csv(&path, &report).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Calculations\\Columns,x,y").count(), 2);
        assert!(text.contains("Mean,0,3\n"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn every_destination_is_attempted() {
        let (store, mut req, report) = fixture();
        let good = tmp_path("good.csv");
        let bad = std::env::temp_dir()
            .join("coldata_missing_dir_for_report_test")
            .join("out.csv");
        let data = tmp_path("data.csv");
        req.outputs = vec![bad.clone(), good.clone()];
        req.data_output = Some(data.clone());

        let err = write_outputs(&store, &req, &report).unwrap_err();
        match err {
            AnalysisError::Output { written, failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].path, bad);
                assert_eq!(written, vec![good.clone(), data.clone()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(good.exists());
        let exported = fs::read_to_string(&data).unwrap();
        assert!(exported.starts_with("t,x,y\n0,1,2.5\n"));
        assert_eq!(exported.lines().count(), 5);
        let _ = fs::remove_file(good);
        let _ = fs::remove_file(data);
    }

    #[test]
    fn json_report_contains_cycle_data() {
        let (_store, _req, report) = fixture();
        let json = to_json(&report).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["cycle"]["cycle_count"], 2);
        assert_eq!(v["rows"]["end"], 3);
        assert_eq!(v["input"]["data_delimitation"], "delimiter");
    }
}
