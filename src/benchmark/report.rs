//! Benchmark report generation
//!
//! Renders sweep results as a fixed-width table or as CSV.

use anyhow::{Context, Result};

use super::runner::BenchmarkResult;

/// Report output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Fixed-width text table
    #[default]
    Human,
    /// One row per metric, one column per level
    Csv,
}

impl ReportFormat {
    /// Parse from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Csv => "csv",
        }
    }
}

const HEADERS: [&str; 6] = [
    "Inflight",
    "RPS",
    "P50 (µs)",
    "P90 (µs)",
    "P99 (µs)",
    "P99.9 (µs)",
];

const MIN_WIDTHS: [usize; 6] = [8, 12, 10, 10, 10, 10];

/// Two spaces between adjacent columns
const COLUMN_GAP: usize = 2;

/// Column widths of the human table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnWidths([usize; 6]);

impl ColumnWidths {
    /// Widest formatted value per column, never below the column minimum
    pub fn compute(results: &[BenchmarkResult]) -> Self {
        let mut widths = MIN_WIDTHS;
        for cells in results.iter().map(row_cells) {
            for (width, cell) in widths.iter_mut().zip(cells.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }
        Self(widths)
    }

    pub fn get(&self, column: usize) -> usize {
        self.0[column]
    }

    /// Width of a full line, gaps included
    pub fn total(&self) -> usize {
        self.0.iter().sum::<usize>() + COLUMN_GAP * (self.0.len() - 1)
    }
}

/// Formatted cell values of one result, in column order
fn row_cells(result: &BenchmarkResult) -> [String; 6] {
    [
        result.inflight.to_string(),
        format!("{:.2}", result.rps),
        format!("{:.2}", result.p50),
        format!("{:.2}", result.p90),
        format!("{:.2}", result.p99),
        format!("{:.2}", result.p999),
    ]
}

/// Benchmark report generator
pub struct BenchmarkReport;

impl BenchmarkReport {
    /// Render `results` in `format`
    pub fn render(results: &[BenchmarkResult], format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Human => Ok(Self::human(results)),
            ReportFormat::Csv => Self::csv(results),
        }
    }

    /// Fixed-width table bordered by `=` rules
    pub fn human(results: &[BenchmarkResult]) -> String {
        let widths = ColumnWidths::compute(results);
        let w = |i: usize| widths.get(i);
        let gap = " ".repeat(COLUMN_GAP);

        let mut output = String::new();
        output.push_str("\nBenchmark Results\n");
        output.push_str(&"=".repeat(widths.total()));
        output.push('\n');

        let header: Vec<String> = HEADERS
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:<width$}", h, width = w(i)))
            .collect();
        output.push_str(&header.join(&gap));
        output.push('\n');
        output.push_str(&"-".repeat(widths.total()));
        output.push('\n');

        for result in results {
            let cells = row_cells(result);
            let line: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i == 0 {
                        format!("{:<width$}", cell, width = w(i))
                    } else {
                        format!("{:>width$}", cell, width = w(i))
                    }
                })
                .collect();
            output.push_str(&line.join(&gap));
            output.push('\n');
        }

        output.push_str(&"=".repeat(widths.total()));
        output.push('\n');
        output
    }

    /// CSV with one row per metric and one column per inflight level
    pub fn csv(results: &[BenchmarkResult]) -> Result<String> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut buf);

            let mut header = vec!["What".to_string()];
            header.extend(results.iter().map(|r| r.inflight.to_string()));
            writer.write_record(&header).context("Failed to write CSV header")?;

            let metrics: [(&str, fn(&BenchmarkResult) -> f64); 5] = [
                ("Latency p50 (µs)", |r| r.p50),
                ("Latency p90 (µs)", |r| r.p90),
                ("Latency p99 (µs)", |r| r.p99),
                ("Latency p99.9 (µs)", |r| r.p999),
                ("Throughput (RPS)", |r| r.rps),
            ];

            for (label, value) in metrics {
                let mut row = vec![label.to_string()];
                row.extend(results.iter().map(|r| format!("{:.2}", value(r))));
                writer
                    .write_record(&row)
                    .with_context(|| format!("Failed to write CSV row {label}"))?;
            }

            writer.flush().context("Failed to flush CSV output")?;
        }

        String::from_utf8(buf).context("CSV output is not valid UTF-8")
    }
}
