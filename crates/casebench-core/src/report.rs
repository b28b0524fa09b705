//! Final report: human-readable text for stdout and a JSON summary for tooling.

use crate::aggregate::RunningStatistics;
use crate::case::CaseId;
use crate::errors::ProcessFailure;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Shown in grid cells that received no scores.
pub const EMPTY_CELL: &str = "-";
pub const BAR_SYMBOL: char = '*';

pub const SCHEMA_VERSION: &str = "casebench-summary-v1";

/// Histogram bar for `count` out of `total_cases`; `bar_width` symbols means every case.
pub fn bar(count: u64, total_cases: u64, bar_width: usize) -> String {
    if total_cases == 0 {
        return String::new();
    }
    let len = (count as u128 * bar_width as u128 / total_cases as u128) as usize;
    std::iter::repeat(BAR_SYMBOL).take(len).collect()
}

fn fmt_entry(entry: Option<(i64, CaseId)>) -> String {
    match entry {
        Some((score, case)) => format!("{score} ({case})"),
        None => EMPTY_CELL.to_string(),
    }
}

/// Renders the report printed once every case has an outcome.
pub fn render_text(stats: &RunningStatistics, total_cases: u64, extremes: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "total: {}", stats.total());
    let _ = writeln!(out, "max: {}", fmt_entry(stats.best()));
    match stats.mean() {
        Some(mean) => {
            let _ = writeln!(out, "ave: {mean:.3}");
        }
        None => {
            let _ = writeln!(out, "ave: {EMPTY_CELL}");
        }
    }
    let _ = writeln!(out, "min: {}", fmt_entry(stats.worst()));
    let _ = writeln!(
        out,
        "scored: {}/{}  failed: {}",
        stats.successes(),
        total_cases,
        stats.failures().len()
    );

    if extremes > 0 && stats.successes() > 0 {
        let _ = writeln!(out, "\ntop {extremes}:");
        for (score, case) in stats.top(extremes) {
            let _ = writeln!(out, "  {case} {score}");
        }
        let _ = writeln!(out, "bottom {extremes}:");
        for (score, case) in stats.bottom(extremes) {
            let _ = writeln!(out, "  {case} {score}");
        }
    }

    if !stats.failures().is_empty() {
        let _ = writeln!(out, "\nfailures:");
        for (case, failure) in stats.failures() {
            let _ = writeln!(out, "  {case} {failure}");
        }
    }

    let hist = stats.histogram();
    let _ = writeln!(out, "\nhistogram:");
    for (idx, count) in hist.counts().iter().enumerate() {
        let (low, high) = hist.bucket_range(idx);
        let _ = writeln!(
            out,
            "{low} ~ {high}: {}",
            bar(*count, total_cases, hist.config().bar_width)
        );
    }

    let grid = stats.grid();
    let _ = writeln!(out, "\nmean score by n (rows) x m (cols):");
    let _ = write!(out, "{:>6}", "n\\m");
    for col in 0..grid.config().cols {
        let _ = write!(out, " {:>9}", grid.col_start(col));
    }
    let _ = writeln!(out);
    for (row, cells) in grid.rows().iter().enumerate() {
        let _ = write!(out, "{:>6}", grid.row_start(row));
        for cell in cells {
            match cell.mean() {
                Some(mean) => {
                    let _ = write!(out, " {:>9.0}", mean);
                }
                None => {
                    let _ = write!(out, " {EMPTY_CELL:>9}");
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCase {
    pub case: CaseId,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBucket {
    pub low: i64,
    pub high: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub n_from: u32,
    /// One entry per column; `None` for empty cells.
    pub means: Vec<Option<f64>>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedCase {
    pub case: CaseId,
    #[serde(flatten)]
    pub failure: ProcessFailure,
}

/// Machine-readable run summary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub schema_version: String,
    pub generated_at: String,
    pub cases: u64,
    pub scored: u64,
    pub failed: u64,
    pub ungrouped: u64,
    pub total: i64,
    pub mean: Option<f64>,
    pub top: Vec<RankedCase>,
    pub bottom: Vec<RankedCase>,
    pub histogram: Vec<HistogramBucket>,
    pub grid_columns: Vec<u32>,
    pub grid: Vec<GridRow>,
    pub failures: Vec<FailedCase>,
}

impl Summary {
    pub fn from_stats(stats: &RunningStatistics, total_cases: u64, extremes: usize) -> Self {
        let ranked = |v: Vec<(i64, CaseId)>| {
            v.into_iter()
                .map(|(score, case)| RankedCase { case, score })
                .collect()
        };
        let hist = stats.histogram();
        let grid = stats.grid();
        Self {
            schema_version: SCHEMA_VERSION.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            cases: total_cases,
            scored: stats.successes(),
            failed: stats.failures().len() as u64,
            ungrouped: stats.ungrouped(),
            total: stats.total(),
            mean: stats.mean(),
            top: ranked(stats.top(extremes)),
            bottom: ranked(stats.bottom(extremes)),
            histogram: hist
                .counts()
                .iter()
                .enumerate()
                .map(|(idx, count)| {
                    let (low, high) = hist.bucket_range(idx);
                    HistogramBucket {
                        low,
                        high,
                        count: *count,
                    }
                })
                .collect(),
            grid_columns: (0..grid.config().cols).map(|c| grid.col_start(c)).collect(),
            grid: grid
                .rows()
                .iter()
                .enumerate()
                .map(|(row, cells)| GridRow {
                    n_from: grid.row_start(row),
                    means: cells.iter().map(|c| c.mean()).collect(),
                    counts: cells.iter().map(|c| c.count).collect(),
                })
                .collect(),
            failures: stats
                .failures()
                .iter()
                .map(|(case, failure)| FailedCase {
                    case: *case,
                    failure: failure.clone(),
                })
                .collect(),
        }
    }
}

pub fn write_summary(summary: &Summary, out: &Path) -> std::io::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::other)?;
    std::fs::write(out, json)
}
