//! Run statistics. Owned by the scheduler's completion loop and folded one outcome at a
//! time; never shared between tasks.

use crate::case::{CaseId, SizeParameters, TrialOutcome};
use crate::config::{GridConfig, HistogramConfig};
use crate::errors::ProcessFailure;

/// Fixed-width score histogram. Out-of-range scores clamp to the first/last bucket.
#[derive(Debug, Clone)]
pub struct Histogram {
    cfg: HistogramConfig,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn new(cfg: HistogramConfig) -> Self {
        let counts = vec![0; cfg.buckets];
        Self { cfg, counts }
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.cfg
    }

    pub fn bucket_index(&self, score: i64) -> usize {
        let offset = score.saturating_sub(self.cfg.base);
        if offset < 0 {
            return 0;
        }
        let idx = (offset / self.cfg.step) as u64;
        idx.min(self.counts.len() as u64 - 1) as usize
    }

    pub fn record(&mut self, score: i64) {
        let idx = self.bucket_index(score);
        self.counts[idx] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Inclusive `(low, high)` score range of bucket `idx`.
    pub fn bucket_range(&self, idx: usize) -> (i64, i64) {
        let low = self.cfg.base.saturating_add(self.cfg.step.saturating_mul(idx as i64));
        (low, low.saturating_add(self.cfg.step - 1))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCell {
    pub sum: i64,
    pub count: u64,
}

impl GridCell {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Mean score grouped by bucketized `(n, m)`.
#[derive(Debug, Clone)]
pub struct SizeGrid {
    cfg: GridConfig,
    cells: Vec<Vec<GridCell>>,
}

impl SizeGrid {
    pub fn new(cfg: GridConfig) -> Self {
        let cells = vec![vec![GridCell::default(); cfg.cols]; cfg.rows];
        Self { cfg, cells }
    }

    pub fn config(&self) -> &GridConfig {
        &self.cfg
    }

    /// `(row, col)` for a size; both clamped into the grid.
    pub fn cell_index(&self, size: SizeParameters) -> (usize, usize) {
        let row = size.n.saturating_sub(self.cfg.row_offset) / self.cfg.row_stride;
        let col = size.m.saturating_sub(self.cfg.col_offset) / self.cfg.col_stride;
        (
            (row as usize).min(self.cfg.rows - 1),
            (col as usize).min(self.cfg.cols - 1),
        )
    }

    pub fn record(&mut self, size: SizeParameters, score: i64) {
        let (row, col) = self.cell_index(size);
        let cell = &mut self.cells[row][col];
        cell.sum = cell.sum.saturating_add(score);
        cell.count += 1;
    }

    pub fn cell(&self, row: usize, col: usize) -> GridCell {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.cells
    }

    /// Lowest `n` that lands in `row`.
    pub fn row_start(&self, row: usize) -> u32 {
        self.cfg.row_offset + self.cfg.row_stride * row as u32
    }

    /// Lowest `m` that lands in `col`.
    pub fn col_start(&self, col: usize) -> u32 {
        self.cfg.col_offset + self.cfg.col_stride * col as u32
    }
}

#[derive(Debug, Clone)]
pub struct RunningStatistics {
    /// `(score, case)` in ascending order.
    ranking: Vec<(i64, CaseId)>,
    sum: i64,
    successes: u64,
    folded: u64,
    ungrouped: u64,
    histogram: Histogram,
    grid: SizeGrid,
    failures: Vec<(CaseId, ProcessFailure)>,
}

impl RunningStatistics {
    pub fn new(histogram: HistogramConfig, grid: GridConfig) -> Self {
        Self {
            ranking: Vec::new(),
            sum: 0,
            successes: 0,
            folded: 0,
            ungrouped: 0,
            histogram: Histogram::new(histogram),
            grid: SizeGrid::new(grid),
            failures: Vec::new(),
        }
    }

    /// Folds one outcome. Parse failures are fatal to the run and are never folded;
    /// the scheduler stops before getting here.
    pub fn fold(&mut self, outcome: &TrialOutcome) {
        match outcome {
            TrialOutcome::Success { case, score, size } => {
                let entry = (*score, *case);
                let pos = self.ranking.partition_point(|e| *e <= entry);
                self.ranking.insert(pos, entry);
                self.sum = self.sum.saturating_add(*score);
                self.successes += 1;
                self.histogram.record(*score);
                match size {
                    Some(size) => self.grid.record(*size, *score),
                    None => self.ungrouped += 1,
                }
            }
            TrialOutcome::ProcessFailure { case, failure } => {
                self.failures.push((*case, failure.clone()));
            }
            TrialOutcome::ParseFailure { case, .. } => {
                tracing::error!(case = %case, "contract violation reached the aggregator; ignored");
                return;
            }
        }
        self.folded += 1;
    }

    pub fn total(&self) -> i64 {
        self.sum
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Outcomes folded so far, successes and process failures alike.
    pub fn folded(&self) -> u64 {
        self.folded
    }

    /// Successes without a parsable size header.
    pub fn ungrouped(&self) -> u64 {
        self.ungrouped
    }

    pub fn mean(&self) -> Option<f64> {
        (self.successes > 0).then(|| self.sum as f64 / self.successes as f64)
    }

    pub fn ranking(&self) -> &[(i64, CaseId)] {
        &self.ranking
    }

    pub fn best(&self) -> Option<(i64, CaseId)> {
        self.ranking.last().copied()
    }

    pub fn worst(&self) -> Option<(i64, CaseId)> {
        self.ranking.first().copied()
    }

    /// Highest `k` scores, best first.
    pub fn top(&self, k: usize) -> Vec<(i64, CaseId)> {
        self.ranking.iter().rev().take(k).copied().collect()
    }

    /// Lowest `k` scores, worst first.
    pub fn bottom(&self, k: usize) -> Vec<(i64, CaseId)> {
        self.ranking.iter().take(k).copied().collect()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn grid(&self) -> &SizeGrid {
        &self.grid
    }

    pub fn failures(&self) -> &[(CaseId, ProcessFailure)] {
        &self.failures
    }
}
