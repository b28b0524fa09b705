//! Scorer report parsing.
//!
//! The report is whitespace-delimited; the score is the third token. Two leading tokens
//! carry other telemetry and are ignored.

use crate::case::{CaseId, TrialOutcome};
use crate::errors::{ParseFailure, ParseFailureKind, ProcessFailure};
use crate::runner::RawTrial;

/// Zero-based position of the score token.
pub const SCORE_FIELD: usize = 2;

pub fn parse_score(report: &str) -> Result<i64, ParseFailure> {
    let token = report
        .split_whitespace()
        .nth(SCORE_FIELD)
        .ok_or_else(|| ParseFailure::new(ParseFailureKind::MissingField, report))?;
    token
        .parse::<i64>()
        .map_err(|_| ParseFailure::new(ParseFailureKind::NonNumeric, report))
}

/// Turns a runner result into the outcome the aggregator sees.
pub fn classify(case: CaseId, result: Result<RawTrial, ProcessFailure>) -> TrialOutcome {
    match result {
        Err(failure) => TrialOutcome::ProcessFailure { case, failure },
        Ok(raw) => match parse_score(&raw.report) {
            Ok(score) => TrialOutcome::Success {
                case,
                score,
                size: raw.size,
            },
            Err(failure) => TrialOutcome::ParseFailure { case, failure },
        },
    }
}
