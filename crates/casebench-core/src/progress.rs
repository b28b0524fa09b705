//! Progress reporting. The scheduler emits one event per completed case, in completion
//! order; the sink decides how to show it.

use crate::case::CaseId;
use std::io::Write;
use std::sync::Arc;

/// One progress update.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub case: CaseId,
    /// False when the case ended in a process failure.
    pub ok: bool,
}

/// Called by the scheduler each time a case completes. Must not block.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Symbol printed for the `done`-th completion: its 0-based count modulo 10.
#[must_use]
pub fn progress_symbol(done: usize) -> char {
    let digit = (done.saturating_sub(1) % 10) as u32;
    char::from_digit(digit, 10).unwrap_or('?')
}

/// Prints one digit per completed case to stderr and ends the line on the last one.
pub fn digit_sink() -> ProgressSink {
    Arc::new(|ev: ProgressEvent| {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "{}", progress_symbol(ev.done));
        if ev.done == ev.total {
            let _ = writeln!(err);
        }
        let _ = err.flush();
    })
}
