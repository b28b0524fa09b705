//! Exit codes for `casebench`. Part of the CLI contract; scripts branch on them.

pub const EXIT_SUCCESS: i32 = 0;
/// `--strict` and at least one case ended in a process failure.
pub const EXIT_CASE_FAILURES: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Worker task failure or lost outcome. Shares code 2 with configuration errors.
pub const EXIT_INTERNAL_ERROR: i32 = 2;
/// A scorer report broke the field contract; the run was aborted.
pub const EXIT_CONTRACT_VIOLATION: i32 = 3;
