use crate::errors::{ParseFailure, ProcessFailure};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Case identifier. Renders zero-padded to `width` digits (`0042`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseId {
    pub index: u32,
    pub width: usize,
}

impl CaseId {
    pub fn new(index: u32, width: usize) -> Self {
        Self { index, width }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.index, width = self.width)
    }
}

impl Serialize for CaseId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// One trial: where its input lives and where the solver output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSpec {
    pub id: CaseId,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directory for ephemeral per-case capture files.
    pub scratch_dir: PathBuf,
}

/// Directory layout of the input corpus and the output artifacts.
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub id_width: usize,
}

impl CorpusLayout {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, id_width: usize) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            id_width,
        }
    }

    pub fn case(&self, index: u32) -> CaseSpec {
        let id = CaseId::new(index, self.id_width);
        let file = format!("{id}.txt");
        CaseSpec {
            id,
            input: self.input_dir.join(&file),
            output: self.output_dir.join(&file),
            scratch_dir: self.output_dir.clone(),
        }
    }

    /// The contiguous case range `[0, count)`.
    pub fn cases(&self, count: u32) -> Vec<CaseSpec> {
        (0..count).map(|i| self.case(i)).collect()
    }
}

/// `(n, m)` from the first line of a case input. Only used for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeParameters {
    pub n: u32,
    pub m: u32,
}

impl SizeParameters {
    pub fn from_first_line(text: &str) -> Option<Self> {
        let mut fields = text.lines().next()?.split_whitespace();
        let n = fields.next()?.parse().ok()?;
        let m = fields.next()?.parse().ok()?;
        Some(Self { n, m })
    }

    pub async fn read_from(path: &Path) -> std::io::Result<Option<Self>> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_first_line(&text))
    }
}

/// Result of running one case. Produced exactly once per [`CaseSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    Success {
        case: CaseId,
        score: i64,
        size: Option<SizeParameters>,
    },
    ParseFailure {
        case: CaseId,
        failure: ParseFailure,
    },
    ProcessFailure {
        case: CaseId,
        failure: ProcessFailure,
    },
}

impl TrialOutcome {
    pub fn case(&self) -> CaseId {
        match self {
            Self::Success { case, .. }
            | Self::ParseFailure { case, .. }
            | Self::ProcessFailure { case, .. } => *case,
        }
    }

    /// A parse failure breaks the scorer contract and aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ParseFailure { .. })
    }
}
