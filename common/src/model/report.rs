use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single CSV row during an import or a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    /// The row was (or, in a preview, would be) written.
    Done,
    /// The row was skipped. Contains a reason the user can act on.
    Failed(String),
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutcome::Done => f.write_str("Done"),
            RowOutcome::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// The processing result of one CSV data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowReport {
    /// 1-based position of the row in the file, header excluded.
    pub row_index: usize,
    /// The raw fields as they appeared in the file.
    pub values: Vec<String>,
    pub outcome: RowOutcome,
}

/// Overall verdict of an import or preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportOutcome {
    /// The header matched the table schema; see the per-row outcomes.
    Accepted,
    /// The header did not match. No row was evaluated or written.
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Report returned by both the importer and the previewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub table: String,
    pub filename: String,
    pub outcome: ImportOutcome,
    /// One entry per data row, in file order. Empty on a schema mismatch.
    pub rows: Vec<RowReport>,
    /// `true` when rows were written to storage, `false` for previews and
    /// rejected files.
    pub committed: bool,
    /// A user-facing summary line.
    pub message: String,
}

impl ImportReport {
    pub fn schema_mismatch(
        table: impl Into<String>,
        filename: impl Into<String>,
        expected: Vec<String>,
        actual: Vec<String>,
    ) -> Self {
        let filename = filename.into();
        let message = format!(
            "Please check the columns in {}: expected [{}], found [{}]",
            filename,
            expected.join(", "),
            actual.join(", ")
        );
        Self {
            table: table.into(),
            filename,
            outcome: ImportOutcome::SchemaMismatch { expected, actual },
            rows: Vec::new(),
            committed: false,
            message,
        }
    }

    pub fn accepted(
        table: impl Into<String>,
        filename: impl Into<String>,
        rows: Vec<RowReport>,
        committed: bool,
    ) -> Self {
        let done = rows.iter().filter(|r| r.outcome == RowOutcome::Done).count();
        let failed = rows.len() - done;
        let verb = if committed { "Imported" } else { "Would import" };
        let message = format!("{} {} row(s), {} failed", verb, done, failed);
        Self {
            table: table.into(),
            filename: filename.into(),
            outcome: ImportOutcome::Accepted,
            rows,
            committed,
            message,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == ImportOutcome::Accepted
    }

    pub fn done_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome == RowOutcome::Done)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.len() - self.done_count()
    }
}
