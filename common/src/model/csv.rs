use serde::{Deserialize, Serialize};

/// An uploaded CSV file, parsed but not yet validated against any table.
///
/// The backend builds this from the multipart upload (`data_sources::csv::upload`)
/// and hands it to the validator, the previewer and the importer. It only lives
/// for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFile {
    /// The client-supplied file name, echoed back in reports.
    pub filename: String,
    /// Header cells in file order. Empty when the upload had no header line.
    pub headers: Vec<String>,
    /// Data records in file order.
    pub records: Vec<ImportRecord>,
}

/// A single data line of an [`ImportFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportRecord {
    /// The raw fields of a record that the CSV reader could decode.
    Fields(Vec<String>),
    /// A record the CSV reader rejected, with the reader's reason.
    Unreadable(String),
}

impl ImportFile {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
