use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request payload for creating or updating a row.
///
/// Field values arrive as strings, exactly like CSV fields, and are parsed
/// with the same per-column rules. Columns that are left out are stored as
/// `NULL`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowPayload {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}
