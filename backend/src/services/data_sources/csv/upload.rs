use crate::error::{AdminError, Result};
use actix_multipart::Multipart;
use common::model::csv::{ImportFile, ImportRecord};
use csv::{ReaderBuilder, Trim};
use futures_util::StreamExt;
use md5::Context;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A CSV file received through a multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Hex MD5 of the uploaded bytes.
    pub md5: String,
}

/// Reads the `file` field of a multipart upload into memory.
///
/// The file name must end with `.csv` and the content must not exceed
/// `max_bytes`. Other fields are ignored.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload> {
    let mut upload: Option<Upload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AdminError::Upload(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();

                if !filename.to_ascii_lowercase().ends_with(".csv") {
                    return Err(AdminError::Upload("The file must end with .csv".into()));
                }

                let mut md5_hasher = Context::new();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| AdminError::Upload(e.to_string()))?;
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(AdminError::Upload(format!(
                            "{} is larger than the {} byte limit",
                            filename, max_bytes
                        )));
                    }
                    md5_hasher.consume(&chunk);
                    bytes.extend_from_slice(&chunk);
                }

                upload = Some(Upload {
                    filename,
                    bytes,
                    md5: format!("{:x}", md5_hasher.finalize()),
                });
            }
            _ => {}
        }
    }

    upload.ok_or_else(|| AdminError::Upload("Missing file".into()))
}

/// Parses uploaded bytes into an [`ImportFile`].
///
/// Header cells are trimmed; data fields are kept verbatim. Records the CSV
/// reader cannot decode are kept as [`ImportRecord::Unreadable`] so they show
/// up as failed rows instead of aborting the whole file. Only an unreadable
/// header fails the parse.
pub fn parse_import_file(filename: &str, bytes: &[u8]) -> Result<ImportFile> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AdminError::Upload(format!("CSV header of {} is unreadable: {}", filename, e)))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let records = reader
        .records()
        .map(|result| match result {
            Ok(record) => ImportRecord::Fields(record.iter().map(str::to_string).collect()),
            Err(e) => ImportRecord::Unreadable(e.to_string()),
        })
        .collect();

    Ok(ImportFile {
        filename: filename.to_string(),
        headers,
        records,
    })
}
