// 📥 Import Pipeline
// File / pasted text → AI extraction → ledger.add_transaction, one record at a time

use crate::ai::{extract_from_media, extract_from_text, GenerativeModel};
use crate::ledger::{Ledger, NewTransaction, Transaction};
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

// ============================================================================
// CORE TYPES
// ============================================================================

/// DocumentKind - which extraction path a file takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Tabular file; first sheet becomes delimited text
    Spreadsheet,
    /// Sent to the model as inline data with this MIME type
    Media(&'static str),
    /// Read as UTF-8 and sent as pasted text
    Text,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("workbook has no sheets: {0}")]
    EmptyWorkbook(String),
}

// ============================================================================
// DETECTION
// ============================================================================

/// Pick the extraction path from the file extension.
pub fn detect_document_kind(path: &Path) -> Result<DocumentKind, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let kind = match extension.as_str() {
        "csv" | "tsv" | "xlsx" | "xls" => DocumentKind::Spreadsheet,
        "pdf" => DocumentKind::Media("application/pdf"),
        "png" => DocumentKind::Media("image/png"),
        "jpg" | "jpeg" => DocumentKind::Media("image/jpeg"),
        "webp" => DocumentKind::Media("image/webp"),
        "heic" => DocumentKind::Media("image/heic"),
        "heif" => DocumentKind::Media("image/heif"),
        "txt" | "md" => DocumentKind::Text,
        _ => return Err(ImportError::UnsupportedFormat(path.display().to_string())),
    };

    Ok(kind)
}

// ============================================================================
// SPREADSHEET READER
// ============================================================================

/// Convert the first sheet of a tabular file into comma-delimited text.
pub fn spreadsheet_to_text(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());

    match extension.as_str() {
        "csv" => copy_delimited(path, b',', &mut writer)?,
        "tsv" => copy_delimited(path, b'\t', &mut writer)?,
        "xlsx" | "xls" => copy_first_sheet(path, &mut writer)?,
        _ => return Err(ImportError::UnsupportedFormat(path.display().to_string()).into()),
    }

    let bytes = writer.into_inner().context("Failed to flush delimited text")?;
    String::from_utf8(bytes).context("Spreadsheet is not valid UTF-8")
}

fn copy_delimited(path: &Path, delimiter: u8, writer: &mut csv::Writer<Vec<u8>>) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse line {} in {}", line_num + 1, path.display())
        })?;
        writer.write_record(&record)?;
    }
    Ok(())
}

/// First worksheet of an .xlsx/.xls workbook, one CSV row per sheet row.
fn copy_first_sheet(path: &Path, writer: &mut csv::Writer<Vec<u8>>) -> Result<()> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::EmptyWorkbook(path.display().to_string()))?
        .with_context(|| format!("Failed to read first sheet of {}", path.display()))?;

    for row in range.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// IMPORTER
// ============================================================================

/// Add every extracted record to the ledger, in the order received.
pub fn apply_records(ledger: &mut Ledger, records: Vec<NewTransaction>) -> Vec<Transaction> {
    records
        .into_iter()
        .map(|record| ledger.add_transaction(record))
        .collect()
}

/// Importer - drives extraction for files and pasted text.
///
/// Extraction never holds the ledger; callers apply the records once the
/// model has answered.
#[derive(Clone)]
pub struct Importer {
    model: Arc<dyn GenerativeModel>,
}

impl Importer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Importer { model }
    }

    pub async fn extract_text(&self, text: &str) -> Vec<NewTransaction> {
        extract_from_text(self.model.as_ref(), text).await
    }

    /// Run the matching extraction path. Any failure is logged and yields
    /// no records.
    pub async fn extract_file(&self, path: &Path) -> Vec<NewTransaction> {
        match self.try_extract_file(path).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error importing {}: {:#}", path.display(), e);
                Vec::new()
            }
        }
    }

    async fn try_extract_file(&self, path: &Path) -> Result<Vec<NewTransaction>> {
        let kind = detect_document_kind(path)?;
        info!("Importing {} as {:?}", path.display(), kind);

        let records = match kind {
            DocumentKind::Spreadsheet => {
                let text = spreadsheet_to_text(path)?;
                self.extract_text(&text).await
            }
            DocumentKind::Media(mime_type) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read file: {}", path.display()))?;
                extract_from_media(self.model.as_ref(), &bytes, mime_type).await
            }
            DocumentKind::Text => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read file: {}", path.display()))?;
                self.extract_text(&text).await
            }
        };

        Ok(records)
    }

    /// Extract an uploaded file. The bytes are spooled to a temporary file
    /// carrying the upload's extension, then take the same path as a file
    /// on disk. Failures are logged and yield no records.
    pub async fn extract_upload(&self, file_name: &str, bytes: &[u8]) -> Vec<NewTransaction> {
        match self.try_extract_upload(file_name, bytes).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error importing upload {}: {:#}", file_name, e);
                Vec::new()
            }
        }
    }

    async fn try_extract_upload(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<NewTransaction>> {
        detect_document_kind(Path::new(file_name))?;
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", extension))
            .tempfile()
            .context("Failed to create temporary file")?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .context("Failed to write temporary file")?;

        self.try_extract_file(file.path()).await
    }

    /// Extract a file and add its records to `ledger`.
    pub async fn import_file(&self, ledger: &mut Ledger, path: &Path) -> Vec<Transaction> {
        let records = self.extract_file(path).await;
        apply_records(ledger, records)
    }

    /// Extract pasted text and add its records to `ledger`.
    pub async fn import_text(&self, ledger: &mut Ledger, text: &str) -> Vec<Transaction> {
        let records = self.extract_text(text).await;
        apply_records(ledger, records)
    }
}

// ============================================================================
// TESTS
// ============================================================================
