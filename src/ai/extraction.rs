// Statement extraction: text / PDF / image → candidate transactions

use super::{ContentRequest, GenerativeModel, Part};
use crate::ledger::NewTransaction;
use anyhow::{Context, Result};
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// Extraction instructions sent with every document. Treated as an opaque
/// constant; the ledger normalizes whatever comes back anyway.
pub const EXTRACTION_PROMPT: &str = r#"
  Act as a financial data extraction engine. Analyze the provided bank statement, receipt, or spreadsheet data.
  Extract individual financial transactions into a JSON array.

  CRITICAL RULES:
  1. **Values**: ALWAYS return the 'amount' as a POSITIVE number (Absolute Value). Do not use negative signs.
  2. **Ignore Totals**: IGNORE any line that represents a running balance, "Total", "Opening Balance", "Closing Balance", "Saldo Anterior", "Saldo Atual", "Visão Geral". ONLY extract specific transaction events.
  3. **Dates**: Convert dates to YYYY-MM-DD.
  4. **Currency**:
     - Supports British Pounds (£), Brazilian Real (R$), Dollars ($).
     - Convert "1.200,50" (BR) -> 1200.50.
     - Convert "1,200.50" (UK/US) -> 1200.50.
     - Return ONLY the number.
  5. **Type Detection**:
     - **EXPENSE**: Outgoing money, purchases, debits, "D", red values, "Payment to", "Compra", "Saída".
     - **INCOME**: Incoming money, salary, credits, "C", green values, "Deposit", "Entrada", "Salário".
     - **SAVINGS**: Transfers to investment accounts, "Poupança", "ISA", "Vault", "CDB", "Reserva".
  6. **Category**: Infer a short 1-2 word category (e.g. 'Supermarket', 'Transport', 'Utilities').
"#;

/// Response schema: array of {date, description, amount, category, type}
pub fn transaction_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": { "type": "STRING", "description": "Date in YYYY-MM-DD format" },
                "description": { "type": "STRING" },
                "amount": { "type": "NUMBER", "description": "Absolute positive value only" },
                "category": { "type": "STRING" },
                "type": { "type": "STRING", "enum": ["INCOME", "EXPENSE", "SAVINGS"] }
            },
            "required": ["date", "description", "amount", "category", "type"]
        }
    })
}

/// Strip Markdown code fences some models wrap JSON in.
pub fn clean_json_string(raw: &str) -> String {
    if raw.is_empty() {
        return "[]".to_string();
    }

    let mut cleaned = raw;
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.trim_end().strip_suffix("```") {
        cleaned = rest.trim_end();
    }

    cleaned.to_string()
}

/// Parse a model reply into records. Records that don't fit the shape are
/// skipped; a reply that isn't a JSON array at all is an error.
pub fn parse_records(reply: &str) -> Result<Vec<NewTransaction>> {
    let cleaned = clean_json_string(reply);
    let values: Vec<Value> =
        serde_json::from_str(&cleaned).context("Model reply is not a JSON array")?;

    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<NewTransaction>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping extracted record {}: {}", index, e),
        }
    }
    Ok(records)
}

async fn run_extraction(
    model: &dyn GenerativeModel,
    request: ContentRequest,
) -> Result<Vec<NewTransaction>> {
    let reply = model.generate(request.with_schema(transaction_schema())).await?;
    let records = parse_records(&reply)?;
    info!("{} extracted {} transaction(s)", model.model_name(), records.len());
    Ok(records)
}

/// Extract transactions from pasted/delimited text. Failures → empty list.
pub async fn extract_from_text(model: &dyn GenerativeModel, text: &str) -> Vec<NewTransaction> {
    let prompt = format!("{}\n\nDATA TO ANALYZE:\n{}", EXTRACTION_PROMPT, text);

    match run_extraction(model, ContentRequest::text(prompt)).await {
        Ok(records) => records,
        Err(e) => {
            error!("Error parsing text: {:#}", e);
            Vec::new()
        }
    }
}

/// Extract transactions from a PDF or image. Failures → empty list.
pub async fn extract_from_media(
    model: &dyn GenerativeModel,
    bytes: &[u8],
    mime_type: &str,
) -> Vec<NewTransaction> {
    let request = ContentRequest {
        parts: vec![
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
            Part::Text(EXTRACTION_PROMPT.to_string()),
        ],
        response_schema: None,
    };

    match run_extraction(model, request).await {
        Ok(records) => records,
        Err(e) => {
            error!("Error extracting transactions: {:#}", e);
            Vec::new()
        }
    }
}
