// Financial advice: recent transactions → a few short tips (display only)

use super::extraction::clean_json_string;
use super::{ContentRequest, GenerativeModel};
use crate::ledger::{Ledger, Transaction};
use anyhow::{Context, Result};
use serde_json::json;
use tracing::{error, info};

/// How many of the newest transactions the advisor sees
pub const ADVICE_WINDOW: usize = 10;

pub const FALLBACK_TIPS: [&str; 3] = [
    "Track your daily expenses closely.",
    "Try to save at least 20% of your income.",
    "Review your subscriptions and cancel unused ones.",
];

pub fn fallback_tips() -> Vec<String> {
    FALLBACK_TIPS.iter().map(|t| t.to_string()).collect()
}

/// JSON array of the newest transactions, as sent to the advisor
pub fn summarize_recent(transactions: &[Transaction]) -> String {
    let window = &transactions[..ADVICE_WINDOW.min(transactions.len())];
    serde_json::to_string(window).unwrap_or_else(|_| "[]".to_string())
}

fn advice_prompt(summary: &str) -> String {
    format!(
        "You are a financial advisor. Based on this transaction summary, give 3 short, \
         actionable, and specific financial tips in a JSON array of strings. Focus on saving \
         money and cutting unnecessary costs. The user uses Pounds (£) or Reais (R$). \
         Summary: {}",
        summary
    )
}

async fn request_tips(model: &dyn GenerativeModel, summary: &str) -> Result<Vec<String>> {
    let request = ContentRequest::text(advice_prompt(summary))
        .with_schema(json!({ "type": "ARRAY", "items": { "type": "STRING" } }));

    let reply = model.generate(request).await?;
    let tips: Vec<String> = serde_json::from_str(&clean_json_string(&reply))
        .context("Advice reply is not a JSON array of strings")?;
    Ok(tips)
}

/// Ask the model for tips. Any failure falls back to the static tips.
pub async fn get_financial_advice(model: &dyn GenerativeModel, summary: &str) -> Vec<String> {
    match request_tips(model, summary).await {
        Ok(tips) => {
            info!("Received {} tip(s) from {}", tips.len(), model.model_name());
            tips
        }
        Err(e) => {
            error!("Error getting advice: {:#}", e);
            fallback_tips()
        }
    }
}

/// Tips for the current ledger; an empty ledger asks nothing.
pub async fn advise_on(model: &dyn GenerativeModel, ledger: &Ledger) -> Vec<String> {
    if ledger.is_empty() {
        return Vec::new();
    }
    let summary = summarize_recent(ledger.transactions());
    get_financial_advice(model, &summary).await
}
