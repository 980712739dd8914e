// Finance Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod amount;
pub mod ledger;
pub mod ai;       // Generative AI collaborator: extraction + advice
pub mod import;   // File / text import pipeline
pub mod report;   // Dashboard summary
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use amount::{normalize_amount, parse_amount, round2, format_money, AmountError};
pub use ledger::{
    Ledger, Transaction, NewTransaction, AmountInput, TransactionType,
    Totals, CategoryTotal, TransferError, UnknownTransactionType,
};
pub use ai::{
    GenerativeModel, GeminiClient, ContentRequest, Part,
    extract_from_text, extract_from_media, get_financial_advice, advise_on, fallback_tips,
};
pub use import::{
    Importer, DocumentKind, ImportError,
    detect_document_kind, spreadsheet_to_text, apply_records,
};
pub use report::DashboardSummary;
pub use config::{Config, AiConfig, DisplayConfig, ServerConfig, Overrides};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
