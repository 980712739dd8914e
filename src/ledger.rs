// 📒 Ledger Aggregator
// In-memory session ledger: newest-first transactions + derived totals

use crate::amount::{normalize_amount, round2};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// CORE TYPES
// ============================================================================

/// TransactionType - the sign of a transaction lives here, never in `amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    #[serde(alias = "income", alias = "Income")]
    Income,
    #[serde(alias = "expense", alias = "Expense")]
    Expense,
    #[serde(alias = "savings", alias = "Savings")]
    Savings,
}

impl TransactionType {
    /// Wire/display code ("INCOME", "EXPENSE", "SAVINGS")
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Savings => "SAVINGS",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction type {0:?} (expected INCOME, EXPENSE or SAVINGS)")]
pub struct UnknownTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            "SAVINGS" => Ok(TransactionType::Savings),
            _ => Err(UnknownTransactionType(s.to_string())),
        }
    }
}

/// Transaction - immutable once it is in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: String, // YYYY-MM-DD, not validated
    pub description: String,
    pub amount: f64, // always >= 0
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Amount as it arrives from a form, a pasted statement or the AI service.
///
/// Anything that is neither a number nor a string (`null`, `true`, an
/// object) is kept as `Other` so the record still gets added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl AmountInput {
    /// Numbers go through the same string normalization as text, so a
    /// negative or NaN number ends up as its absolute value or zero.
    pub fn normalize(&self) -> f64 {
        match self {
            AmountInput::Number(n) => normalize_amount(&n.to_string()),
            AmountInput::Text(s) => normalize_amount(s),
            AmountInput::Other(_) => 0.0,
        }
    }
}

impl Default for AmountInput {
    fn default() -> Self {
        AmountInput::Number(0.0)
    }
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        AmountInput::Number(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        AmountInput::Text(value)
    }
}

/// NewTransaction - everything but the id, accepted as given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: AmountInput,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl NewTransaction {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<AmountInput>,
        category: impl Into<String>,
        kind: TransactionType,
    ) -> Self {
        NewTransaction {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
            category: category.into(),
            kind,
        }
    }
}

/// Totals - derived view, each bucket rounded after summation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_savings: f64,
    pub net_balance: f64,
}

impl Totals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut income = 0.0;
        let mut expenses = 0.0;
        let mut savings = 0.0;

        for tx in transactions {
            let value = if tx.amount.is_nan() { 0.0 } else { tx.amount.abs() };

            match tx.kind {
                TransactionType::Income => income += value,
                TransactionType::Expense => expenses += value,
                TransactionType::Savings => savings += value,
            }
        }

        Totals {
            total_income: round2(income),
            total_expenses: round2(expenses),
            total_savings: round2(savings),
            net_balance: round2(income - expenses - savings),
        }
    }
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    #[error("transfer amount must be greater than zero (got {0})")]
    NonPositiveAmount(f64),

    #[error("insufficient funds: requested {requested:.2}, liquid balance is {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },
}

pub const SAVINGS_TRANSFER_DESCRIPTION: &str = "Transfer to Savings";
pub const SAVINGS_CATEGORY: &str = "Savings";

// ============================================================================
// LEDGER
// ============================================================================

/// Ledger - owned by the composition root, one per session.
///
/// Totals are recomputed after every mutation and cached until the next one.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    totals: Totals,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from transactions already in newest-first order
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let totals = Totals::from_transactions(&transactions);
        Ledger {
            transactions,
            totals,
        }
    }

    /// Assign an id, normalize the amount and put the transaction first.
    pub fn add_transaction(&mut self, input: NewTransaction) -> Transaction {
        let tx = Transaction {
            id: new_transaction_id(),
            date: input.date,
            description: input.description,
            amount: input.amount.normalize(),
            category: input.category,
            kind: input.kind,
        };

        debug!(id = %tx.id, kind = %tx.kind, amount = tx.amount, "transaction added");

        self.transactions.insert(0, tx.clone());
        self.recompute();
        tx
    }

    /// Remove by id. Unknown ids are ignored; returns whether anything went.
    pub fn remove_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|tx| tx.id != id);

        let removed = self.transactions.len() != before;
        if removed {
            debug!(id, "transaction removed");
            self.recompute();
        }
        removed
    }

    /// Move `amount` out of the liquid balance into savings.
    ///
    /// Returns `false` without touching the ledger when the amount is not
    /// positive or exceeds the liquid balance.
    pub fn transfer_to_savings(&mut self, amount: f64) -> bool {
        self.try_transfer_to_savings(amount).is_ok()
    }

    /// Typed variant of [`Ledger::transfer_to_savings`].
    pub fn try_transfer_to_savings(&mut self, amount: f64) -> Result<Transaction, TransferError> {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        self.transfer_to_savings_on(amount, today)
    }

    fn transfer_to_savings_on(
        &mut self,
        amount: f64,
        date: String,
    ) -> Result<Transaction, TransferError> {
        // NaN fails here too
        if !(amount > 0.0) {
            return Err(TransferError::NonPositiveAmount(amount));
        }

        let liquid = self.liquid_balance();
        if !(liquid >= amount) {
            info!(requested = amount, available = liquid, "savings transfer refused");
            return Err(TransferError::InsufficientFunds {
                requested: amount,
                available: liquid,
            });
        }

        let tx = self.add_transaction(NewTransaction::new(
            date,
            SAVINGS_TRANSFER_DESCRIPTION,
            amount,
            SAVINGS_CATEGORY,
            TransactionType::Savings,
        ));
        info!(amount, "moved to savings");
        Ok(tx)
    }

    /// Income - expenses - savings, recomputed from the transactions.
    pub fn liquid_balance(&self) -> f64 {
        Totals::from_transactions(&self.transactions).net_balance
    }

    fn recompute(&mut self) {
        self.totals = Totals::from_transactions(&self.transactions);
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// The `n` most recently added transactions
    pub fn recent(&self, n: usize) -> &[Transaction] {
        &self.transactions[..n.min(self.transactions.len())]
    }

    pub fn filter_by_type(&self, kind: TransactionType) -> Vec<&Transaction> {
        self.transactions.iter().filter(|tx| tx.kind == kind).collect()
    }

    /// Expense totals per category, in the order categories first appear
    pub fn expenses_by_category(&self) -> Vec<CategoryTotal> {
        let mut result: Vec<CategoryTotal> = Vec::new();

        for tx in self.filter_by_type(TransactionType::Expense) {
            match result.iter_mut().find(|c| c.category == tx.category) {
                Some(existing) => existing.total += tx.amount,
                None => result.push(CategoryTotal {
                    category: tx.category.clone(),
                    total: tx.amount,
                }),
            }
        }

        for entry in &mut result {
            entry.total = round2(entry.total);
        }
        result
    }
}

fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================================================
// TESTS
// ============================================================================
