// 📊 Dashboard summary - what the dashboard cards, recent list and expense
// breakdown are built from

use crate::amount::format_money;
use crate::ledger::{CategoryTotal, Ledger, Totals, Transaction, TransactionType};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub currency_symbol: String,
    pub transaction_count: usize,
    #[serde(flatten)]
    pub totals: Totals,
    pub recent: Vec<Transaction>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

impl DashboardSummary {
    pub fn from_ledger(ledger: &Ledger, currency_symbol: &str, recent_count: usize) -> Self {
        DashboardSummary {
            currency_symbol: currency_symbol.to_string(),
            transaction_count: ledger.len(),
            totals: ledger.totals(),
            recent: ledger.recent(recent_count).to_vec(),
            expenses_by_category: ledger.expenses_by_category(),
        }
    }

    /// Plain-text rendering for the terminal
    pub fn render_text(&self) -> String {
        let money = |v: f64| format_money(&self.currency_symbol, v);
        let mut out = String::new();

        let _ = writeln!(out, "💰 Total income:   {}", money(self.totals.total_income));
        let _ = writeln!(out, "💸 Total expenses: {}", money(self.totals.total_expenses));
        let _ = writeln!(out, "🏦 Total savings:  {}", money(self.totals.total_savings));
        let _ = writeln!(out, "📈 Net balance:    {}", money(self.totals.net_balance));

        let _ = writeln!(out, "\n🧾 Recent transactions ({} total):", self.transaction_count);
        if self.recent.is_empty() {
            let _ = writeln!(out, "   (none)");
        }
        for tx in &self.recent {
            let sign = if tx.kind == TransactionType::Income { '+' } else { '-' };
            let _ = writeln!(
                out,
                "   {:<10}  {:<30}  {:<14}  {}{}  [{}]",
                tx.date,
                truncate(&tx.description, 30),
                truncate(&tx.category, 14),
                sign,
                money(tx.amount),
                tx.id
            );
        }

        if !self.expenses_by_category.is_empty() {
            let _ = writeln!(out, "\n🗂️  Expenses by category:");
            for entry in &self.expenses_by_category {
                let _ = writeln!(out, "   {:<20} {}", truncate(&entry.category, 20), money(entry.total));
            }
        }

        out
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
