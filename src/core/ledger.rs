//! Ledger records: transactions, summaries and raw snapshots

use crate::core::error::{ConversionError, SourceError};
use crate::core::money::MoneyAmount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub amount: MoneyAmount,
}

impl Transaction {
    /// Derives a copy of this transaction carrying `amount` instead.
    pub fn with_amount(&self, amount: MoneyAmount) -> Transaction {
        Transaction {
            amount,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub income: MoneyAmount,
    pub expense: MoneyAmount,
    pub balance: MoneyAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: MoneyAmount,
    pub total_expense: MoneyAmount,
    pub balance: MoneyAmount,
    pub monthly: Vec<MonthlyTotals>,
    pub income_by_category: BTreeMap<String, MoneyAmount>,
    pub expense_by_category: BTreeMap<String, MoneyAmount>,
}

impl FinancialSummary {
    pub fn empty(currency: &str) -> Self {
        Self {
            total_income: MoneyAmount::zero(currency),
            total_expense: MoneyAmount::zero(currency),
            balance: MoneyAmount::zero(currency),
            monthly: Vec::new(),
            income_by_category: BTreeMap::new(),
            expense_by_category: BTreeMap::new(),
        }
    }

    /// Aggregates `transactions`, all of which must be denominated in
    /// `currency`.
    pub fn from_transactions(
        transactions: &[Transaction],
        currency: &str,
    ) -> Result<Self, ConversionError> {
        let mut summary = Self::empty(currency);
        let mut months: BTreeMap<String, MonthlyTotals> = BTreeMap::new();

        for tx in transactions {
            let month = tx.date.format("%Y-%m").to_string();
            let totals = months.entry(month.clone()).or_insert_with(|| MonthlyTotals {
                month,
                income: MoneyAmount::zero(currency),
                expense: MoneyAmount::zero(currency),
                balance: MoneyAmount::zero(currency),
            });

            let by_category = match tx.kind {
                TransactionKind::Income => {
                    summary.total_income = summary.total_income.checked_add(&tx.amount)?;
                    totals.income = totals.income.checked_add(&tx.amount)?;
                    &mut summary.income_by_category
                }
                TransactionKind::Expense => {
                    summary.total_expense = summary.total_expense.checked_add(&tx.amount)?;
                    totals.expense = totals.expense.checked_add(&tx.amount)?;
                    &mut summary.expense_by_category
                }
            };
            let slot = by_category
                .entry(tx.category.clone())
                .or_insert_with(|| MoneyAmount::zero(currency));
            *slot = slot.checked_add(&tx.amount)?;

            totals.balance = totals.income.checked_sub(&totals.expense)?;
        }

        summary.balance = summary.total_income.checked_sub(&summary.total_expense)?;
        summary.monthly = months.into_values().collect();
        Ok(summary)
    }

    /// The currency of the headline figures.
    pub fn currency(&self) -> &str {
        &self.balance.currency
    }

    /// Every monetary field of the summary.
    pub fn amounts(&self) -> impl Iterator<Item = &MoneyAmount> {
        [&self.total_income, &self.total_expense, &self.balance]
            .into_iter()
            .chain(
                self.monthly
                    .iter()
                    .flat_map(|m| [&m.income, &m.expense, &m.balance]),
            )
            .chain(self.income_by_category.values())
            .chain(self.expense_by_category.values())
    }

    /// Derives a new summary with every monetary field passed through `f`.
    pub fn try_map_amounts<E>(
        &self,
        mut f: impl FnMut(&MoneyAmount) -> Result<MoneyAmount, E>,
    ) -> Result<Self, E> {
        let mut map_categories = |categories: &BTreeMap<String, MoneyAmount>| {
            categories
                .iter()
                .map(|(name, amount)| Ok::<_, E>((name.clone(), f(amount)?)))
                .collect::<Result<BTreeMap<_, _>, E>>()
        };
        let income_by_category = map_categories(&self.income_by_category)?;
        let expense_by_category = map_categories(&self.expense_by_category)?;

        let monthly = self
            .monthly
            .iter()
            .map(|m| {
                Ok::<_, E>(MonthlyTotals {
                    month: m.month.clone(),
                    income: f(&m.income)?,
                    expense: f(&m.expense)?,
                    balance: f(&m.balance)?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Self {
            total_income: f(&self.total_income)?,
            total_expense: f(&self.total_expense)?,
            balance: f(&self.balance)?,
            monthly,
            income_by_category,
            expense_by_category,
        })
    }
}

fn hash_amount<H: Hasher>(amount: &MoneyAmount, state: &mut H) {
    state.write_u64(amount.value.to_bits());
    amount.currency.hash(state);
}

/// One snapshot of what the raw financial source currently holds, always in
/// the ledger currency.
#[derive(Debug, Clone)]
pub struct RawFinancialData {
    pub transactions: Arc<Vec<Transaction>>,
    pub summary: Arc<FinancialSummary>,
    pub loading: bool,
    pub error: Option<SourceError>,
}

impl RawFinancialData {
    /// Empty snapshot for a source that has not delivered data yet.
    pub fn pending(currency: &str) -> Self {
        Self {
            transactions: Arc::new(Vec::new()),
            summary: Arc::new(FinancialSummary::empty(currency)),
            loading: true,
            error: None,
        }
    }

    pub fn loaded(transactions: Vec<Transaction>, currency: &str) -> Result<Self, ConversionError> {
        let summary = FinancialSummary::from_transactions(&transactions, currency)?;
        Ok(Self {
            transactions: Arc::new(transactions),
            summary: Arc::new(summary),
            loading: false,
            error: None,
        })
    }

    /// Cheap content fingerprint over every transaction field and the
    /// summary amounts. Snapshots with equal content share a fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.transactions.len().hash(&mut hasher);
        for tx in self.transactions.iter() {
            tx.id.hash(&mut hasher);
            tx.date.hash(&mut hasher);
            tx.kind.hash(&mut hasher);
            tx.category.hash(&mut hasher);
            tx.description.hash(&mut hasher);
            hash_amount(&tx.amount, &mut hasher);
        }
        for amount in self.summary.amounts() {
            hash_amount(amount, &mut hasher);
        }
        hasher.finish()
    }
}
