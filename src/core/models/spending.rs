use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: Decimal,
}

/// What one user owes across all their trips, by category and by month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub user_id: u64,
    pub total: Decimal,
    pub by_category: Vec<CategorySpending>,
    pub by_month: BTreeMap<String, Decimal>,
}
