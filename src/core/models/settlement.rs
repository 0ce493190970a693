use super::participant::ParticipantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

/// A cap the solver ran into. The plan is still usable, just incomplete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bound", rename_all = "snake_case")]
pub enum SettlementBound {
    Iterations { limit: usize },
    Transfers { limit: usize, omitted: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub transfers: Vec<Transfer>,
    pub bounds_exceeded: Vec<SettlementBound>,
}

impl SettlementPlan {
    pub fn is_complete(&self) -> bool {
        self.bounds_exceeded.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub participant: ParticipantId,
    pub participant_display_name: String,
    pub total_paid: Decimal,
    pub total_share: Decimal,
    pub balance: Decimal,
}

/// Balance table plus transfer plan, the payload handed to report renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub trip_id: String,
    pub trip_name: String,
    pub total_expenses: Decimal,
    pub balances: Vec<BalanceRow>,
    pub plan: SettlementPlan,
}
