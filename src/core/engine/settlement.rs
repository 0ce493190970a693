//! Reduces a balance vector to a short list of transfers.
//!
//! Greedy: the largest creditor is always paid by the largest debtor. Ties go to
//! the participant that sorts first, so the same balances give the same plan.
//! Not optimal in transfer count, but bounded and deterministic.

use crate::constants::{DEFAULT_SETTLEMENT_MAX_ITERATIONS, DEFAULT_SETTLEMENT_MAX_TRANSFERS};
use crate::core::models::participant::ParticipantId;
use crate::core::models::settlement::{SettlementBound, SettlementPlan, Transfer};
use crate::core::money::{is_settled, round_money};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementLimits {
    pub max_iterations: usize,
    pub max_transfers: usize,
}

impl Default for SettlementLimits {
    fn default() -> Self {
        SettlementLimits {
            max_iterations: DEFAULT_SETTLEMENT_MAX_ITERATIONS,
            max_transfers: DEFAULT_SETTLEMENT_MAX_TRANSFERS,
        }
    }
}

pub fn settle(balances: &BTreeMap<ParticipantId, Decimal>, limits: SettlementLimits) -> SettlementPlan {
    let mut open: BTreeMap<ParticipantId, Decimal> = balances
        .iter()
        .filter(|(_, b)| !is_settled(**b))
        .map(|(p, b)| (p.clone(), *b))
        .collect();

    let mut plan = SettlementPlan::default();
    let mut iterations = 0;

    while !open.is_empty() {
        if iterations >= limits.max_iterations {
            warn!(
                "Settlement stopped after {} iterations with {} balances open",
                iterations,
                open.len()
            );
            plan.bounds_exceeded.push(SettlementBound::Iterations {
                limit: limits.max_iterations,
            });
            break;
        }
        iterations += 1;

        let Some((creditor, credit)) = extreme(&open, |candidate, best| candidate > best) else {
            break;
        };
        let Some((debtor, debt)) = extreme(&open, |candidate, best| candidate < best) else {
            break;
        };
        if is_settled(credit) || is_settled(debt) {
            break;
        }

        let amount = round_money(credit.min(-debt));
        if amount <= Decimal::ZERO {
            break;
        }

        debug!("Transfer {} from {} to {}", amount, debtor, creditor);
        if let Some(b) = open.get_mut(&creditor) {
            *b -= amount;
        }
        if let Some(b) = open.get_mut(&debtor) {
            *b += amount;
        }
        plan.transfers.push(Transfer {
            from: debtor,
            to: creditor,
            amount,
        });
        open.retain(|_, b| !is_settled(*b));
    }

    if plan.transfers.len() > limits.max_transfers {
        let omitted = plan.transfers.len() - limits.max_transfers;
        warn!(
            "Settlement plan truncated to {} transfers, {} omitted",
            limits.max_transfers, omitted
        );
        plan.transfers.truncate(limits.max_transfers);
        plan.bounds_exceeded.push(SettlementBound::Transfers {
            limit: limits.max_transfers,
            omitted,
        });
    }
    plan
}

/// First entry, in key order, that no later entry beats.
fn extreme(
    balances: &BTreeMap<ParticipantId, Decimal>,
    beats: impl Fn(Decimal, Decimal) -> bool,
) -> Option<(ParticipantId, Decimal)> {
    let mut best: Option<(&ParticipantId, Decimal)> = None;
    for (participant, &balance) in balances {
        match best {
            Some((_, current)) if !beats(balance, current) => {}
            _ => best = Some((participant, balance)),
        }
    }
    best.map(|(p, b)| (p.clone(), b))
}
