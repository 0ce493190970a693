use super::participant::{ParticipantId, Payer};
use crate::core::engine::split::{self, SplitEvent, SplitRequest};
use crate::core::errors::TripSplitError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use indexmap::IndexMap;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    Equal,
    Exact,
    Itemized,
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SplitMethod::Equal => "equal",
            SplitMethod::Exact => "exact",
            SplitMethod::Itemized => "itemized",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: Decimal,
    pub participants: Vec<ParticipantId>,
}

/// Per-participant amounts owed for one expense.
///
/// Keeps insertion order: the first key is the one that absorbs rounding drift,
/// so iteration order is part of the split result.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ShareMap(IndexMap<ParticipantId, Decimal>);

impl ShareMap {
    pub fn new() -> Self {
        ShareMap(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<Decimal> {
        self.0.get(participant).copied()
    }

    pub fn contains_key(&self, participant: &ParticipantId) -> bool {
        self.0.contains_key(participant)
    }

    /// Sets the share, keeping the original position if the key already exists.
    pub fn insert(&mut self, participant: ParticipantId, amount: Decimal) -> Option<Decimal> {
        self.0.insert(participant, amount)
    }

    /// Adds to the share, creating it at the end if missing.
    pub fn add(&mut self, participant: ParticipantId, amount: Decimal) {
        *self.0.entry(participant).or_default() += amount;
    }

    pub fn remove(&mut self, participant: &ParticipantId) -> Option<Decimal> {
        self.0.shift_remove(participant)
    }

    /// Moves `old`'s share to `new`. If both exist the amounts are summed into
    /// `new`, at whichever of the two positions came first.
    pub fn rename(&mut self, old: &ParticipantId, new: &ParticipantId) -> Option<Decimal> {
        if old == new {
            return None;
        }
        let old_idx = self.0.get_index_of(old)?;
        let (_, moved) = self.0.shift_remove_index(old_idx)?;
        match self.0.get_index_of(new) {
            Some(new_idx) => {
                if let Some(amount) = self.0.get_mut(new) {
                    *amount += moved;
                }
                if new_idx >= old_idx {
                    self.0.move_index(new_idx, old_idx);
                }
            }
            None => {
                self.0.shift_insert(old_idx, new.clone(), moved);
            }
        }
        Some(moved)
    }

    pub fn first_key(&self) -> Option<&ParticipantId> {
        self.0.first().map(|(k, _)| k)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParticipantId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &Decimal)> {
        self.0.iter()
    }

    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }
}

impl FromIterator<(ParticipantId, Decimal)> for ShareMap {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Decimal)>>(iter: T) -> Self {
        let mut shares = ShareMap::new();
        for (participant, amount) in iter {
            shares.add(participant, amount);
        }
        shares
    }
}

// Stored keys that differ only in case name the same participant; their amounts are summed.
impl<'de> Deserialize<'de> for ShareMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::<String, Decimal>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, amount)| {
                key.parse::<ParticipantId>()
                    .map(|participant| (participant, amount))
                    .map_err(de::Error::custom)
            })
            .collect()
    }
}

/// Input for a new expense; the split is computed on creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub payer: Payer,
    pub split: SplitRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub payer: Payer,
    pub split_method: SplitMethod,
    pub participants: Vec<ParticipantId>,
    pub shares: ShareMap,
    #[serde(default)]
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn create(new: NewExpense, default_currency: &str) -> Result<(Expense, Vec<SplitEvent>), TripSplitError> {
        let outcome = split::compute_shares(new.amount, &new.split)?;
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: new.description,
            amount: new.amount,
            currency: new.currency.unwrap_or_else(|| default_currency.to_string()),
            date: new.date,
            category: new.category,
            payer: new.payer,
            split_method: new.split.method,
            participants: outcome.participants,
            shares: outcome.shares,
            items: outcome.items,
            created_at: now,
            updated_at: now,
        };
        Ok((expense, outcome.events))
    }

    /// Recomputes participants, shares and items together. Nothing changes on error.
    pub fn apply_split(&mut self, request: &SplitRequest) -> Result<Vec<SplitEvent>, TripSplitError> {
        let outcome = split::compute_shares(self.amount, request)?;
        self.split_method = request.method;
        self.participants = outcome.participants;
        self.shares = outcome.shares;
        self.items = outcome.items;
        self.updated_at = Utc::now();
        Ok(outcome.events)
    }

    pub fn share_of(&self, participant: &ParticipantId) -> Decimal {
        self.shares.get(participant).unwrap_or(Decimal::ZERO)
    }

    pub fn is_paid_by(&self, participant: &ParticipantId) -> bool {
        self.payer.is(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn unreg(name: &str) -> ParticipantId {
        ParticipantId::unregistered(name).unwrap()
    }

    #[test]
    fn share_map_keeps_insertion_order_in_json() {
        let shares: ShareMap = vec![
            (ParticipantId::registered(9), dec!(10)),
            (unreg("zoe"), dec!(5)),
            (ParticipantId::registered(1), dec!(2.5)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&shares).unwrap();
        assert_eq!(json, r#"{"9":"10","unregistered_zoe":"5","1":"2.5"}"#);
        let back: ShareMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shares);
        assert_eq!(back.first_key(), Some(&ParticipantId::registered(9)));
    }

    #[test]
    fn inconsistently_cased_keys_merge_on_load() {
        let shares: ShareMap =
            serde_json::from_str(r#"{"unregistered_Bob":"10.00","unregistered_bob":"5.00"}"#).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares.get(&unreg("bob")), Some(dec!(15.00)));
    }

    #[test]
    fn rename_merges_into_earliest_position() {
        let mut shares: ShareMap = vec![
            (ParticipantId::registered(1), dec!(10)),
            (unreg("ann"), dec!(20)),
            (ParticipantId::registered(7), dec!(5)),
        ]
        .into_iter()
        .collect();

        let moved = shares.rename(&unreg("ann"), &ParticipantId::registered(7));
        assert_eq!(moved, Some(dec!(20)));
        assert_eq!(shares.len(), 2);
        let keys: Vec<_> = shares.keys().cloned().collect();
        assert_eq!(keys, vec![ParticipantId::registered(1), ParticipantId::registered(7)]);
        assert_eq!(shares.get(&ParticipantId::registered(7)), Some(dec!(25)));
        assert_eq!(shares.total(), dec!(35));
    }

    #[test]
    fn rename_keeps_position_of_earlier_key() {
        let mut shares: ShareMap = vec![
            (ParticipantId::registered(7), dec!(5)),
            (ParticipantId::registered(1), dec!(10)),
            (unreg("ann"), dec!(20)),
        ]
        .into_iter()
        .collect();

        shares.rename(&unreg("ann"), &ParticipantId::registered(7));
        let keys: Vec<_> = shares.keys().cloned().collect();
        assert_eq!(keys, vec![ParticipantId::registered(7), ParticipantId::registered(1)]);
        assert_eq!(shares.first_key(), Some(&ParticipantId::registered(7)));

        shares.rename(&ParticipantId::registered(7), &unreg("zed"));
        let keys: Vec<_> = shares.keys().cloned().collect();
        assert_eq!(keys, vec![unreg("zed"), ParticipantId::registered(1)]);
        assert_eq!(shares.get(&unreg("zed")), Some(dec!(25)));
    }

    #[test]
    fn rename_of_missing_key_is_a_no_op() {
        let mut shares: ShareMap = vec![(ParticipantId::registered(1), dec!(10))].into_iter().collect();
        assert_eq!(shares.rename(&unreg("ghost"), &ParticipantId::registered(2)), None);
        assert_eq!(shares.len(), 1);
    }
}
