//! Turns an expense amount and a split strategy into a per-participant share map.
//!
//! Every method is a pure function of its inputs. Rounding drift left over after
//! cent rounding is absorbed by the first participant in insertion order, and the
//! correction is reported as a [`SplitEvent`] so callers can audit it.

use crate::core::errors::TripSplitError;
use crate::core::models::expense::{Item, ShareMap, SplitMethod};
use crate::core::models::participant::ParticipantId;
use crate::core::money::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExactShare {
    pub user_id: u64,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnregisteredShare {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub participants: Vec<u64>,
    #[serde(default)]
    pub unregistered: Vec<String>,
}

/// Method specific data. Must agree with the request's [`SplitMethod`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodInput {
    None,
    Exact {
        #[serde(default)]
        registered: Vec<ExactShare>,
        #[serde(default)]
        unregistered: Vec<UnregisteredShare>,
    },
    Itemized {
        items: Vec<ItemInput>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub method: SplitMethod,
    #[serde(default)]
    pub registered: Vec<u64>,
    #[serde(default)]
    pub unregistered: Vec<String>,
    pub input: MethodInput,
}

impl SplitRequest {
    pub fn equal(registered: Vec<u64>, unregistered: Vec<String>) -> Self {
        SplitRequest {
            method: SplitMethod::Equal,
            registered,
            unregistered,
            input: MethodInput::None,
        }
    }

    pub fn exact(registered: Vec<ExactShare>, unregistered: Vec<UnregisteredShare>) -> Self {
        SplitRequest {
            method: SplitMethod::Exact,
            registered: registered.iter().map(|s| s.user_id).collect(),
            unregistered: unregistered.iter().map(|s| s.name.clone()).collect(),
            input: MethodInput::Exact {
                registered,
                unregistered,
            },
        }
    }

    pub fn itemized(items: Vec<ItemInput>) -> Self {
        SplitRequest {
            method: SplitMethod::Itemized,
            registered: Vec::new(),
            unregistered: Vec::new(),
            input: MethodInput::Itemized { items },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SplitEvent {
    /// Cent rounding left `drift` unassigned; it was added to `participant`.
    DriftAbsorbed { participant: ParticipantId, drift: Decimal },
    /// An itemized line had nobody attached and contributed nothing.
    ItemSkipped { item: String },
    /// Exact shares do not add up, but unregistered shares may be entered elsewhere.
    ExactDriftTolerated { drift: Decimal },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitOutcome {
    pub participants: Vec<ParticipantId>,
    pub shares: ShareMap,
    pub items: Vec<Item>,
    pub events: Vec<SplitEvent>,
}

pub fn compute_shares(amount: Decimal, request: &SplitRequest) -> Result<SplitOutcome, TripSplitError> {
    if amount <= Decimal::ZERO {
        return Err(TripSplitError::InvalidSplitInput(format!(
            "expense amount must be positive, got {}",
            amount
        )));
    }
    let declared = declared_participants(&request.registered, &request.unregistered)?;
    debug!(
        "Computing {} split of {} across {} declared participants",
        request.method,
        amount,
        declared.len()
    );

    match (request.method, &request.input) {
        (SplitMethod::Equal, MethodInput::None) => equal_split(amount, declared),
        (SplitMethod::Exact, MethodInput::Exact { registered, unregistered }) => {
            exact_split(amount, declared, registered, unregistered)
        }
        (SplitMethod::Itemized, MethodInput::Itemized { items }) => itemized_split(amount, declared, items),
        (method, _) => Err(TripSplitError::InvalidSplitInput(format!(
            "method input does not match split method `{}`",
            method
        ))),
    }
}

fn declared_participants(registered: &[u64], unregistered: &[String]) -> Result<Vec<ParticipantId>, TripSplitError> {
    let mut participants = Vec::with_capacity(registered.len() + unregistered.len());
    for &user_id in registered {
        push_unique(&mut participants, ParticipantId::registered(user_id));
    }
    for name in unregistered {
        let id = ParticipantId::unregistered(name)
            .map_err(|_| TripSplitError::InvalidSplitInput(format!("invalid participant name `{}`", name)))?;
        push_unique(&mut participants, id);
    }
    Ok(participants)
}

fn push_unique(participants: &mut Vec<ParticipantId>, id: ParticipantId) {
    if !participants.contains(&id) {
        participants.push(id);
    }
}

fn equal_split(amount: Decimal, participants: Vec<ParticipantId>) -> Result<SplitOutcome, TripSplitError> {
    if participants.is_empty() {
        return Err(TripSplitError::InvalidSplitInput(
            "equal split needs at least one participant".to_string(),
        ));
    }
    let share = round_money(amount / Decimal::from(participants.len()));
    let mut shares: ShareMap = participants.iter().map(|p| (p.clone(), share)).collect();

    let events = absorb_drift(amount, &mut shares).into_iter().collect();
    Ok(SplitOutcome {
        participants,
        shares,
        items: Vec::new(),
        events,
    })
}

fn exact_split(
    amount: Decimal,
    mut participants: Vec<ParticipantId>,
    registered: &[ExactShare],
    unregistered: &[UnregisteredShare],
) -> Result<SplitOutcome, TripSplitError> {
    let mut shares = ShareMap::new();
    let entries = registered
        .iter()
        .map(|s| Ok((ParticipantId::registered(s.user_id), s.amount)))
        .chain(unregistered.iter().map(|s| {
            ParticipantId::unregistered(&s.name)
                .map(|id| (id, s.amount))
                .map_err(|_| TripSplitError::InvalidSplitInput(format!("invalid participant name `{}`", s.name)))
        }));
    for entry in entries {
        let (participant, share) = entry?;
        if share < Decimal::ZERO {
            return Err(TripSplitError::InvalidSplitInput(format!(
                "exact share for {} cannot be negative",
                participant
            )));
        }
        if shares.contains_key(&participant) {
            return Err(TripSplitError::InvalidSplitInput(format!(
                "duplicate exact share for {}",
                participant
            )));
        }
        push_unique(&mut participants, participant.clone());
        shares.insert(participant, share);
    }
    if shares.is_empty() {
        return Err(TripSplitError::InvalidSplitInput(
            "exact split needs at least one share".to_string(),
        ));
    }

    let has_unregistered = participants.iter().any(|p| !p.is_registered());
    let mut events = Vec::new();
    if has_unregistered {
        let drift = round_money(amount - shares.total());
        if !drift.is_zero() {
            warn!(
                "Exact shares miss the amount {} by {}; tolerated because unregistered participants are present",
                amount, drift
            );
            events.push(SplitEvent::ExactDriftTolerated { drift });
        }
    } else {
        events.extend(absorb_drift(amount, &mut shares));
    }

    Ok(SplitOutcome {
        participants,
        shares,
        items: Vec::new(),
        events,
    })
}

fn itemized_split(
    amount: Decimal,
    mut participants: Vec<ParticipantId>,
    inputs: &[ItemInput],
) -> Result<SplitOutcome, TripSplitError> {
    if inputs.is_empty() {
        return Err(TripSplitError::InvalidSplitInput(
            "itemized split needs at least one item".to_string(),
        ));
    }

    let mut shares = ShareMap::new();
    let mut items = Vec::with_capacity(inputs.len());
    let mut events = Vec::new();

    for input in inputs {
        if input.price <= Decimal::ZERO {
            return Err(TripSplitError::InvalidSplitInput(format!(
                "item `{}` must have a positive price",
                input.name
            )));
        }
        let item_participants = declared_participants(&input.participants, &input.unregistered)?;
        if item_participants.is_empty() {
            warn!("Item `{}` has no participants, skipping", input.name);
            events.push(SplitEvent::ItemSkipped {
                item: input.name.clone(),
            });
        } else {
            let per_person = round_money(input.price / Decimal::from(item_participants.len()));
            for participant in &item_participants {
                shares.add(participant.clone(), per_person);
                push_unique(&mut participants, participant.clone());
            }
        }
        items.push(Item {
            name: input.name.clone(),
            price: input.price,
            participants: item_participants,
        });
    }

    if shares.is_empty() {
        return Err(TripSplitError::InvalidSplitInput(
            "no item has any participant".to_string(),
        ));
    }
    events.extend(absorb_drift(amount, &mut shares));

    Ok(SplitOutcome {
        participants,
        shares,
        items,
        events,
    })
}

/// Gives any cent-level remainder to the first participant so the shares sum to `amount`.
fn absorb_drift(amount: Decimal, shares: &mut ShareMap) -> Option<SplitEvent> {
    let drift = round_money(amount - shares.total());
    if drift.is_zero() {
        return None;
    }
    let first = shares.first_key()?.clone();
    let adjusted = round_money(shares.get(&first).unwrap_or(Decimal::ZERO) + drift);
    shares.insert(first.clone(), adjusted);
    info!("Absorbed rounding drift {} into share of {}", drift, first);
    Some(SplitEvent::DriftAbsorbed {
        participant: first,
        drift,
    })
}
