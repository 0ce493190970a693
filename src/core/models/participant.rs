//! Participant identities.
//!
//! Every balance, share and payment in a trip is keyed by a [`ParticipantId`].
//! Registered users are keyed by their numeric account id; people who only
//! exist as a typed name are keyed by that name, normalized to lowercase.

use crate::constants::{GROUP_EVERYONE_KEY, UNREGISTERED_KEY_PREFIX};
use crate::core::errors::TripSplitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParticipantId {
    Registered(u64),
    Unregistered(String),
}

impl ParticipantId {
    pub fn registered(user_id: u64) -> Self {
        ParticipantId::Registered(user_id)
    }

    /// Builds an unregistered identity from free text, trimming and lowercasing it.
    pub fn unregistered(name: &str) -> Result<Self, TripSplitError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Err(TripSplitError::InvalidParticipantId(name.to_string()));
        }
        Ok(ParticipantId::Unregistered(normalized))
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, ParticipantId::Registered(_))
    }

    pub fn user_id(&self) -> Option<u64> {
        match self {
            ParticipantId::Registered(id) => Some(*id),
            ParticipantId::Unregistered(_) => None,
        }
    }

    pub fn unregistered_name(&self) -> Option<&str> {
        match self {
            ParticipantId::Registered(_) => None,
            ParticipantId::Unregistered(name) => Some(name),
        }
    }

    /// Storage form: `"42"` or `"unregistered_<name>"`.
    pub fn storage_key(&self) -> String {
        match self {
            ParticipantId::Registered(id) => id.to_string(),
            ParticipantId::Unregistered(name) => format!("{}{}", UNREGISTERED_KEY_PREFIX, name),
        }
    }

    /// Human facing name for unregistered participants. Registered users are
    /// named by the caller, who owns the user directory.
    pub fn unregistered_display_name(&self) -> Option<String> {
        self.unregistered_name().map(title_case)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Uppercases the first letter of every word, lowercasing the rest. Any
/// non-letter, digits included, ends a word.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

impl FromStr for ParticipantId {
    type Err = TripSplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let prefix_len = UNREGISTERED_KEY_PREFIX.len();
        if trimmed
            .get(..prefix_len)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(UNREGISTERED_KEY_PREFIX))
        {
            return ParticipantId::unregistered(&trimmed[prefix_len..]);
        }
        trimmed
            .parse::<u64>()
            .map(ParticipantId::Registered)
            .map_err(|_| TripSplitError::InvalidParticipantId(s.to_string()))
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = TripSplitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.storage_key()
    }
}

/// Who paid for an expense.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Payer {
    Participant(ParticipantId),
    /// Paid out of a shared pool. Credits nobody.
    GroupEveryone,
}

impl Payer {
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Payer::Participant(id) => Some(id),
            Payer::GroupEveryone => None,
        }
    }

    pub fn is(&self, id: &ParticipantId) -> bool {
        self.participant() == Some(id)
    }
}

impl From<ParticipantId> for Payer {
    fn from(id: ParticipantId) -> Self {
        Payer::Participant(id)
    }
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payer::Participant(id) => write!(f, "{}", id),
            Payer::GroupEveryone => write!(f, "{}", GROUP_EVERYONE_KEY),
        }
    }
}

impl FromStr for Payer {
    type Err = TripSplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == GROUP_EVERYONE_KEY {
            return Ok(Payer::GroupEveryone);
        }
        s.parse().map(Payer::Participant)
    }
}

impl TryFrom<String> for Payer {
    type Error = TripSplitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Payer> for String {
    fn from(payer: Payer) -> Self {
        payer.to_string()
    }
}

/// A named person on a trip who has no account, or had none when added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisteredParticipant {
    pub name: String,
    pub linked_user_id: Option<u64>,
}

impl UnregisteredParticipant {
    pub fn new(name: &str) -> Result<Self, TripSplitError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Err(TripSplitError::InvalidParticipantId(name.to_string()));
        }
        Ok(UnregisteredParticipant {
            name: normalized,
            linked_user_id: None,
        })
    }

    pub fn id(&self) -> ParticipantId {
        ParticipantId::Unregistered(self.name.clone())
    }

    pub fn is_linked(&self) -> bool {
        self.linked_user_id.is_some()
    }
}
