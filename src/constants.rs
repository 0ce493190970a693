use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Two amounts closer than this are treated as equal.
pub const MONEY_TOLERANCE: Decimal = dec!(0.01);

/// Money is always rounded to cents.
pub const MONEY_SCALE: u32 = 2;

pub const DEFAULT_SETTLEMENT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_SETTLEMENT_MAX_TRANSFERS: usize = 20;

pub const DEFAULT_CURRENCY: &str = "INR";

pub const UNREGISTERED_KEY_PREFIX: &str = "unregistered_";
pub const GROUP_EVERYONE_KEY: &str = "group_everyone";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const DEFAULT_APP_LOG_CAPACITY: usize = 10_000;

pub mod actions {
    pub const TRIP_CREATED: &str = "TRIP_CREATED";
    pub const TRIP_UPDATED: &str = "TRIP_UPDATED";
    pub const TRIP_DELETED: &str = "TRIP_DELETED";
    pub const PARTICIPANT_ADDED: &str = "PARTICIPANT_ADDED";
    pub const PARTICIPANT_REMOVED: &str = "PARTICIPANT_REMOVED";
    pub const UNREGISTERED_ADDED: &str = "UNREGISTERED_ADDED";
    pub const UNREGISTERED_REMOVED: &str = "UNREGISTERED_REMOVED";
    pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
    pub const EXPENSE_SPLIT_UPDATED: &str = "EXPENSE_SPLIT_UPDATED";
    pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
    pub const SPLIT_DRIFT_ABSORBED: &str = "SPLIT_DRIFT_ABSORBED";
    pub const SPLIT_ITEM_SKIPPED: &str = "SPLIT_ITEM_SKIPPED";
    pub const SPLIT_DRIFT_TOLERATED: &str = "SPLIT_DRIFT_TOLERATED";
    pub const ADVANCE_ADDED: &str = "ADVANCE_ADDED";
    pub const ADVANCE_EDITED: &str = "ADVANCE_EDITED";
    pub const ADVANCE_DELETED: &str = "ADVANCE_DELETED";
    pub const PAYMENT_ADDED: &str = "PAYMENT_ADDED";
    pub const PAYMENT_EDITED: &str = "PAYMENT_EDITED";
    pub const PAYMENT_DELETED: &str = "PAYMENT_DELETED";
    pub const SETTLEMENT_TRUNCATED: &str = "SETTLEMENT_TRUNCATED";
    pub const PARTICIPANT_LINKED: &str = "PARTICIPANT_LINKED";
    pub const LINKED_PARTICIPANTS_RESYNCED: &str = "LINKED_PARTICIPANTS_RESYNCED";
}
