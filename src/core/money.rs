use crate::constants::{MONEY_SCALE, MONEY_TOLERANCE};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `value` is within one cent of zero.
pub fn is_settled(value: Decimal) -> bool {
    value.abs() <= MONEY_TOLERANCE
}

pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    is_settled(a - b)
}
