//! Value Objects for the back office

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationError;

/// Defines a typed id wrapper around a v7 (time-ordered) UUID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self { Self(Uuid::now_v7()) }
            pub const fn from_uuid(id: Uuid) -> Self { Self(id) }
            pub const fn as_uuid(&self) -> Uuid { self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self { Self(id) }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
        }
    };
}

define_id!(
    /// Catalog identifier
    CatalogId
);
define_id!(
    /// Supplier identifier
    SupplierId
);
define_id!(
    /// Item identifier
    ItemId
);
define_id!(
    /// Order identifier
    OrderId
);
define_id!(
    /// Order line identifier, unique across orders
    OrderLineId
);

/// Identity handed to us by the upstream authentication layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for blank identifiers.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() { return None; }
        Some(Self(trimmed.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Non-negative amount in the shop currency, at most two decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    /// Matches the `NUMERIC(14, 2)` money columns.
    pub const SCALE: u32 = 2;

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(MoneyError::Negative(amount)); }
        let cents = amount.round_dp(Self::SCALE);
        if cents != amount { return Err(MoneyError::TooPrecise(amount)); }
        Ok(Self(cents))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn times(&self, qty: Quantity) -> Money { Money(self.0.saturating_mul(Decimal::from(qty.value()))) }
    pub fn plus(&self, other: Money) -> Money { Money(self.0.saturating_add(other.0)) }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;
    fn try_from(amount: Decimal) -> Result<Self, Self::Error> { Self::new(amount) }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self { money.0 }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::ZERO, |acc, m| acc.plus(m)) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount must not be negative, got {0}")]
    Negative(Decimal),
    #[error("amount must have at most two decimal places, got {0}")]
    TooPrecise(Decimal),
}

/// Line quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i64) -> Result<Self, QuantityError> {
        match u32::try_from(value) {
            Ok(v) if v >= 1 => Ok(Self(v)),
            _ => Err(QuantityError(value)),
        }
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(i64::from(value)) }
}

impl From<Quantity> for u32 {
    fn from(qty: Quantity) -> Self { qty.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quantity must be at least 1, got {0}")]
pub struct QuantityError(pub i64);

/// `validator` hook for required text fields; `length(min = 1)` lets whitespace through.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("blank")); }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rejects_negative() {
        assert!(Money::new(Decimal::new(-1, 0)).is_err());
        assert_eq!(Money::new(Decimal::ZERO).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_money_limits_scale() {
        assert_eq!(Money::new(Decimal::new(125, 3)), Err(MoneyError::TooPrecise(Decimal::new(125, 3))));
        let padded = Money::new(Decimal::new(10_500, 3)).unwrap();
        assert_eq!(padded.amount().scale(), 2);
        assert_eq!(serde_json::to_string(&padded).unwrap(), "\"10.50\"");
        assert!(serde_json::from_str::<Money>("\"0.125\"").is_err());
    }

    #[test]
    fn test_money_sum_and_times() {
        let ten = Money::new(Decimal::new(10, 0)).unwrap();
        let five = Money::new(Decimal::new(5, 0)).unwrap();
        let total: Money = [ten.times(Quantity::new(2).unwrap()), five].into_iter().sum();
        assert_eq!(total.amount(), Decimal::new(25, 0));
        assert_eq!(total.to_string(), "25.00");
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-3).is_err());
        assert!(Quantity::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(Quantity::new(3).unwrap().add(Quantity::ONE).value(), 4);
    }

    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().value(), 2);
    }

    #[test]
    fn test_user_id_trims() {
        assert!(UserId::new("   ").is_none());
        assert_eq!(UserId::new(" u-1 ").unwrap().as_str(), "u-1");
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank(" \t").is_err());
        assert!(not_blank("x").is_ok());
    }
}
