//! Core identifier and value types for the storefront.
//!
//! All types use smart constructors so that a value, once built, is valid
//! everywhere it flows ("parse, don't validate"). Generated identifiers use
//! UUIDv7 so they sort roughly by creation time.

use crate::errors::CoreError;
use nutype::nutype;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Stable identifier for an authenticated user.
///
/// Issued by the identity provider; the core never creates users, it only
/// keys carts, orders, and addresses by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a fresh user id (mainly useful in tests and seeds).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a fresh product id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ProductId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a single line in a cart.
///
/// Assigned when the line is first appended; merging quantities into an
/// existing line keeps the original id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(Uuid);

impl CartItemId {
    /// Creates a fresh cart line id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CartItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CartItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a saved delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(Uuid);

impl AddressId {
    /// Creates a fresh address id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AddressId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AddressId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable order identifier.
///
/// Format: `MO-{UPPERCASE_HEX}`. Generated ids embed a full UUIDv7 so
/// collisions are cryptographically unlikely even under concurrent order
/// creation; the order store additionally rejects duplicates.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 40, regex = r"^MO-[A-F0-9]+$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Display,
        AsRef,
        Deref,
        Serialize,
        Deserialize,
        TryFrom
    )
)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a new order id from a UUIDv7.
    pub fn generate() -> Self {
        let hex = Uuid::now_v7().simple().to_string().to_uppercase();
        Self::try_new(format!("MO-{hex}")).expect("generated OrderId should be valid")
    }
}

/// Product display name, snapshotted onto cart and order lines.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Display,
        AsRef,
        Deref,
        Serialize,
        Deserialize,
        TryFrom
    )
)]
pub struct ProductName(String);

/// Quantity of a product on a cart or order line.
///
/// Always at least 1; stock levels, which may legitimately be zero, are plain
/// `u32` counters on the catalog side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    /// Maximum quantity per line.
    pub const MAX: u32 = 1000;

    /// Creates a new quantity, rejecting zero and values above [`Self::MAX`].
    pub fn new(value: u32) -> Result<Self, CoreError> {
        if value == 0 {
            return Err(CoreError::ValidationFailed(
                "quantity must be at least 1".to_string(),
            ));
        }
        if value > Self::MAX {
            return Err(CoreError::ValidationFailed(format!(
                "quantity {value} exceeds maximum {}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    /// Returns the underlying value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Adds two quantities, rejecting overflow past [`Self::MAX`].
    pub fn checked_add(self, other: Self) -> Result<Self, CoreError> {
        let total = self.0.checked_add(other.0).ok_or_else(|| {
            CoreError::ValidationFailed("quantity overflow".to_string())
        })?;
        Self::new(total)
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monetary amount.
///
/// Backed by `Decimal` for exact arithmetic; non-negative with at most two
/// decimal places. Single implicit currency (multi-currency is out of scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Maximum representable amount (100 million).
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Creates money from a whole number of cents.
    pub fn from_cents(cents: u64) -> Result<Self, CoreError> {
        let decimal = Decimal::new(
            i64::try_from(cents).map_err(|_| {
                CoreError::ValidationFailed(format!("amount {cents} out of range"))
            })?,
            2,
        );
        Self::new(decimal)
    }

    /// Creates money from a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, CoreError> {
        if amount.is_sign_negative() {
            return Err(CoreError::ValidationFailed(format!(
                "amount cannot be negative: {amount}"
            )));
        }
        if amount.scale() > 2 {
            return Err(CoreError::ValidationFailed(format!(
                "amount cannot have more than 2 decimal places: {amount}"
            )));
        }
        if amount > Self::MAX_AMOUNT {
            return Err(CoreError::ValidationFailed(format!(
                "amount {amount} exceeds maximum {}",
                Self::MAX_AMOUNT
            )));
        }
        Ok(Self(amount))
    }

    /// Zero amount.
    pub fn zero() -> Self {
        Self(Decimal::new(0, 0))
    }

    /// Returns the underlying decimal.
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Converts to cents.
    pub fn to_cents(&self) -> u64 {
        (self.0 * Decimal::from(100)).to_u64().unwrap_or(0)
    }

    /// Adds two amounts, rejecting overflow past [`Self::MAX_AMOUNT`].
    pub fn checked_add(self, other: Self) -> Result<Self, CoreError> {
        Self::new(self.0 + other.0)
    }

    /// Multiplies a unit price by a line quantity.
    pub fn times(self, quantity: Quantity) -> Result<Self, CoreError> {
        Self::new(self.0 * Decimal::from(quantity.value()))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn order_id_generation_is_valid_and_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert!(a.as_ref().starts_with("MO-"));
        assert_ne!(a, b);
    }

    #[test]
    fn order_id_validation() {
        assert!(OrderId::try_new("MO-0198ABCD".to_string()).is_ok());
        assert!(OrderId::try_new("MO-".to_string()).is_err());
        assert!(OrderId::try_new("mo-abc".to_string()).is_err());
        assert!(OrderId::try_new("ORD-123".to_string()).is_err());
    }

    #[test]
    fn product_name_is_trimmed_and_non_empty() {
        let name = ProductName::try_new("  Denim Jacket  ".to_string()).unwrap();
        assert_eq!(name.as_ref(), "Denim Jacket");
        assert!(ProductName::try_new("   ".to_string()).is_err());
        assert!(ProductName::try_new("x".repeat(201)).is_err());
    }

    #[test]
    fn quantity_rejects_zero_and_excess() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(1).is_ok());
        assert!(Quantity::new(Quantity::MAX).is_ok());
        assert!(Quantity::new(Quantity::MAX + 1).is_err());
    }

    #[test]
    fn quantity_checked_add_caps_at_max() {
        let a = Quantity::new(600).unwrap();
        let b = Quantity::new(500).unwrap();
        assert!(a.checked_add(b).is_err());
        let c = Quantity::new(400).unwrap();
        assert_eq!(a.checked_add(c).unwrap().value(), 1000);
    }

    #[test]
    fn money_rejects_negative_and_deep_scale() {
        assert!(Money::new(Decimal::new(-100, 2)).is_err());
        assert!(Money::new(Decimal::new(1001, 3)).is_err());
        assert!(Money::new(Decimal::new(1050, 2)).is_ok());
    }

    #[test]
    fn money_times_quantity() {
        let price = Money::from_cents(10_000).unwrap(); // 100.00
        let qty = Quantity::new(2).unwrap();
        assert_eq!(price.times(qty).unwrap().to_cents(), 20_000);
    }

    #[test]
    fn uuid_ids_roundtrip_serde() {
        let id = ProductId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    proptest! {
        #[test]
        fn prop_money_from_cents_roundtrip(cents in 0u64..1_000_000) {
            let money = Money::from_cents(cents).unwrap();
            prop_assert_eq!(money.to_cents(), cents);
        }

        #[test]
        fn prop_quantity_value_roundtrip(value in 1u32..=1000) {
            let quantity = Quantity::new(value).unwrap();
            prop_assert_eq!(quantity.value(), value);
        }

        #[test]
        fn prop_money_addition_commutative(a in 0u64..100_000, b in 0u64..100_000) {
            let ma = Money::from_cents(a).unwrap();
            let mb = Money::from_cents(b).unwrap();
            prop_assert_eq!(
                ma.checked_add(mb).unwrap(),
                mb.checked_add(ma).unwrap()
            );
        }

        #[test]
        fn prop_order_id_roundtrip_serde(suffix in "[A-F0-9]{8,32}") {
            let id = OrderId::try_new(format!("MO-{suffix}")).unwrap();
            let json = serde_json::to_string(&id).unwrap();
            let back: OrderId = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(id, back);
        }
    }
}
