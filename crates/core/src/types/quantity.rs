//! Line item quantity type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Largest quantity the storefront UI lets a shopper pick for one line.
pub const MAX_UI_QUANTITY: u32 = 10;

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value was zero or negative.
    #[error("quantity must be a positive integer (got {0})")]
    NotPositive(i64),
}

/// A positive line item quantity.
///
/// Removal is modelled by deleting the line item, never by sending a zero
/// quantity, so this type has no zero value.
///
/// ## Examples
///
/// ```
/// use magnolia_core::Quantity;
///
/// assert_eq!(Quantity::coerce(-3).get(), 1);
/// assert_eq!(Quantity::coerce(4).get(), 4);
/// assert_eq!(Quantity::clamp_for_display(15).get(), 10);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest valid quantity.
    pub const ONE: Self = Self(1);

    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] if `value < 1`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        Ok(Self(u32::try_from(value).unwrap_or(u32::MAX)))
    }

    /// Coerce any integer into a valid quantity: `max(1, value)`.
    ///
    /// Values beyond `u32::MAX` saturate.
    #[must_use]
    pub fn coerce(value: i64) -> Self {
        Self::new(value).unwrap_or(Self::ONE)
    }

    /// Clamp a shopper-entered value to `[1, MAX_UI_QUANTITY]`.
    #[must_use]
    pub fn clamp_for_display(value: i64) -> Self {
        let clamped = value.clamp(1, i64::from(MAX_UI_QUANTITY));
        Self::coerce(clamped)
    }

    /// The underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        Self::from(quantity.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
