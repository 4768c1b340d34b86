//! Part consumption by repairs (the repair/inventory link).
//!
//! A `PartUsage` binds one inventory item to one repair with a quantity and
//! a unit-price snapshot taken when the link is created. Later catalog price
//! changes never touch existing links. Every quantity change carries a stock
//! delta that the persistence layer must apply to the item's stock in the
//! same transaction as the link mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallerhub_core::{DomainError, DomainResult};

/// Association record between a repair and an inventory item.
///
/// At most one link exists per (repair, item) pair. The link owns its
/// quantity and price snapshot; it references but does not own either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUsage {
    pub id: i64,
    pub repair_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for attaching an item to a repair.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachPart {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl AttachPart {
    pub fn validate(&self) -> DomainResult<()> {
        validate_quantity(self.quantity)?;
        validate_unit_price(self.unit_price)
    }
}

/// Partial update for a link. A quantity change adjusts stock by the signed
/// difference; a price change rewrites the snapshot with no stock effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartUsagePatch {
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
}

impl PartUsagePatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(price) = self.unit_price {
            validate_unit_price(price)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.unit_price.is_none()
    }
}

/// Signed stock adjustment when a link's quantity moves from `current` to
/// `requested`. Positive means more stock gets consumed; negative restores.
pub fn stock_delta(current: i64, requested: i64) -> i64 {
    requested - current
}

/// Check that `requested` units can be taken from `stock`.
pub fn ensure_available(stock: i64, requested: i64) -> DomainResult<()> {
    if requested > stock {
        return Err(DomainError::insufficient_stock(stock, requested));
    }
    Ok(())
}

/// Cost of a single link line.
pub fn line_cost(quantity: i64, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// Aggregate parts cost over (quantity, unit price) lines.
pub fn parts_cost(lines: impl IntoIterator<Item = (i64, Decimal)>) -> Decimal {
    lines
        .into_iter()
        .map(|(quantity, unit_price)| line_cost(quantity, unit_price))
        .sum()
}

fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 1 {
        return Err(DomainError::validation(
            "La cantidad debe ser un número válido mayor a 0",
        ));
    }
    Ok(())
}

fn validate_unit_price(price: Decimal) -> DomainResult<()> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation(
            "El precio unitario debe ser un número válido mayor o igual a 0",
        ));
    }
    Ok(())
}
