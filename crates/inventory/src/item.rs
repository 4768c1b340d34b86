use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallerhub_core::{DomainError, DomainResult};

/// Items with stock below this count show up in the low-stock report.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// A part in the workshop catalog, with its current stock level.
///
/// `stock` is the single source of truth for availability; every consumption
/// by a repair goes through the persistence layer's conditional decrement so
/// it can never be driven below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub stock: i64,
}

/// The subset of item fields embedded in link responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Input for creating a catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub stock: i64,
}

impl NewItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() || self.category.trim().is_empty() {
            return Err(DomainError::validation(
                "Nombre, categoría, precio y stock son campos requeridos",
            ));
        }
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        Ok(())
    }
}

/// Partial update for a catalog item. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl ItemPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }
}

/// Direct stock adjustments exposed by the inventory endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    /// Replace the stock count.
    Establecer,
    /// Add to the stock count.
    Incrementar,
    /// Remove from the stock count; fails rather than going negative.
    Decrementar,
}

impl StockOperation {
    /// Compute the resulting stock level for this operation.
    ///
    /// `amount` must already be validated as non-negative.
    pub fn apply(self, current: i64, amount: i64) -> DomainResult<i64> {
        match self {
            StockOperation::Establecer => Ok(amount),
            StockOperation::Incrementar => Ok(current + amount),
            StockOperation::Decrementar => {
                if amount > current {
                    Err(DomainError::insufficient_stock(current, amount))
                } else {
                    Ok(current - amount)
                }
            }
        }
    }
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation(
            "El precio debe ser un número válido mayor o igual a 0",
        ));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> DomainResult<()> {
    if stock < 0 {
        return Err(DomainError::validation(
            "El stock debe ser un número entero válido mayor o igual a 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn new_item() -> NewItem {
        NewItem {
            name: "Filtro de aceite".to_string(),
            description: "Filtro estándar".to_string(),
            category: "filtros".to_string(),
            price: Decimal::new(1250, 2),
            stock: 10,
        }
    }

    #[test]
    fn valid_item_passes_validation() {
        assert!(new_item().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut item = new_item();
        item.name = "   ".to_string();
        assert!(matches!(
            item.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut item = new_item();
        item.price = Decimal::new(-1, 2);
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut item = new_item();
        item.stock = -1;
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = ItemPatch {
            price: Some(Decimal::new(-500, 2)),
            ..ItemPatch::default()
        };
        assert!(patch.validate().is_err());
        assert!(ItemPatch::default().validate().is_ok());
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn stock_operations_compute_the_new_level() {
        assert_eq!(StockOperation::Establecer.apply(10, 3).unwrap(), 3);
        assert_eq!(StockOperation::Incrementar.apply(10, 3).unwrap(), 13);
        assert_eq!(StockOperation::Decrementar.apply(10, 3).unwrap(), 7);
    }

    #[test]
    fn decrement_past_zero_reports_insufficient_stock() {
        let err = StockOperation::Decrementar.apply(2, 3).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn stock_operation_names_deserialize_from_spanish() {
        let op: StockOperation = serde_json::from_str("\"incrementar\"").unwrap();
        assert_eq!(op, StockOperation::Incrementar);
    }
}
