//! Inventory domain module.
//!
//! This crate contains business rules for the parts catalog and its stock
//! ledger, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod item;

pub use item::{
    InventoryItem, ItemPatch, ItemSummary, NewItem, StockOperation, LOW_STOCK_THRESHOLD,
};
