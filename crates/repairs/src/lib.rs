//! Repairs domain module.
//!
//! Business rules for repair jobs and for the parts consumed by them,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). The stock-delta arithmetic used by the link manager lives in
//! [`part_usage`]; the persistence layer applies it inside one transaction.

pub mod part_usage;
pub mod repair;

pub use part_usage::{
    ensure_available, line_cost, parts_cost, stock_delta, AttachPart, PartUsage, PartUsagePatch,
};
pub use repair::{CostSummary, NewRepair, RepairJob, RepairPatch, RepairStatus};
