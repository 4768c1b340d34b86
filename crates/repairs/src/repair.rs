use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallerhub_core::{DomainError, DomainResult};

/// Repair lifecycle. A repair is `Completada` exactly when it has an end
/// date; creation derives the status instead of trusting the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    EnProceso,
    Completada,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::EnProceso => "en_proceso",
            RepairStatus::Completada => "completada",
        }
    }

    pub fn parse(s: &str) -> Option<RepairStatus> {
        match s {
            "en_proceso" => Some(RepairStatus::EnProceso),
            "completada" => Some(RepairStatus::Completada),
            _ => None,
        }
    }
}

impl core::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repair job. `labor_cost` is the workshop's own charge, independent of
/// the parts consumed; the cost aggregator adds both on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairJob {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub description: String,
    pub labor_cost: Decimal,
    pub status: RepairStatus,
    pub user_id: i64,
    pub vehicle_id: i64,
}

/// Input for opening a repair job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepair {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub description: String,
    pub labor_cost: Decimal,
    pub user_id: i64,
    pub vehicle_id: i64,
}

impl NewRepair {
    /// Validate the input and derive the initial status.
    pub fn validate(&self) -> DomainResult<RepairStatus> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(
                "Fecha de inicio, descripción, usuario_id y vehiculo_id son campos requeridos",
            ));
        }
        validate_labor_cost(self.labor_cost)?;
        if let Some(finished) = self.finished_at {
            if finished < self.started_at {
                return Err(DomainError::validation(
                    "La fecha de fin no puede ser anterior a la fecha de inicio",
                ));
            }
            return Ok(RepairStatus::Completada);
        }
        Ok(RepairStatus::EnProceso)
    }
}

/// Partial update for a repair job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPatch {
    pub started_at: Option<DateTime<Utc>>,
    /// `Some(None)` clears the end date and reopens the repair.
    pub finished_at: Option<Option<DateTime<Utc>>>,
    pub description: Option<String>,
    pub labor_cost: Option<Decimal>,
    pub status: Option<RepairStatus>,
    pub user_id: Option<i64>,
    pub vehicle_id: Option<i64>,
}

impl RepairPatch {
    /// Validate against the stored repair (date ordering needs the fields
    /// the patch leaves untouched).
    pub fn validate(&self, current: &RepairJob) -> DomainResult<()> {
        if let Some(cost) = self.labor_cost {
            validate_labor_cost(cost)?;
        }
        let started = self.started_at.unwrap_or(current.started_at);
        if let Some(Some(finished)) = self.finished_at {
            if finished < started {
                return Err(DomainError::validation(
                    "La fecha de fin no puede ser anterior a la fecha de inicio",
                ));
            }
        }
        Ok(())
    }
}

/// Cost breakdown for one repair: labor plus consumed parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub labor: Decimal,
    pub parts: Decimal,
    pub total: Decimal,
    pub item_count: i64,
}

impl CostSummary {
    pub fn new(labor: Decimal, parts: Decimal, item_count: i64) -> Self {
        Self {
            labor,
            parts,
            total: labor + parts,
            item_count,
        }
    }
}

fn validate_labor_cost(cost: Decimal) -> DomainResult<()> {
    if cost < Decimal::ZERO {
        return Err(DomainError::validation(
            "El costo debe ser un número válido mayor o igual a 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn new_repair() -> NewRepair {
        NewRepair {
            started_at: start(),
            finished_at: None,
            description: "Cambio de frenos".to_string(),
            labor_cost: Decimal::new(5000, 2),
            user_id: 1,
            vehicle_id: 1,
        }
    }

    #[test]
    fn open_repair_starts_in_proceso() {
        assert_eq!(new_repair().validate().unwrap(), RepairStatus::EnProceso);
    }

    #[test]
    fn repair_with_end_date_is_completada() {
        let mut repair = new_repair();
        repair.finished_at = Some(start() + chrono::Duration::days(2));
        assert_eq!(repair.validate().unwrap(), RepairStatus::Completada);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut repair = new_repair();
        repair.finished_at = Some(start() - chrono::Duration::days(1));
        assert!(matches!(repair.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_labor_cost_is_rejected() {
        let mut repair = new_repair();
        repair.labor_cost = Decimal::new(-100, 2);
        assert!(matches!(repair.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_checks_date_order_against_stored_fields() {
        let job = RepairJob {
            id: 1,
            started_at: start(),
            finished_at: None,
            description: "Cambio de frenos".to_string(),
            labor_cost: Decimal::ZERO,
            status: RepairStatus::EnProceso,
            user_id: 1,
            vehicle_id: 1,
        };
        let patch = RepairPatch {
            finished_at: Some(Some(start() - chrono::Duration::hours(1))),
            ..RepairPatch::default()
        };
        assert!(patch.validate(&job).is_err());

        let patch = RepairPatch {
            finished_at: Some(Some(start() + chrono::Duration::hours(1))),
            ..RepairPatch::default()
        };
        assert!(patch.validate(&job).is_ok());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RepairStatus::EnProceso).unwrap(),
            "\"en_proceso\""
        );
        assert_eq!(RepairStatus::parse("completada"), Some(RepairStatus::Completada));
        assert_eq!(RepairStatus::parse("cancelada"), None);
    }

    #[test]
    fn cost_summary_adds_labor_and_parts() {
        let summary = CostSummary::new(Decimal::new(5000, 2), Decimal::new(4000, 2), 2);
        assert_eq!(summary.total, Decimal::new(9000, 2));
        assert_eq!(summary.item_count, 2);
    }
}
