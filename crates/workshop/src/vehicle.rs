use serde::{Deserialize, Serialize};

use tallerhub_core::{DomainError, DomainResult};

/// The earliest model year the registry accepts.
const MIN_YEAR: i32 = 1900;

/// A client's vehicle. Plates are stored uppercase and are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub owner_id: i64,
}

/// The subset of vehicle fields embedded in repair responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub plate: String,
}

/// Input for registering a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub owner_id: i64,
}

impl NewVehicle {
    /// Validate against `current_year` so the check stays deterministic.
    pub fn validate(&self, current_year: i32) -> DomainResult<()> {
        if self.make.trim().is_empty() || self.model.trim().is_empty() || self.plate.trim().is_empty()
        {
            return Err(DomainError::validation(
                "Marca, modelo, año, placa y usuario_id son campos requeridos",
            ));
        }
        validate_year(self.year, current_year)
    }

    /// Plate as stored: uppercase.
    pub fn normalized_plate(&self) -> String {
        self.plate.to_uppercase()
    }
}

/// Partial update for a vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehiclePatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub plate: Option<String>,
    pub owner_id: Option<i64>,
}

impl VehiclePatch {
    pub fn validate(&self, current_year: i32) -> DomainResult<()> {
        if let Some(year) = self.year {
            validate_year(year, current_year)?;
        }
        Ok(())
    }

    pub fn normalized_plate(&self) -> Option<String> {
        self.plate.as_ref().map(|p| p.to_uppercase())
    }
}

fn validate_year(year: i32, current_year: i32) -> DomainResult<()> {
    // Next-year models are already on the street when they go on sale.
    let max = current_year + 1;
    if year < MIN_YEAR || year > max {
        return Err(DomainError::validation(format!(
            "El año debe ser un número válido entre {MIN_YEAR} y {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vehicle() -> NewVehicle {
        NewVehicle {
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2020,
            plate: "abc-123".to_string(),
            owner_id: 1,
        }
    }

    #[test]
    fn valid_vehicle_passes_and_normalizes_plate() {
        let vehicle = new_vehicle();
        assert!(vehicle.validate(2026).is_ok());
        assert_eq!(vehicle.normalized_plate(), "ABC-123");
    }

    #[test]
    fn year_range_is_enforced() {
        let mut vehicle = new_vehicle();
        vehicle.year = 1899;
        assert!(vehicle.validate(2026).is_err());

        vehicle.year = 2027;
        assert!(vehicle.validate(2026).is_ok());

        vehicle.year = 2028;
        assert!(vehicle.validate(2026).is_err());
    }

    #[test]
    fn blank_plate_is_rejected() {
        let mut vehicle = new_vehicle();
        vehicle.plate = " ".to_string();
        assert!(matches!(
            vehicle.validate(2026),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patch_only_checks_fields_it_carries() {
        let patch = VehiclePatch {
            year: Some(1850),
            ..VehiclePatch::default()
        };
        assert!(patch.validate(2026).is_err());
        assert!(VehiclePatch::default().validate(2026).is_ok());
    }
}
