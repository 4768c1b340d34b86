use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use tallerhub_core::{DomainError, DomainResult};

/// Appointment lifecycle. Cancelled appointments free their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Programada,
    Completada,
    Cancelada,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Programada => "programada",
            AppointmentStatus::Completada => "completada",
            AppointmentStatus::Cancelada => "cancelada",
        }
    }

    pub fn parse(s: &str) -> Option<AppointmentStatus> {
        match s {
            "programada" => Some(AppointmentStatus::Programada),
            "completada" => Some(AppointmentStatus::Completada),
            "cancelada" => Some(AppointmentStatus::Cancelada),
            _ => None,
        }
    }
}

impl core::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled visit. One non-cancelled appointment per (date, time) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub status: AppointmentStatus,
    pub user_id: i64,
    pub vehicle_id: i64,
}

/// Input for booking an appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub status: Option<AppointmentStatus>,
    pub user_id: i64,
    pub vehicle_id: i64,
}

impl NewAppointment {
    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(
                "Fecha, hora, usuario_id y vehiculo_id son campos requeridos",
            ));
        }
        Ok(())
    }

    pub fn effective_status(&self) -> AppointmentStatus {
        self.status.unwrap_or(AppointmentStatus::Programada)
    }
}

/// Partial update for an appointment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub description: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub user_id: Option<i64>,
    pub vehicle_id: Option<i64>,
}

impl AppointmentPatch {
    /// The slot the appointment would occupy after this patch.
    pub fn target_slot(&self, current: &Appointment) -> (NaiveDate, NaiveTime) {
        (
            self.date.unwrap_or(current.date),
            self.time.unwrap_or(current.time),
        )
    }

    pub fn moves_slot(&self) -> bool {
        self.date.is_some() || self.time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_appointment() -> NewAppointment {
        NewAppointment {
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            description: "Revisión general".to_string(),
            status: None,
            user_id: 1,
            vehicle_id: 1,
        }
    }

    #[test]
    fn status_defaults_to_programada() {
        assert_eq!(
            new_appointment().effective_status(),
            AppointmentStatus::Programada
        );
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut appt = new_appointment();
        appt.description = String::new();
        assert!(matches!(appt.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_reports_the_target_slot() {
        let appt = Appointment {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            description: "Revisión general".to_string(),
            status: AppointmentStatus::Programada,
            user_id: 1,
            vehicle_id: 1,
        };

        let patch = AppointmentPatch {
            time: Some(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            ..AppointmentPatch::default()
        };
        assert!(patch.moves_slot());
        assert_eq!(
            patch.target_slot(&appt),
            (
                NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap()
            )
        );

        assert!(!AppointmentPatch::default().moves_slot());
    }

    #[test]
    fn status_parse_matches_serde_names() {
        assert_eq!(
            AppointmentStatus::parse("cancelada"),
            Some(AppointmentStatus::Cancelada)
        );
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Programada).unwrap(),
            "\"programada\""
        );
    }
}
