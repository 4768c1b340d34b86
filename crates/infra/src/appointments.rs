//! Appointments store.

use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tallerhub_workshop::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};

use crate::error::{StoreError, StoreResult};
use crate::page::{Page, PageParams};

/// Typed filter for the appointment listing.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct AppointmentStore {
    pool: PgPool,
}

impl AppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &AppointmentFilter,
        params: PageParams,
    ) -> StoreResult<Page<Appointment>> {
        let status = filter.status.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM citas
            WHERE ($1::text IS NULL OR estado = $1)
              AND ($2::date IS NULL OR fecha = $2)
            "#,
        )
        .bind(&status)
        .bind(filter.date)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id FROM citas
            WHERE ($1::text IS NULL OR estado = $1)
              AND ($2::date IS NULL OR fecha = $2)
            ORDER BY fecha ASC, hora ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&status)
        .bind(filter.date)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(map_appointment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> StoreResult<Appointment> {
        let row = sqlx::query(
            "SELECT id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id FROM citas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Cita no encontrada"))?;
        Ok(map_appointment(&row)?)
    }

    pub async fn by_user(&self, user_id: i64, status: Option<AppointmentStatus>) -> StoreResult<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id FROM citas
            WHERE usuario_id = $1 AND ($2::text IS NULL OR estado = $2)
            ORDER BY fecha DESC, hora DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str().to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(map_appointment)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn by_vehicle(&self, vehicle_id: i64) -> StoreResult<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id FROM citas
            WHERE vehiculo_id = $1
            ORDER BY fecha DESC, hora DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(map_appointment)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn create(&self, input: &NewAppointment) -> StoreResult<Appointment> {
        input.validate()?;

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE id = $1")
            .bind(input.user_id)
            .fetch_optional(&self.pool)
            .await?;
        if user.is_none() {
            return Err(StoreError::validation("El usuario especificado no existe"));
        }
        let vehicle: Option<i64> = sqlx::query_scalar("SELECT id FROM vehiculos WHERE id = $1")
            .bind(input.vehicle_id)
            .fetch_optional(&self.pool)
            .await?;
        if vehicle.is_none() {
            return Err(StoreError::validation("El vehículo especificado no existe"));
        }

        self.ensure_slot_free(input.date, input.time, None).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO citas (fecha, hora, descripcion, estado, usuario_id, vehiculo_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id
            "#,
        )
        .bind(input.date)
        .bind(input.time)
        .bind(&input.description)
        .bind(input.effective_status().as_str())
        .bind(input.user_id)
        .bind(input.vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_appointment(&row)?)
    }

    pub async fn update(&self, id: i64, patch: &AppointmentPatch) -> StoreResult<Appointment> {
        let current = self.get(id).await?;

        if patch.moves_slot() {
            let (date, time) = patch.target_slot(&current);
            self.ensure_slot_free(date, time, Some(id)).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE citas SET
                fecha = COALESCE($2, fecha),
                hora = COALESCE($3, hora),
                descripcion = COALESCE($4, descripcion),
                estado = COALESCE($5, estado),
                usuario_id = COALESCE($6, usuario_id),
                vehiculo_id = COALESCE($7, vehiculo_id)
            WHERE id = $1
            RETURNING id, fecha, hora, descripcion, estado, usuario_id, vehiculo_id
            "#,
        )
        .bind(id)
        .bind(patch.date)
        .bind(patch.time)
        .bind(&patch.description)
        .bind(patch.status.map(|s| s.as_str().to_string()))
        .bind(patch.user_id)
        .bind(patch.vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_appointment(&row)?)
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let affected = sqlx::query("DELETE FROM citas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("Cita no encontrada"));
        }
        Ok(())
    }

    /// Reject a booking when a non-cancelled appointment already occupies
    /// the slot. `exclude` skips the appointment being rescheduled.
    async fn ensure_slot_free(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<i64>,
    ) -> StoreResult<()> {
        let taken: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM citas
            WHERE fecha = $1 AND hora = $2 AND estado <> 'cancelada'
              AND ($3::bigint IS NULL OR id <> $3)
            "#,
        )
        .bind(date)
        .bind(time)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        if taken.is_some() {
            return Err(StoreError::conflict(
                "Ya existe una cita programada para esta fecha y hora",
            ));
        }
        Ok(())
    }
}

fn map_appointment(row: &PgRow) -> Result<Appointment, sqlx::Error> {
    let estado: String = row.try_get("estado")?;
    Ok(Appointment {
        id: row.try_get("id")?,
        date: row.try_get("fecha")?,
        time: row.try_get("hora")?,
        description: row.try_get("descripcion")?,
        status: AppointmentStatus::parse(&estado)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown estado: {estado}").into()))?,
        user_id: row.try_get("usuario_id")?,
        vehicle_id: row.try_get("vehiculo_id")?,
    })
}
