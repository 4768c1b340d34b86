//! Repair jobs store.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tallerhub_repairs::{NewRepair, RepairJob, RepairPatch, RepairStatus};
use tallerhub_workshop::{UserSummary, VehicleSummary};

use crate::error::{StoreError, StoreResult};
use crate::page::{Page, PageParams};

/// Typed filter for the repair listing.
#[derive(Debug, Clone, Default)]
pub struct RepairFilter {
    pub user_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub status: Option<RepairStatus>,
    /// Inclusive lower bound on the start date.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the start date.
    pub to: Option<DateTime<Utc>>,
}

/// A repair joined with the summaries the API embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairRecord {
    pub repair: RepairJob,
    pub user: UserSummary,
    pub vehicle: VehicleSummary,
}

const RECORD_COLUMNS: &str = r#"
    r.id, r.fecha_inicio, r.fecha_fin, r.descripcion, r.costo, r.estado,
    r.usuario_id, r.vehiculo_id,
    u.nombre AS usuario_nombre, u.email AS usuario_email,
    v.marca AS vehiculo_marca, v.modelo AS vehiculo_modelo, v.placa AS vehiculo_placa
"#;

#[derive(Clone)]
pub struct RepairStore {
    pool: PgPool,
}

impl RepairStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &RepairFilter,
        params: PageParams,
    ) -> StoreResult<Page<RepairRecord>> {
        let status = filter.status.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reparaciones r
            WHERE ($1::bigint IS NULL OR r.usuario_id = $1)
              AND ($2::bigint IS NULL OR r.vehiculo_id = $2)
              AND ($3::text IS NULL OR r.estado = $3)
              AND ($4::timestamptz IS NULL OR r.fecha_inicio >= $4)
              AND ($5::timestamptz IS NULL OR r.fecha_inicio <= $5)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.vehicle_id)
        .bind(&status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM reparaciones r
            JOIN usuarios u ON u.id = r.usuario_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE ($1::bigint IS NULL OR r.usuario_id = $1)
              AND ($2::bigint IS NULL OR r.vehiculo_id = $2)
              AND ($3::text IS NULL OR r.estado = $3)
              AND ($4::timestamptz IS NULL OR r.fecha_inicio >= $4)
              AND ($5::timestamptz IS NULL OR r.fecha_inicio <= $5)
            ORDER BY r.fecha_inicio DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.vehicle_id)
        .bind(&status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(map_record).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> StoreResult<RepairRecord> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM reparaciones r
            JOIN usuarios u ON u.id = r.usuario_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE r.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Reparación no encontrada"))?;
        Ok(map_record(&row)?)
    }

    pub async fn create(&self, input: &NewRepair) -> StoreResult<RepairRecord> {
        let status = input.validate()?;

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

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reparaciones
                (fecha_inicio, fecha_fin, descripcion, costo, estado, usuario_id, vehiculo_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.started_at)
        .bind(input.finished_at)
        .bind(&input.description)
        .bind(input.labor_cost)
        .bind(status.as_str())
        .bind(input.user_id)
        .bind(input.vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn update(&self, id: i64, patch: &RepairPatch) -> StoreResult<RepairRecord> {
        let current = self.get(id).await?.repair;
        patch.validate(&current)?;

        if let Some(user_id) = patch.user_id {
            if user_id != current.user_id {
                let user: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
                if user.is_none() {
                    return Err(StoreError::validation("El usuario especificado no existe"));
                }
            }
        }
        if let Some(vehicle_id) = patch.vehicle_id {
            if vehicle_id != current.vehicle_id {
                let vehicle: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM vehiculos WHERE id = $1")
                        .bind(vehicle_id)
                        .fetch_optional(&self.pool)
                        .await?;
                if vehicle.is_none() {
                    return Err(StoreError::validation("El vehículo especificado no existe"));
                }
            }
        }

        sqlx::query(
            r#"
            UPDATE reparaciones SET
                fecha_inicio = COALESCE($2, fecha_inicio),
                fecha_fin = CASE WHEN $3 THEN $4 ELSE fecha_fin END,
                descripcion = COALESCE($5, descripcion),
                costo = COALESCE($6, costo),
                estado = COALESCE($7, estado),
                usuario_id = COALESCE($8, usuario_id),
                vehiculo_id = COALESCE($9, vehiculo_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.started_at)
        .bind(patch.finished_at.is_some())
        .bind(patch.finished_at.flatten())
        .bind(&patch.description)
        .bind(patch.labor_cost)
        .bind(patch.status.map(|s| s.as_str().to_string()))
        .bind(patch.user_id)
        .bind(patch.vehicle_id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Delete a repair. Repairs that still consume inventory are protected;
    /// detaching the parts first restores their stock.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let linked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM reparacion_inventario WHERE reparacion_id = $1 LIMIT 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if linked.is_some() {
            return Err(StoreError::conflict(
                "No se puede eliminar: la reparación tiene items de inventario asociados",
            ));
        }

        let affected = sqlx::query("DELETE FROM reparaciones WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("Reparación no encontrada"));
        }
        Ok(())
    }

    pub async fn by_user(
        &self,
        user_id: i64,
        status: Option<RepairStatus>,
        limit: i64,
    ) -> StoreResult<Vec<RepairRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM reparaciones r
            JOIN usuarios u ON u.id = r.usuario_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE r.usuario_id = $1 AND ($2::text IS NULL OR r.estado = $2)
            ORDER BY r.fecha_inicio DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str().to_string()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_record).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn by_vehicle(&self, vehicle_id: i64, limit: i64) -> StoreResult<Vec<RepairRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM reparaciones r
            JOIN usuarios u ON u.id = r.usuario_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE r.vehiculo_id = $1
            ORDER BY r.fecha_inicio DESC
            LIMIT $2
            "#
        ))
        .bind(vehicle_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_record).collect::<Result<Vec<_>, _>>()?)
    }

    /// Open repairs, oldest first (the workshop's work queue).
    pub async fn in_progress(&self, limit: i64) -> StoreResult<Vec<RepairRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM reparaciones r
            JOIN usuarios u ON u.id = r.usuario_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE r.estado = 'en_proceso' AND r.fecha_fin IS NULL
            ORDER BY r.fecha_inicio ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_record).collect::<Result<Vec<_>, _>>()?)
    }

    /// Close a repair: stamp the end date and optionally settle the labor
    /// cost. Rejects repairs that are already closed.
    pub async fn complete(
        &self,
        id: i64,
        labor_cost: Option<rust_decimal::Decimal>,
    ) -> StoreResult<RepairRecord> {
        let current = self.get(id).await?.repair;
        if current.status == RepairStatus::Completada {
            return Err(StoreError::validation("La reparación ya está completada"));
        }
        if let Some(cost) = labor_cost {
            if cost < rust_decimal::Decimal::ZERO {
                return Err(StoreError::validation(
                    "El costo debe ser un número válido mayor o igual a 0",
                ));
            }
        }

        sqlx::query(
            r#"
            UPDATE reparaciones SET
                fecha_fin = $2,
                estado = 'completada',
                costo = COALESCE($3, costo)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .bind(labor_cost)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }
}

fn map_record(row: &PgRow) -> Result<RepairRecord, sqlx::Error> {
    let estado: String = row.try_get("estado")?;
    Ok(RepairRecord {
        repair: RepairJob {
            id: row.try_get("id")?,
            started_at: row.try_get("fecha_inicio")?,
            finished_at: row.try_get("fecha_fin")?,
            description: row.try_get("descripcion")?,
            labor_cost: row.try_get("costo")?,
            status: RepairStatus::parse(&estado)
                .ok_or_else(|| sqlx::Error::Decode(format!("unknown estado: {estado}").into()))?,
            user_id: row.try_get("usuario_id")?,
            vehicle_id: row.try_get("vehiculo_id")?,
        },
        user: UserSummary {
            id: row.try_get("usuario_id")?,
            name: row.try_get("usuario_nombre")?,
            email: row.try_get("usuario_email")?,
        },
        vehicle: VehicleSummary {
            id: row.try_get("vehiculo_id")?,
            make: row.try_get("vehiculo_marca")?,
            model: row.try_get("vehiculo_modelo")?,
            plate: row.try_get("vehiculo_placa")?,
        },
    })
}
