//! Vehicle registry store.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tallerhub_workshop::{NewVehicle, Vehicle, VehiclePatch};

use crate::error::{StoreError, StoreResult};
use crate::page::{Page, PageParams};

/// Typed filter for the vehicle listing.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub owner_id: Option<i64>,
    pub make: Option<String>,
    /// Case-insensitive substring over make, model and plate.
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct VehicleStore {
    pool: PgPool,
}

impl VehicleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &VehicleFilter,
        params: PageParams,
    ) -> StoreResult<Page<Vehicle>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM vehiculos
            WHERE ($1::bigint IS NULL OR usuario_id = $1)
              AND ($2::text IS NULL OR marca ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR marca ILIKE '%' || $3 || '%'
                   OR modelo ILIKE '%' || $3 || '%' OR placa ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(filter.owner_id)
        .bind(&filter.make)
        .bind(&filter.search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, marca, modelo, anio, placa, usuario_id FROM vehiculos
            WHERE ($1::bigint IS NULL OR usuario_id = $1)
              AND ($2::text IS NULL OR marca ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR marca ILIKE '%' || $3 || '%'
                   OR modelo ILIKE '%' || $3 || '%' OR placa ILIKE '%' || $3 || '%')
            ORDER BY marca ASC, modelo ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.owner_id)
        .bind(&filter.make)
        .bind(&filter.search)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(map_vehicle).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> StoreResult<Vehicle> {
        let row = sqlx::query(
            "SELECT id, marca, modelo, anio, placa, usuario_id FROM vehiculos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Vehículo no encontrado"))?;
        Ok(map_vehicle(&row)?)
    }

    pub async fn by_plate(&self, plate: &str) -> StoreResult<Vehicle> {
        let row = sqlx::query(
            "SELECT id, marca, modelo, anio, placa, usuario_id FROM vehiculos WHERE placa = $1",
        )
        .bind(plate.to_uppercase())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Vehículo no encontrado"))?;
        Ok(map_vehicle(&row)?)
    }

    pub async fn by_owner(&self, owner_id: i64) -> StoreResult<Vec<Vehicle>> {
        let rows = sqlx::query(
            r#"
            SELECT id, marca, modelo, anio, placa, usuario_id FROM vehiculos
            WHERE usuario_id = $1
            ORDER BY marca ASC, modelo ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_vehicle).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn create(&self, input: &NewVehicle, current_year: i32) -> StoreResult<Vehicle> {
        input.validate(current_year)?;
        let plate = input.normalized_plate();

        let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE id = $1")
            .bind(input.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        if owner.is_none() {
            return Err(StoreError::validation("El usuario especificado no existe"));
        }

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM vehiculos WHERE placa = $1")
            .bind(&plate)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(StoreError::conflict(
                "Ya existe un vehículo registrado con esta placa",
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO vehiculos (marca, modelo, anio, placa, usuario_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, marca, modelo, anio, placa, usuario_id
            "#,
        )
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&plate)
        .bind(input.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_vehicle(&row)?)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: &VehiclePatch,
        current_year: i32,
    ) -> StoreResult<Vehicle> {
        patch.validate(current_year)?;
        let current = self.get(id).await?;

        if let Some(owner_id) = patch.owner_id {
            if owner_id != current.owner_id {
                let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE id = $1")
                    .bind(owner_id)
                    .fetch_optional(&self.pool)
                    .await?;
                if owner.is_none() {
                    return Err(StoreError::validation("El usuario especificado no existe"));
                }
            }
        }

        if let Some(plate) = patch.normalized_plate() {
            if plate != current.plate {
                let taken: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM vehiculos WHERE placa = $1 AND id <> $2")
                        .bind(&plate)
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await?;
                if taken.is_some() {
                    return Err(StoreError::conflict(
                        "Ya existe otro vehículo registrado con esta placa",
                    ));
                }
            }
        }

        let row = sqlx::query(
            r#"
            UPDATE vehiculos SET
                marca = COALESCE($2, marca),
                modelo = COALESCE($3, modelo),
                anio = COALESCE($4, anio),
                placa = COALESCE($5, placa),
                usuario_id = COALESCE($6, usuario_id)
            WHERE id = $1
            RETURNING id, marca, modelo, anio, placa, usuario_id
            "#,
        )
        .bind(id)
        .bind(&patch.make)
        .bind(&patch.model)
        .bind(patch.year)
        .bind(patch.normalized_plate())
        .bind(patch.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_vehicle(&row)?)
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let affected = sqlx::query("DELETE FROM vehiculos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("Vehículo no encontrado"));
        }
        Ok(())
    }

    /// Distinct makes present in the registry.
    pub async fn makes(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query_scalar("SELECT DISTINCT marca FROM vehiculos ORDER BY marca ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn map_vehicle(row: &PgRow) -> Result<Vehicle, sqlx::Error> {
    Ok(Vehicle {
        id: row.try_get("id")?,
        make: row.try_get("marca")?,
        model: row.try_get("modelo")?,
        year: row.try_get("anio")?,
        plate: row.try_get("placa")?,
        owner_id: row.try_get("usuario_id")?,
    })
}
