//! Repair/inventory link manager and cost aggregator.
//!
//! Every stock-affecting operation here (attach, update, detach) mutates the
//! link row and the item's stock counter inside one transaction; either both
//! commit or neither does. Decrements go through a conditional update
//! (`... AND stock >= $n`) so concurrent consumers of the same item serialize
//! on the row and can never drive stock negative. Business-rule checks run
//! before any mutation, with enough context in the error to act on
//! (available stock, conflicting association).

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use tallerhub_inventory::ItemSummary;
use tallerhub_repairs::{
    ensure_available, parts_cost, stock_delta, AttachPart, CostSummary, PartUsage, PartUsagePatch,
    RepairStatus,
};
use tallerhub_workshop::VehicleSummary;

use crate::error::{StoreError, StoreResult};

/// A link joined with the item summary the API embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct PartUsageRecord {
    pub usage: PartUsage,
    pub item: ItemSummary,
}

/// All links of one repair plus the aggregate the listing reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PartsList {
    pub items: Vec<PartUsageRecord>,
    pub total: Decimal,
    pub count: i64,
}

/// A repair that currently consumes a given item, as seen from the item's
/// usage history.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageHistoryEntry {
    pub usage: PartUsage,
    pub description: String,
    pub status: RepairStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub vehicle: VehicleSummary,
}

/// Usage history response: the item plus the repairs linked to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageHistory {
    pub item: ItemSummary,
    pub entries: Vec<UsageHistoryEntry>,
}

const USAGE_COLUMNS: &str = r#"
    ri.id, ri.reparacion_id, ri.inventario_id, ri.cantidad, ri.precio_unitario, ri.created_at,
    i.nombre AS item_nombre, i.descripcion AS item_descripcion, i.categoria AS item_categoria
"#;

#[derive(Clone)]
pub struct RepairPartsStore {
    pool: PgPool,
}

impl RepairPartsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach an inventory item to a repair, consuming stock.
    pub async fn attach(&self, repair_id: i64, input: &AttachPart) -> StoreResult<PartUsageRecord> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        ensure_repair_exists(&mut tx, repair_id).await?;
        let stock = fetch_stock(&mut tx, input.item_id).await?;
        ensure_available(stock, input.quantity)?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM reparacion_inventario WHERE reparacion_id = $1 AND inventario_id = $2",
        )
        .bind(repair_id)
        .bind(input.item_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(StoreError::conflict(
                "Este item ya está asociado a la reparación",
            ));
        }

        // The conditional update is the authority on availability; the read
        // above only produces the friendly error before anything mutates.
        take_stock(&mut tx, input.item_id, input.quantity).await?;

        let link_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reparacion_inventario (reparacion_id, inventario_id, cantidad, precio_unitario)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(repair_id)
        .bind(input.item_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .fetch_one(&mut *tx)
        .await?;

        let record = fetch_record(&mut tx, link_id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// All links of a repair, ordered by link id, with the parts total.
    pub async fn list(&self, repair_id: i64) -> StoreResult<PartsList> {
        let mut tx = self.pool.begin().await?;
        ensure_repair_exists(&mut tx, repair_id).await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {USAGE_COLUMNS}
            FROM reparacion_inventario ri
            JOIN inventario i ON i.id = ri.inventario_id
            WHERE ri.reparacion_id = $1
            ORDER BY ri.id ASC
            "#
        ))
        .bind(repair_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let items = rows
            .iter()
            .map(map_usage_record)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        let total = parts_cost(items.iter().map(|r| (r.usage.quantity, r.usage.unit_price)));
        let count = items.len() as i64;

        Ok(PartsList {
            items,
            total,
            count,
        })
    }

    /// Change a link's quantity and/or price snapshot, adjusting stock by
    /// the signed quantity difference.
    pub async fn update(
        &self,
        repair_id: i64,
        link_id: i64,
        patch: &PartUsagePatch,
    ) -> StoreResult<PartUsageRecord> {
        patch.validate()?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT ri.cantidad, ri.inventario_id, i.stock
            FROM reparacion_inventario ri
            JOIN inventario i ON i.id = ri.inventario_id
            WHERE ri.id = $1 AND ri.reparacion_id = $2
            "#,
        )
        .bind(link_id)
        .bind(repair_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Item no encontrado en esta reparación"))?;

        let current_quantity: i64 = row.try_get("cantidad")?;
        let item_id: i64 = row.try_get("inventario_id")?;
        let stock: i64 = row.try_get("stock")?;

        if let Some(new_quantity) = patch.quantity {
            let delta = stock_delta(current_quantity, new_quantity);
            if delta > 0 {
                ensure_available(stock, delta)?;
                take_stock(&mut tx, item_id, delta).await?;
            } else if delta < 0 {
                restore_stock(&mut tx, item_id, -delta).await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE reparacion_inventario SET
                cantidad = COALESCE($2, cantidad),
                precio_unitario = COALESCE($3, precio_unitario)
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .bind(patch.quantity)
        .bind(patch.unit_price)
        .execute(&mut *tx)
        .await?;

        let record = fetch_record(&mut tx, link_id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Remove a link, returning its current quantity to stock.
    pub async fn detach(&self, repair_id: i64, link_id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT cantidad, inventario_id FROM reparacion_inventario
            WHERE id = $1 AND reparacion_id = $2
            "#,
        )
        .bind(link_id)
        .bind(repair_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Item no encontrado en esta reparación"))?;

        let quantity: i64 = row.try_get("cantidad")?;
        let item_id: i64 = row.try_get("inventario_id")?;

        restore_stock(&mut tx, item_id, quantity).await?;
        sqlx::query("DELETE FROM reparacion_inventario WHERE id = $1")
            .bind(link_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Repairs currently consuming an item, newest first. Detached links do
    /// not appear; the history reflects live associations only.
    pub async fn usage_history(&self, item_id: i64) -> StoreResult<UsageHistory> {
        let item_row = sqlx::query(
            "SELECT id, nombre, descripcion, categoria FROM inventario WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Item de inventario no encontrado"))?;

        let item = ItemSummary {
            id: item_row.try_get("id")?,
            name: item_row.try_get("nombre")?,
            description: item_row.try_get("descripcion")?,
            category: item_row.try_get("categoria")?,
        };

        let rows = sqlx::query(
            r#"
            SELECT ri.id, ri.reparacion_id, ri.inventario_id, ri.cantidad, ri.precio_unitario,
                   ri.created_at,
                   r.descripcion AS reparacion_descripcion, r.estado, r.fecha_inicio, r.fecha_fin,
                   v.id AS vehiculo_id, v.marca, v.modelo, v.placa
            FROM reparacion_inventario ri
            JOIN reparaciones r ON r.id = ri.reparacion_id
            JOIN vehiculos v ON v.id = r.vehiculo_id
            WHERE ri.inventario_id = $1
            ORDER BY r.fecha_inicio DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(map_history_entry(row)?);
        }

        Ok(UsageHistory { item, entries })
    }

    /// Cost breakdown for a repair: labor plus consumed parts.
    pub async fn cost_summary(&self, repair_id: i64) -> StoreResult<CostSummary> {
        let labor: Decimal = sqlx::query_scalar("SELECT costo FROM reparaciones WHERE id = $1")
            .bind(repair_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("Reparación no encontrada"))?;

        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(cantidad * precio_unitario), 0) AS parts, COUNT(*) AS item_count
            FROM reparacion_inventario
            WHERE reparacion_id = $1
            "#,
        )
        .bind(repair_id)
        .fetch_one(&self.pool)
        .await?;

        let parts: Decimal = row.try_get("parts")?;
        let item_count: i64 = row.try_get("item_count")?;
        Ok(CostSummary::new(labor, parts, item_count))
    }
}

async fn ensure_repair_exists(
    tx: &mut Transaction<'_, Postgres>,
    repair_id: i64,
) -> StoreResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM reparaciones WHERE id = $1")
        .bind(repair_id)
        .fetch_optional(&mut **tx)
        .await?;
    if found.is_none() {
        return Err(StoreError::not_found("Reparación no encontrada"));
    }
    Ok(())
}

async fn fetch_stock(tx: &mut Transaction<'_, Postgres>, item_id: i64) -> StoreResult<i64> {
    sqlx::query_scalar("SELECT stock FROM inventario WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Item de inventario no encontrado"))
}

/// Consume stock with a conditional update. A zero-row result means a
/// concurrent consumer got there first; re-read and report availability.
async fn take_stock(
    tx: &mut Transaction<'_, Postgres>,
    item_id: i64,
    quantity: i64,
) -> StoreResult<()> {
    let affected = sqlx::query("UPDATE inventario SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if affected == 0 {
        let available = fetch_stock(tx, item_id).await?;
        return Err(StoreError::insufficient_stock(available, quantity));
    }
    Ok(())
}

async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    item_id: i64,
    quantity: i64,
) -> StoreResult<()> {
    sqlx::query("UPDATE inventario SET stock = stock + $2 WHERE id = $1")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn fetch_record(
    tx: &mut Transaction<'_, Postgres>,
    link_id: i64,
) -> StoreResult<PartUsageRecord> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {USAGE_COLUMNS}
        FROM reparacion_inventario ri
        JOIN inventario i ON i.id = ri.inventario_id
        WHERE ri.id = $1
        "#
    ))
    .bind(link_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(map_usage_record(&row)?)
}

fn map_usage(row: &PgRow) -> Result<PartUsage, sqlx::Error> {
    Ok(PartUsage {
        id: row.try_get("id")?,
        repair_id: row.try_get("reparacion_id")?,
        item_id: row.try_get("inventario_id")?,
        quantity: row.try_get("cantidad")?,
        unit_price: row.try_get("precio_unitario")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_usage_record(row: &PgRow) -> Result<PartUsageRecord, sqlx::Error> {
    Ok(PartUsageRecord {
        usage: map_usage(row)?,
        item: ItemSummary {
            id: row.try_get("inventario_id")?,
            name: row.try_get("item_nombre")?,
            description: row.try_get("item_descripcion")?,
            category: row.try_get("item_categoria")?,
        },
    })
}

fn map_history_entry(row: &PgRow) -> Result<UsageHistoryEntry, sqlx::Error> {
    let estado: String = row.try_get("estado")?;
    Ok(UsageHistoryEntry {
        usage: map_usage(row)?,
        description: row.try_get("reparacion_descripcion")?,
        status: RepairStatus::parse(&estado)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown estado: {estado}").into()))?,
        started_at: row.try_get("fecha_inicio")?,
        finished_at: row.try_get("fecha_fin")?,
        vehicle: VehicleSummary {
            id: row.try_get("vehiculo_id")?,
            make: row.try_get("marca")?,
            model: row.try_get("modelo")?,
            plate: row.try_get("placa")?,
        },
    })
}
