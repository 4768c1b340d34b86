//! Inventory catalog store.
//!
//! Direct stock edits use the same conditional-update primitive as the link
//! manager: a decrement only commits when the row still holds enough stock.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tallerhub_inventory::{
    InventoryItem, ItemPatch, NewItem, StockOperation, LOW_STOCK_THRESHOLD,
};

use crate::error::{StoreError, StoreResult};
use crate::page::{Page, PageParams};

/// Typed filter for the catalog listing.
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub category: Option<String>,
    /// Restrict to items below the low-stock threshold.
    pub low_stock_only: bool,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct InventoryStore {
    pool: PgPool,
}

impl InventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &InventoryFilter,
        params: PageParams,
    ) -> StoreResult<Page<InventoryItem>> {
        let low_stock_cap = if filter.low_stock_only {
            Some(LOW_STOCK_THRESHOLD)
        } else {
            None
        };

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM inventario
            WHERE ($1::text IS NULL OR categoria = $1)
              AND ($2::bigint IS NULL OR stock < $2)
              AND ($3::text IS NULL OR nombre ILIKE '%' || $3 || '%'
                   OR descripcion ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(&filter.category)
        .bind(low_stock_cap)
        .bind(&filter.search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, nombre, descripcion, categoria, precio, stock FROM inventario
            WHERE ($1::text IS NULL OR categoria = $1)
              AND ($2::bigint IS NULL OR stock < $2)
              AND ($3::text IS NULL OR nombre ILIKE '%' || $3 || '%'
                   OR descripcion ILIKE '%' || $3 || '%')
            ORDER BY nombre ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&filter.category)
        .bind(low_stock_cap)
        .bind(&filter.search)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(map_item).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> StoreResult<InventoryItem> {
        let row = sqlx::query(
            "SELECT id, nombre, descripcion, categoria, precio, stock FROM inventario WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Item no encontrado en el inventario"))?;
        Ok(map_item(&row)?)
    }

    pub async fn create(&self, input: &NewItem) -> StoreResult<InventoryItem> {
        input.validate()?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM inventario WHERE nombre = $1")
            .bind(&input.name)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(StoreError::conflict(
                "Ya existe un item en el inventario con ese nombre",
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO inventario (nombre, descripcion, categoria, precio, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nombre, descripcion, categoria, precio, stock
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_item(&row)?)
    }

    pub async fn update(&self, id: i64, patch: &ItemPatch) -> StoreResult<InventoryItem> {
        patch.validate()?;
        let current = self.get(id).await?;

        if let Some(name) = &patch.name {
            if *name != current.name {
                let taken: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM inventario WHERE nombre = $1 AND id <> $2")
                        .bind(name)
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await?;
                if taken.is_some() {
                    return Err(StoreError::conflict(
                        "Ya existe otro item en el inventario con ese nombre",
                    ));
                }
            }
        }

        let row = sqlx::query(
            r#"
            UPDATE inventario SET
                nombre = COALESCE($2, nombre),
                descripcion = COALESCE($3, descripcion),
                categoria = COALESCE($4, categoria),
                precio = COALESCE($5, precio),
                stock = COALESCE($6, stock)
            WHERE id = $1
            RETURNING id, nombre, descripcion, categoria, precio, stock
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.category)
        .bind(patch.price)
        .bind(patch.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_item(&row)?)
    }

    /// Delete a catalog item. Items still referenced by repair links are
    /// protected by the FK and reported as a business error.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let linked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM reparacion_inventario WHERE inventario_id = $1 LIMIT 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if linked.is_some() {
            return Err(StoreError::conflict(
                "No se puede eliminar: el item está asociado a reparaciones",
            ));
        }

        let affected = sqlx::query("DELETE FROM inventario WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("Item no encontrado en el inventario"));
        }
        Ok(())
    }

    /// Adjust the stock counter directly. The decrement arm is a single
    /// conditional update so a concurrent consumer cannot sneak the stock
    /// below zero between a read and a write.
    pub async fn adjust_stock(
        &self,
        id: i64,
        operation: StockOperation,
        amount: i64,
    ) -> StoreResult<InventoryItem> {
        if amount < 0 {
            return Err(StoreError::validation(
                "El stock debe ser un número entero válido mayor o igual a 0",
            ));
        }

        let row = match operation {
            StockOperation::Establecer => {
                sqlx::query(
                    r#"
                    UPDATE inventario SET stock = $2 WHERE id = $1
                    RETURNING id, nombre, descripcion, categoria, precio, stock
                    "#,
                )
                .bind(id)
                .bind(amount)
                .fetch_optional(&self.pool)
                .await?
            }
            StockOperation::Incrementar => {
                sqlx::query(
                    r#"
                    UPDATE inventario SET stock = stock + $2 WHERE id = $1
                    RETURNING id, nombre, descripcion, categoria, precio, stock
                    "#,
                )
                .bind(id)
                .bind(amount)
                .fetch_optional(&self.pool)
                .await?
            }
            StockOperation::Decrementar => {
                let row = sqlx::query(
                    r#"
                    UPDATE inventario SET stock = stock - $2
                    WHERE id = $1 AND stock >= $2
                    RETURNING id, nombre, descripcion, categoria, precio, stock
                    "#,
                )
                .bind(id)
                .bind(amount)
                .fetch_optional(&self.pool)
                .await?;

                match row {
                    Some(row) => Some(row),
                    None => {
                        // Missing row and insufficient stock both land here;
                        // re-read to tell them apart and report availability.
                        let current = self.get(id).await?;
                        return Err(StoreError::insufficient_stock(current.stock, amount));
                    }
                }
            }
        };

        let row = row.ok_or_else(|| StoreError::not_found("Item no encontrado en el inventario"))?;
        Ok(map_item(&row)?)
    }

    /// Items under the low-stock threshold, scarcest first.
    pub async fn low_stock(&self, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, nombre, descripcion, categoria, precio, stock FROM inventario
            WHERE stock < $1
            ORDER BY stock ASC
            LIMIT $2
            "#,
        )
        .bind(LOW_STOCK_THRESHOLD)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_item).collect::<Result<Vec<_>, _>>()?)
    }

    /// Distinct categories present in the catalog.
    pub async fn categories(&self) -> StoreResult<Vec<String>> {
        let rows =
            sqlx::query_scalar("SELECT DISTINCT categoria FROM inventario ORDER BY categoria ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

fn map_item(row: &PgRow) -> Result<InventoryItem, sqlx::Error> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        name: row.try_get("nombre")?,
        description: row.try_get("descripcion")?,
        category: row.try_get("categoria")?,
        price: row.try_get("precio")?,
        stock: row.try_get("stock")?,
    })
}
