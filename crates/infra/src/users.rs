//! User accounts store.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tallerhub_auth::Role;
use tallerhub_workshop::{NewUser, User, UserPatch};

use crate::error::{StoreError, StoreResult};
use crate::page::{Page, PageParams};

/// Typed filter for the user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring over name and email.
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &UserFilter, params: PageParams) -> StoreResult<Page<User>> {
        let role = filter.role.map(|r| r.as_str().to_string());
        let search = filter.search.clone();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM usuarios
            WHERE ($1::text IS NULL OR rol = $1)
              AND ($2::text IS NULL OR nombre ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(&role)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, nombre, email, rol, telefono FROM usuarios
            WHERE ($1::text IS NULL OR rol = $1)
              AND ($2::text IS NULL OR nombre ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&role)
        .bind(&search)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(map_user).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> StoreResult<User> {
        let row = sqlx::query("SELECT id, nombre, email, rol, telefono FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("Usuario no encontrado"))?;
        Ok(map_user(&row)?)
    }

    pub async fn create(&self, input: &NewUser, password_hash: &str) -> StoreResult<User> {
        input.validate()?;
        let email = input.normalized_email();

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(StoreError::conflict(
                "Ya existe un usuario registrado con este email",
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO usuarios (nombre, email, password_hash, rol, telefono)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nombre, email, rol, telefono
            "#,
        )
        .bind(&input.name)
        .bind(&email)
        .bind(password_hash)
        .bind(input.effective_role().as_str())
        .bind(&input.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_user(&row)?)
    }

    /// Apply a partial update. `password_hash` is the already-hashed
    /// replacement when the patch carries a new password.
    pub async fn update(
        &self,
        id: i64,
        patch: &UserPatch,
        password_hash: Option<&str>,
    ) -> StoreResult<User> {
        patch.validate()?;
        let current = self.get(id).await?;

        if let Some(email) = patch.normalized_email() {
            if email != current.email {
                let taken: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM usuarios WHERE email = $1 AND id <> $2")
                        .bind(&email)
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await?;
                if taken.is_some() {
                    return Err(StoreError::conflict("Ya existe otro usuario con este email"));
                }
            }
        }

        let row = sqlx::query(
            r#"
            UPDATE usuarios SET
                nombre = COALESCE($2, nombre),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                rol = COALESCE($5, rol),
                telefono = COALESCE($6, telefono)
            WHERE id = $1
            RETURNING id, nombre, email, rol, telefono
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.normalized_email())
        .bind(password_hash)
        .bind(patch.role.map(|r| r.as_str().to_string()))
        .bind(&patch.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_user(&row)?)
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let affected = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("Usuario no encontrado"));
        }
        Ok(())
    }

    /// Account totals per role, for the admin statistics endpoint.
    pub async fn count_by_role(&self) -> StoreResult<Vec<(Role, i64)>> {
        let rows = sqlx::query("SELECT rol, COUNT(*) AS total FROM usuarios GROUP BY rol ORDER BY rol")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in &rows {
            let rol: String = row.try_get("rol")?;
            counts.push((decode_role(&rol)?, row.try_get("total")?));
        }
        Ok(counts)
    }
}

fn map_user(row: &PgRow) -> Result<User, sqlx::Error> {
    let rol: String = row.try_get("rol")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("nombre")?,
        email: row.try_get("email")?,
        role: decode_role(&rol)?,
        phone: row.try_get("telefono")?,
    })
}

fn decode_role(value: &str) -> Result<Role, sqlx::Error> {
    Role::parse(value).ok_or_else(|| sqlx::Error::Decode(format!("unknown role: {value}").into()))
}
