use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use tallerhub_auth::Role;
use tallerhub_infra::users::UserFilter;
use tallerhub_infra::PageParams;
use tallerhub_workshop::{NewUser, UserPatch};

use crate::app::routes::page_json;
use crate::app::services::Stores;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/estadisticas/totales", get(user_stats))
        .route("/rol/:rol", get(users_by_role))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

pub async fn list_users(
    Extension(stores): Extension<Arc<Stores>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<dto::ListUsersQuery>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    let role = match parse_role_filter(query.rol.as_deref()) {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    let filter = UserFilter {
        role,
        search: query.buscar,
    };
    let params = PageParams::new(query.pagina, query.limite);

    match stores.users.list(&filter, params).await {
        Ok(page) => page_json(&page, page.items.iter().map(dto::user_to_json).collect()),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.users.get(id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": dto::user_to_json(&user) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(stores): Extension<Arc<Stores>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    let input = NewUser {
        name: body.nombre.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        role: body.rol.as_deref().and_then(Role::parse),
        phone: body.telefono.unwrap_or_default(),
    };
    if let Err(e) = input.validate() {
        return errors::store_error_to_response(e.into());
    }

    let password_hash = match tallerhub_auth::hash_password(&input.password) {
        Ok(hash) => hash,
        Err(e) => return errors::store_error_to_response(e.into()),
    };

    match stores.users.create(&input, &password_hash).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Usuario creado exitosamente",
                "data": dto::user_to_json(&created),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let patch = UserPatch {
        name: body.nombre,
        email: body.email,
        password: body.password,
        // Unknown role names are ignored, as account creation does.
        role: body.rol.as_deref().and_then(Role::parse),
        phone: body.telefono,
    };

    let password_hash = match &patch.password {
        Some(password) => match tallerhub_auth::hash_password(password) {
            Ok(hash) => Some(hash),
            Err(e) => return errors::store_error_to_response(e.into()),
        },
        None => None,
    };

    match stores.users.update(id, &patch, password_hash.as_deref()).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Usuario actualizado exitosamente",
                "data": dto::user_to_json(&updated),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(stores): Extension<Arc<Stores>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    match stores.users.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Usuario eliminado exitosamente",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn users_by_role(
    Extension(stores): Extension<Arc<Stores>>,
    Path(rol): Path<String>,
) -> axum::response::Response {
    let role = match Role::parse(&rol) {
        Some(role) => role,
        None => return errors::json_error(StatusCode::BAD_REQUEST, "Rol no válido"),
    };

    let filter = UserFilter {
        role: Some(role),
        search: None,
    };
    match stores
        .users
        .list(&filter, PageParams::new(None, Some(100)))
        .await
    {
        Ok(page) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": page.items.iter().map(dto::user_to_json).collect::<Vec<_>>(),
                "total": page.total,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn user_stats(
    Extension(stores): Extension<Arc<Stores>>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    match stores.users.count_by_role().await {
        Ok(counts) => {
            let total: i64 = counts.iter().map(|(_, n)| n).sum();
            let por_rol: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(role, n)| (role.as_str().to_string(), serde_json::json!(n)))
                .collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "data": { "total": total, "por_rol": por_rol },
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_role_filter(value: Option<&str>) -> Result<Option<Role>, axum::response::Response> {
    match value {
        None => Ok(None),
        Some(s) => Role::parse(s)
            .map(Some)
            .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "Rol no válido")),
    }
}
