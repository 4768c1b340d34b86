use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};

use tallerhub_infra::Page;

pub mod citas;
pub mod inventario;
pub mod reparacion_inventario;
pub mod reparaciones;
pub mod system;
pub mod usuarios;
pub mod vehiculos;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .nest("/usuarios", usuarios::router())
        .nest("/vehiculos", vehiculos::router())
        .nest("/citas", citas::router())
        .nest("/reparaciones", reparaciones::router())
        .nest("/inventario", inventario::router())
}

/// Paginated envelope shared by the listing endpoints.
pub(crate) fn page_json<T>(
    page: &Page<T>,
    data: Vec<serde_json::Value>,
) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "data": data,
            "total": page.total,
            "paginas": page.pages,
            "pagina": page.page,
        })),
    )
        .into_response()
}
