use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::Decimal;

use tallerhub_infra::repairs::RepairFilter;
use tallerhub_infra::PageParams;
use tallerhub_repairs::{NewRepair, RepairPatch, RepairStatus};

use crate::app::routes::{page_json, reparacion_inventario};
use crate::app::services::Stores;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_repairs).post(create_repair))
        .route("/estado/en-proceso", get(repairs_in_progress))
        .route("/usuario/:usuarioId", get(repairs_by_user))
        .route("/vehiculo/:vehiculoId", get(repairs_by_vehicle))
        .route(
            "/:id",
            get(get_repair).put(update_repair).delete(delete_repair),
        )
        .route("/:id/completar", patch(complete_repair))
        .route("/:id/costo-total", get(repair_total_cost))
        .merge(reparacion_inventario::repairs_router())
}

pub async fn list_repairs(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::ListRepairsQuery>,
) -> axum::response::Response {
    let status = match parse_status_filter(query.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    let filter = RepairFilter {
        user_id: query.usuario_id,
        vehicle_id: query.vehiculo_id,
        status,
        from: query
            .fecha_inicio
            .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc()),
        to: query
            .fecha_fin
            .map(|d| d.and_hms_opt(23, 59, 59).unwrap().and_utc()),
    };
    let params = PageParams::new(query.pagina, query.limite);

    match stores.repairs.list(&filter, params).await {
        Ok(page) => page_json(&page, page.items.iter().map(dto::repair_to_json).collect()),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_repair(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.repairs.get(id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": dto::repair_to_json(&record) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_repair(
    Extension(stores): Extension<Arc<Stores>>,
    Json(body): Json<dto::CreateRepairRequest>,
) -> axum::response::Response {
    let (Some(started_at), Some(user_id), Some(vehicle_id)) =
        (body.fecha_inicio, body.usuario_id, body.vehiculo_id)
    else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "Fecha de inicio, descripción, usuario_id y vehiculo_id son campos requeridos",
        );
    };

    let input = NewRepair {
        started_at,
        finished_at: body.fecha_fin,
        description: body.descripcion.unwrap_or_default(),
        labor_cost: body.costo.unwrap_or(Decimal::ZERO),
        user_id,
        vehicle_id,
    };

    match stores.repairs.create(&input).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Reparación creada exitosamente",
                "data": dto::repair_to_json(&created),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_repair(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::UpdateRepairRequest>,
) -> axum::response::Response {
    let status = match parse_status_filter(body.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    let patch = RepairPatch {
        started_at: body.fecha_inicio,
        finished_at: body.fecha_fin,
        description: body.descripcion,
        labor_cost: body.costo,
        status,
        user_id: body.usuario_id,
        vehicle_id: body.vehiculo_id,
    };

    match stores.repairs.update(id, &patch).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Reparación actualizada exitosamente",
                "data": dto::repair_to_json(&updated),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_repair(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.repairs.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Reparación eliminada exitosamente",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn repairs_by_user(
    Extension(stores): Extension<Arc<Stores>>,
    Path(user_id): Path<i64>,
    Query(query): Query<dto::StatusQuery>,
) -> axum::response::Response {
    let status = match parse_status_filter(query.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    match stores
        .repairs
        .by_user(user_id, status, query.limite.unwrap_or(20))
        .await
    {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": records.iter().map(dto::repair_to_json).collect::<Vec<_>>(),
                "total": records.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn repairs_by_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Path(vehicle_id): Path<i64>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    match stores
        .repairs
        .by_vehicle(vehicle_id, query.limite.unwrap_or(50))
        .await
    {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": records.iter().map(dto::repair_to_json).collect::<Vec<_>>(),
                "total": records.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn repairs_in_progress(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    match stores.repairs.in_progress(query.limite.unwrap_or(20)).await {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": records.iter().map(dto::repair_to_json).collect::<Vec<_>>(),
                "total": records.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn complete_repair(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    body: Option<Json<dto::CompleteRepairRequest>>,
) -> axum::response::Response {
    let costo = body.and_then(|Json(b)| b.costo);
    match stores.repairs.complete(id, costo).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Reparación marcada como completada",
                "data": dto::repair_to_json(&record),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn repair_total_cost(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.repair_parts.cost_summary(id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": dto::cost_summary_to_json(id, &summary),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_status_filter(
    value: Option<&str>,
) -> Result<Option<RepairStatus>, axum::response::Response> {
    match value {
        None => Ok(None),
        Some(s) => RepairStatus::parse(s)
            .map(Some)
            .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "Estado no válido")),
    }
}
