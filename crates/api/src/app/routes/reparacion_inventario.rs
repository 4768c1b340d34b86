//! Inventory consumption by repairs (the repair/inventory association).
//!
//! Mounted in two places: the repair-side routes live under
//! `/reparaciones/:id/inventario`, the item-side usage history under
//! `/inventario/:id/reparaciones`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use tallerhub_repairs::{AttachPart, PartUsagePatch};

use crate::app::services::Stores;
use crate::app::{dto, errors};

/// Routes merged into the repairs router.
pub fn repairs_router() -> Router {
    Router::new().route("/:id/inventario", get(list_parts).post(attach_part)).route(
        "/:id/inventario/:itemId",
        axum::routing::put(update_part).delete(detach_part),
    )
}

/// Routes merged into the inventory router.
pub fn inventory_router() -> Router {
    Router::new().route("/:id/reparaciones", get(item_usage_history))
}

pub async fn attach_part(
    Extension(stores): Extension<Arc<Stores>>,
    Path(repair_id): Path<i64>,
    Json(body): Json<dto::AttachPartRequest>,
) -> axum::response::Response {
    let (Some(item_id), Some(quantity), Some(unit_price)) =
        (body.inventario_id, body.cantidad, body.precio_unitario)
    else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "inventario_id, cantidad y precio_unitario son campos requeridos",
        );
    };

    let input = AttachPart {
        item_id,
        quantity,
        unit_price,
    };

    match stores.repair_parts.attach(repair_id, &input).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Item agregado a la reparación exitosamente",
                "data": dto::part_usage_to_json(&record),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_parts(
    Extension(stores): Extension<Arc<Stores>>,
    Path(repair_id): Path<i64>,
) -> axum::response::Response {
    match stores.repair_parts.list(repair_id).await {
        Ok(list) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": list.items.iter().map(dto::part_usage_to_json).collect::<Vec<_>>(),
                "total_repuestos": list.total,
                "total_items": list.count,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_part(
    Extension(stores): Extension<Arc<Stores>>,
    Path((repair_id, link_id)): Path<(i64, i64)>,
    Json(body): Json<dto::UpdatePartRequest>,
) -> axum::response::Response {
    let patch = PartUsagePatch {
        quantity: body.cantidad,
        unit_price: body.precio_unitario,
    };

    match stores.repair_parts.update(repair_id, link_id, &patch).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Item actualizado exitosamente",
                "data": dto::part_usage_to_json(&record),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn detach_part(
    Extension(stores): Extension<Arc<Stores>>,
    Path((repair_id, link_id)): Path<(i64, i64)>,
) -> axum::response::Response {
    match stores.repair_parts.detach(repair_id, link_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Item eliminado de la reparación exitosamente",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn item_usage_history(
    Extension(stores): Extension<Arc<Stores>>,
    Path(item_id): Path<i64>,
) -> axum::response::Response {
    match stores.repair_parts.usage_history(item_id).await {
        Ok(history) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": history
                    .entries
                    .iter()
                    .map(dto::usage_entry_to_json)
                    .collect::<Vec<_>>(),
                "item": {
                    "id": history.item.id,
                    "nombre": history.item.name,
                    "categoria": history.item.category,
                },
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
