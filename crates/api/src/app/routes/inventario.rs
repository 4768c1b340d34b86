use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use tallerhub_inventory::{ItemPatch, NewItem, StockOperation};
use tallerhub_infra::inventory::InventoryFilter;
use tallerhub_infra::PageParams;

use crate::app::routes::{page_json, reparacion_inventario};
use crate::app::services::Stores;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/categorias", get(item_categories))
        .route("/alertas/stock-bajo", get(low_stock_items))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/stock", patch(adjust_stock))
        .merge(reparacion_inventario::inventory_router())
}

pub async fn list_items(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::ListInventoryQuery>,
) -> axum::response::Response {
    let filter = InventoryFilter {
        category: query.categoria,
        low_stock_only: query.stock_minimo.as_deref() == Some("true"),
        search: query.buscar,
    };
    let params = PageParams::new(query.pagina, query.limite);

    match stores.inventory.list(&filter, params).await {
        Ok(page) => page_json(&page, page.items.iter().map(dto::item_to_json).collect()),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.inventory.get(id).await {
        Ok(item) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": dto::item_to_json(&item) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(stores): Extension<Arc<Stores>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let (Some(name), Some(category), Some(price), Some(stock)) =
        (body.nombre, body.categoria, body.precio, body.stock)
    else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "Nombre, categoría, precio y stock son campos requeridos",
        );
    };

    let input = NewItem {
        name,
        description: body.descripcion.unwrap_or_default(),
        category,
        price,
        stock,
    };

    match stores.inventory.create(&input).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Item creado exitosamente en el inventario",
                "data": dto::item_to_json(&created),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let patch = ItemPatch {
        name: body.nombre,
        description: body.descripcion,
        category: body.categoria,
        price: body.precio,
        stock: body.stock,
    };

    match stores.inventory.update(id, &patch).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Item actualizado exitosamente",
                "data": dto::item_to_json(&updated),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.inventory.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Item eliminado exitosamente del inventario",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let Some(amount) = body.stock else {
        return errors::json_error(StatusCode::BAD_REQUEST, "El campo stock es requerido");
    };
    let operation = body.operacion.unwrap_or(StockOperation::Establecer);

    match stores.inventory.adjust_stock(id, operation, amount).await {
        Ok(item) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Stock actualizado exitosamente",
                "data": dto::item_to_json(&item),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn low_stock_items(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    match stores.inventory.low_stock(query.limite.unwrap_or(10)).await {
        Ok(items) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": items.iter().map(dto::item_to_json).collect::<Vec<_>>(),
                "total": items.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn item_categories(
    Extension(stores): Extension<Arc<Stores>>,
) -> axum::response::Response {
    match stores.inventory.categories().await {
        Ok(categories) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": categories })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
