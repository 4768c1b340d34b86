use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Datelike;

use tallerhub_infra::vehicles::VehicleFilter;
use tallerhub_infra::PageParams;
use tallerhub_workshop::{NewVehicle, VehiclePatch};

use crate::app::routes::page_json;
use crate::app::services::Stores;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/marcas", get(vehicle_makes))
        .route("/usuario/:usuarioId", get(vehicles_by_user))
        .route("/buscar/placa/:placa", get(vehicle_by_plate))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

pub async fn list_vehicles(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::ListVehiclesQuery>,
) -> axum::response::Response {
    let filter = VehicleFilter {
        owner_id: query.usuario_id,
        make: query.marca,
        search: query.buscar,
    };
    let params = PageParams::new(query.pagina, query.limite);

    match stores.vehicles.list(&filter, params).await {
        Ok(page) => page_json(&page, page.items.iter().map(dto::vehicle_to_json).collect()),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.vehicles.get(id).await {
        Ok(vehicle) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": dto::vehicle_to_json(&vehicle) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Json(body): Json<dto::CreateVehicleRequest>,
) -> axum::response::Response {
    let input = NewVehicle {
        make: body.marca.unwrap_or_default(),
        model: body.modelo.unwrap_or_default(),
        year: body.anio.unwrap_or(0),
        plate: body.placa.unwrap_or_default(),
        owner_id: body.usuario_id.unwrap_or(0),
    };

    match stores.vehicles.create(&input, current_year()).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Vehículo registrado exitosamente",
                "data": dto::vehicle_to_json(&created),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::UpdateVehicleRequest>,
) -> axum::response::Response {
    let patch = VehiclePatch {
        make: body.marca,
        model: body.modelo,
        year: body.anio,
        plate: body.placa,
        owner_id: body.usuario_id,
    };

    match stores.vehicles.update(id, &patch, current_year()).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Vehículo actualizado exitosamente",
                "data": dto::vehicle_to_json(&updated),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.vehicles.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Vehículo eliminado exitosamente",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn vehicles_by_user(
    Extension(stores): Extension<Arc<Stores>>,
    Path(user_id): Path<i64>,
) -> axum::response::Response {
    match stores.vehicles.by_owner(user_id).await {
        Ok(vehicles) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": vehicles.iter().map(dto::vehicle_to_json).collect::<Vec<_>>(),
                "total": vehicles.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn vehicle_by_plate(
    Extension(stores): Extension<Arc<Stores>>,
    Path(plate): Path<String>,
) -> axum::response::Response {
    match stores.vehicles.by_plate(&plate).await {
        Ok(vehicle) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": dto::vehicle_to_json(&vehicle) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn vehicle_makes(
    Extension(stores): Extension<Arc<Stores>>,
) -> axum::response::Response {
    match stores.vehicles.makes().await {
        Ok(makes) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": makes })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
