use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use tallerhub_infra::appointments::AppointmentFilter;
use tallerhub_infra::PageParams;
use tallerhub_workshop::{AppointmentPatch, AppointmentStatus, NewAppointment};

use crate::app::routes::page_json;
use crate::app::services::Stores;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/usuario/:usuarioId", get(appointments_by_user))
        .route("/vehiculo/:vehiculoId", get(appointments_by_vehicle))
        .route(
            "/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

pub async fn list_appointments(
    Extension(stores): Extension<Arc<Stores>>,
    Query(query): Query<dto::ListAppointmentsQuery>,
) -> axum::response::Response {
    let status = match parse_status_filter(query.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };
    let filter = AppointmentFilter {
        status,
        date: query.fecha,
    };
    let params = PageParams::new(query.pagina, query.limite);

    match stores.appointments.list(&filter, params).await {
        Ok(page) => page_json(
            &page,
            page.items.iter().map(dto::appointment_to_json).collect(),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_appointment(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.appointments.get(id).await {
        Ok(appointment) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": dto::appointment_to_json(&appointment),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_appointment(
    Extension(stores): Extension<Arc<Stores>>,
    Json(body): Json<dto::CreateAppointmentRequest>,
) -> axum::response::Response {
    let (Some(date), Some(time), Some(user_id), Some(vehicle_id)) =
        (body.fecha, body.hora, body.usuario_id, body.vehiculo_id)
    else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "Fecha, hora, usuario_id y vehiculo_id son campos requeridos",
        );
    };

    let status = match parse_status_filter(body.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    let input = NewAppointment {
        date,
        time,
        description: body.descripcion.unwrap_or_default(),
        status,
        user_id,
        vehicle_id,
    };

    match stores.appointments.create(&input).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Cita creada exitosamente",
                "data": dto::appointment_to_json(&created),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_appointment(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::UpdateAppointmentRequest>,
) -> axum::response::Response {
    let status = match parse_status_filter(body.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    let patch = AppointmentPatch {
        date: body.fecha,
        time: body.hora,
        description: body.descripcion,
        status,
        user_id: body.usuario_id,
        vehicle_id: body.vehiculo_id,
    };

    match stores.appointments.update(id, &patch).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Cita actualizada exitosamente",
                "data": dto::appointment_to_json(&updated),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_appointment(
    Extension(stores): Extension<Arc<Stores>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match stores.appointments.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Cita eliminada exitosamente",
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn appointments_by_user(
    Extension(stores): Extension<Arc<Stores>>,
    Path(user_id): Path<i64>,
    Query(query): Query<dto::StatusQuery>,
) -> axum::response::Response {
    let status = match parse_status_filter(query.estado.as_deref()) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    match stores.appointments.by_user(user_id, status).await {
        Ok(appointments) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": appointments
                    .iter()
                    .map(dto::appointment_to_json)
                    .collect::<Vec<_>>(),
                "total": appointments.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn appointments_by_vehicle(
    Extension(stores): Extension<Arc<Stores>>,
    Path(vehicle_id): Path<i64>,
) -> axum::response::Response {
    match stores.appointments.by_vehicle(vehicle_id).await {
        Ok(appointments) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": appointments
                    .iter()
                    .map(dto::appointment_to_json)
                    .collect::<Vec<_>>(),
                "total": appointments.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_status_filter(
    value: Option<&str>,
) -> Result<Option<AppointmentStatus>, axum::response::Response> {
    match value {
        None => Ok(None),
        Some(s) => AppointmentStatus::parse(s)
            .map(Some)
            .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "Estado no válido")),
    }
}
