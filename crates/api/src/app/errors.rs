use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tallerhub_core::DomainError;
use tallerhub_infra::StoreError;

/// Map a store error onto the response envelope.
///
/// Business-rule failures answer 400 (conflicts and insufficient stock
/// included), missing entities 404. Database failures answer a generic 500;
/// the detail only goes to the log.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Database(e) => {
            tracing::error!(error = %e, "database error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor")
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_)
        | DomainError::InvalidId(_)
        | DomainError::Conflict(_)
        | DomainError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn forbidden() -> axum::response::Response {
    json_error(
        StatusCode::FORBIDDEN,
        "Acceso denegado. Se requieren privilegios de administrador.",
    )
}
