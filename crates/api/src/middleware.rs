use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use tallerhub_auth::JwtKeys;

use crate::app::errors;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub keys: Arc<JwtKeys>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(resp) => return resp,
    };

    match state.keys.decode(token) {
        Ok(claims) => {
            req.extensions_mut().insert(CurrentUser::from_claims(&claims));
            next.run(req).await
        }
        Err(_) => errors::json_error(StatusCode::UNAUTHORIZED, "Token no válido."),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let denied = || {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "Acceso denegado. No hay token proporcionado.",
        )
    };

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(denied)?;

    let header = header.to_str().map_err(|_| denied())?;

    let token = header.strip_prefix("Bearer ").ok_or_else(denied)?.trim();
    if token.is_empty() {
        return Err(denied());
    }

    Ok(token)
}
