use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use common::dto::ErrorResponse;
use std::sync::Arc;
use tracing::warn;

/// Shared secret for referee routes. `None` leaves them open, as on a classroom LAN.
#[derive(Clone, Default)]
pub struct RefereeKey(pub Option<Arc<str>>);

impl RefereeKey {
    pub fn new(key: Option<&str>) -> Self {
        Self(key.map(Arc::from))
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn referee_middleware(
    State(key): State<RefereeKey>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = key.0.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let verdict = match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err("Invalid referee key"),
        None => Err("Missing or invalid authorization header"),
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(message) => {
            warn!("Rejected referee request to {}: {}", request.uri(), message);
            unauthorized(message)
        }
    }
}
