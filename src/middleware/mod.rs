// Access gate and CORS middleware

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_http::cors::{Any, CorsLayer};

use crate::credentials::CookieJar;
use crate::gate::{self, AccessDecision, CredentialSnapshot, HOME_PATH, LOGIN_PATH};
use crate::routes::AppState;

/// Access gate middleware
///
/// Reads the credential cookies on every request and applies
/// [`gate::decide`]. Redirects are temporary so the browser re-asks
/// once its cookies change. Non-GET requests get 303 so the browser
/// follows with a GET instead of replaying the body.
pub async fn access_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers(), state.config.cookie_policy());
    let snapshot = CredentialSnapshot::from_store(&jar);
    let path = request.uri().path().to_string();
    let replay_safe = request.method() == Method::GET || request.method() == Method::HEAD;

    match gate::decide(&path, &snapshot) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::RedirectToLogin => {
            let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
            tracing::info!(
                "[{}] No session for {} {}, redirecting to {}",
                request_id,
                request.method(),
                path,
                LOGIN_PATH
            );
            gate_redirect(LOGIN_PATH, replay_safe).into_response()
        }
        AccessDecision::RedirectHome => {
            let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
            tracing::debug!(
                "[{}] Already signed in, redirecting {} to {}",
                request_id,
                path,
                HOME_PATH
            );
            gate_redirect(HOME_PATH, replay_safe).into_response()
        }
    }
}

fn gate_redirect(location: &str, replay_safe: bool) -> Redirect {
    if replay_safe {
        Redirect::temporary(location)
    } else {
        Redirect::to(location)
    }
}

/// Create CORS middleware layer
///
/// Allows any origin, method and header. Handles OPTIONS preflight
/// requests automatically.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
