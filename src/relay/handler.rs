use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::platform::types::AccessToken;
use crate::server::AppState;

use super::state::{sign_state, verify_state};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Terminal state of one OAuth round trip.
///
/// Converts to exactly one response: a 302 carrying the token, or an error
/// status (400 for a bad request, 500 for a failed exchange).
#[derive(Debug)]
pub enum CallbackOutcome {
    TokenIssued { location: String },
    Rejected(AppError),
}

impl IntoResponse for CallbackOutcome {
    fn into_response(self) -> Response {
        match self {
            CallbackOutcome::TokenIssued { location } => found(location),
            CallbackOutcome::Rejected(err) => err.into_response(),
        }
    }
}

/// 302 Found, the status browsers follow for the OAuth hops.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `GET /login`: send the browser to GitHub's authorization page.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response> {
    let csrf_state = match state.config.github.state_secret.as_deref() {
        Some(secret) => Some(sign_state(secret, chrono::Utc::now().timestamp())?),
        None => None,
    };

    let url = state.oauth.authorization_url(csrf_state.as_deref())?;
    tracing::info!(signed_state = csrf_state.is_some(), "Redirecting to GitHub authorization");
    Ok(found(url))
}

/// `GET /callback`: trade the authorization code for a token and hand the
/// token to the front end.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> CallbackOutcome {
    handle_callback(&state, params).await
}

pub async fn handle_callback(state: &AppState, params: CallbackParams) -> CallbackOutcome {
    let code = match params.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => {
            tracing::warn!("OAuth callback without authorization code");
            return CallbackOutcome::Rejected(AppError::MissingCode);
        }
    };

    if let Some(secret) = state.config.github.state_secret.as_deref() {
        let result = match params.state.as_deref() {
            Some(value) => verify_state(secret, value, chrono::Utc::now().timestamp()),
            None => Err(AppError::InvalidState("Missing state".to_string())),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "OAuth callback state rejected");
            return CallbackOutcome::Rejected(e);
        }
    }

    match state.oauth.exchange_code(code).await {
        Ok(token) => {
            tracing::info!("Access token issued, redirecting to dashboard");
            CallbackOutcome::TokenIssued {
                location: dashboard_location(&state.config.dashboard_url(), &token),
            }
        }
        Err(e) => {
            let e = match e {
                e @ AppError::TokenExchange(_) => e,
                other => AppError::TokenExchange(other.to_string()),
            };
            tracing::error!(error = %e, "OAuth token exchange failed");
            CallbackOutcome::Rejected(e)
        }
    }
}

fn dashboard_location(dashboard_url: &str, token: &AccessToken) -> String {
    format!(
        "{dashboard_url}?token={}",
        urlencoding::encode(token.expose())
    )
}
