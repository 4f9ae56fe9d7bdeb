use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{SessionResponse, SignInRequest, SignInResponse},
        extractors::{CurrentSession, SESSION_COOKIE},
        header::HeaderView,
        jwt::SessionKeys,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin/:provider", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/session", get(get_session))
}

pub fn header_routes() -> Router<AppState> {
    Router::new().route("/header", get(get_header))
}

fn session_cookie(value: &str, max_age_secs: u64) -> Result<HeaderValue, (StatusCode, String)> {
    format!("{SESSION_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
        .parse()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "invalid cookie".to_string()))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<SignInRequest>,
) -> Result<(HeaderMap, Json<SignInResponse>), (StatusCode, String)> {
    let provider = provider.to_lowercase();
    let resolver = state.providers.get(&provider).map_err(|e| {
        warn!(%provider, "sign-in with unknown provider");
        <(StatusCode, String)>::from(e)
    })?;

    let session = resolver.resolve(&payload.assertion).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = match keys.sign(&session, &provider) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "session sign failed");
            return Err(e.into());
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&token, keys.ttl.as_secs())?);

    info!(email = %session.email, %provider, "user signed in");
    Ok((headers, Json(SignInResponse { token, user: session })))
}

/// Sessions are stateless tokens: signing out drops the cookie and ends the
/// user's live dashboard streams.
#[instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<(StatusCode, HeaderMap), (StatusCode, String)> {
    if let Some(session) = current.session() {
        state.feed.sign_out(&session.email);
        info!(email = %session.email, "user signed out");
    }
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok((StatusCode::NO_CONTENT, headers))
}

#[instrument(skip_all)]
pub async fn get_session(current: CurrentSession) -> Json<Option<SessionResponse>> {
    Json(current.into_session().map(|user| SessionResponse { user }))
}

#[instrument(skip_all)]
pub async fn get_header(State(state): State<AppState>, current: CurrentSession) -> Json<HeaderView> {
    Json(HeaderView::new(&current.status, state.config.default_provider()))
}
