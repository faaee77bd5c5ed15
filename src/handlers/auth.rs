// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect},
};
use url::Url;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AuthResponse, AuthUser, Credentials, Identity, SessionResponse, Viewer},
    state::AppState,
    store::AccountStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{SESSION_COOKIE, sign_jwt},
    },
};

/// Opens a session for the identity and signs its token.
async fn open_session(state: &AppState, identity: &Identity) -> Result<AuthResponse, AppError> {
    let session = state.store.create_session(identity.id).await?;

    let user = AuthUser {
        id: identity.id,
        email: identity.email.clone(),
        session_id: session.id,
    };
    let token = sign_jwt(&user, &state.config.jwt_secret, state.config.jwt_expiration)?;

    Ok(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        user,
    })
}

fn session_cookie(token: &str, max_age: u64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

fn normalized(payload: Credentials) -> Result<Credentials, AppError> {
    let credentials = Credentials {
        email: payload.normalized_email(),
        password: payload.password,
    };
    credentials.validate()?;
    Ok(credentials)
}

/// Registers a new identity with a password and signs it in.
///
/// The application profile row is not created here; the composer creates it on first post.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = normalized(payload)?;

    let hashed_password = hash_password(&credentials.password)?;
    let identity = state
        .store
        .create_identity(&credentials.email, &hashed_password)
        .await?;

    tracing::info!(user_id = %identity.id, "Identity registered");

    let response = open_session(&state, &identity).await?;
    let cookie = session_cookie(&response.token, state.config.jwt_expiration);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// Authenticates with email and password.
/// Unknown email and wrong password answer the same way.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.normalized_email();
    let rejected = || AppError::Unauthenticated("Invalid email or password".to_string());

    let identity = state
        .store
        .find_identity_by_email(&email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&payload.password, &identity.password_hash)? {
        return Err(rejected());
    }

    let response = open_session(&state, &identity).await?;
    let cookie = session_cookie(&response.token, state.config.jwt_expiration);

    tracing::info!(user_id = %identity.id, session_id = %response.user.session_id, "Signed in");

    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

/// Ends the current session and clears the session cookie.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    state.store.revoke_session(user.session_id).await?;

    tracing::info!(user_id = %user.id, session_id = %user.session_id, "Signed out");

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie("", 0))],
    ))
}

/// Returns the user behind the current session.
pub async fn current_user(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

/// Returns the current session, or nulls for an anonymous caller.
pub async fn current_session(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, AppError> {
    let session = match &viewer.0 {
        Some(user) => state.store.find_session(user.session_id).await?,
        None => None,
    };

    Ok(Json(SessionResponse {
        session,
        user: viewer.0,
    }))
}

/// Builds the authorize URL of the federated identity provider.
pub fn federated_authorize_url(config: &Config, provider: &str) -> Result<Url, AppError> {
    let provider = provider.to_lowercase();
    if !config.oauth_providers.iter().any(|p| *p == provider) {
        return Err(AppError::NotFound(format!(
            "Sign-in provider '{}' is not supported",
            provider
        )));
    }

    let authorize = config
        .oauth_authorize_url
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Federated sign-in is not configured".to_string()))?;

    let mut url = Url::parse(authorize)
        .map_err(|e| AppError::Store(format!("OAUTH_AUTHORIZE_URL is invalid: {}", e)))?;
    let redirect_to = format!("{}/", config.public_base_url.trim_end_matches('/'));
    url.query_pairs_mut()
        .append_pair("provider", &provider)
        .append_pair("redirect_to", &redirect_to);

    Ok(url)
}

/// Starts sign-in with a federated identity provider by redirecting to it.
pub async fn federated_sign_in(
    State(config): State<Config>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let url = federated_authorize_url(&config, &provider)?;
    Ok(Redirect::to(url.as_str()))
}
