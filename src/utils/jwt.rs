// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::{AuthUser, Viewer},
    state::AppState,
    store::AccountStore,
};

/// Name of the cookie carrying the session token for page loads.
pub const SESSION_COOKIE: &str = "session";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the identity id.
    pub sub: String,
    pub email: String,
    /// Session id; the session row decides whether the token is still honored.
    pub sid: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new session token.
pub fn sign_jwt(user: &AuthUser, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Store(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        sid: user.session_id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Store(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Token from `Authorization: Bearer <token>`, falling back to the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolves the user behind the request's token.
///
/// `Ok(None)` when no token was sent. A token that fails verification, or whose
/// session is unknown or revoked, is `Unauthenticated`.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };

    let claims = verify_jwt(&token, &state.config.jwt_secret)?;
    let invalid = || AppError::Unauthenticated("Invalid token".to_string());
    let id = Uuid::parse_str(&claims.sub).map_err(|_| invalid())?;
    let session_id = Uuid::parse_str(&claims.sid).map_err(|_| invalid())?;

    let session = state
        .store
        .find_session(session_id)
        .await?
        .filter(|s| s.is_active() && s.user_id == id)
        .ok_or_else(|| AppError::Unauthenticated("Session has ended".to_string()))?;

    Ok(Some(AuthUser {
        id: session.user_id,
        email: claims.email,
        session_id: session.id,
    }))
}

/// Axum Middleware: Authentication.
///
/// Rejects the request with 401 unless it carries a token for an active session.
/// Injects `AuthUser` into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(&state, req.headers())
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Sign in required".to_string()))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Axum Middleware: Optional Authentication.
///
/// Never rejects. Any failure to resolve the session is treated as an anonymous viewer.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let viewer = match resolve_user(&state, req.headers()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!("Treating request as anonymous: {}", e);
            None
        }
    };

    req.extensions_mut().insert(Viewer(viewer));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn token_round_trips() {
        let user = user();
        let token = sign_jwt(&user, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.sid, user.session_id.to_string());
        assert!(verify_jwt(&token, "other").is_err());
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn missing_token_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(extract_token(&headers), None);
    }
}
