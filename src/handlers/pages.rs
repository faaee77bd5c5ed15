use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::percent_decode_str;

use crate::{state::AppState, utils::jwt::resolve_user};

/// Page paths that need a session. Sub-paths of `/home` and `/dashboard` are covered too.
pub const PROTECTED_PAGES: [&str; 3] = ["/", "/home", "/dashboard"];

/// The page a request path lands on once the static file server has resolved it:
/// percent-decoded, empty and `.` segments dropped, and a trailing `index.html`
/// folded into its directory.
fn page_of(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut segments: Vec<&str> = decoded
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.last() == Some(&"index.html") {
        segments.pop();
    }
    format!("/{}", segments.join("/"))
}

pub fn is_protected(path: &str) -> bool {
    let page = page_of(path);
    PROTECTED_PAGES.iter().any(|protected| {
        if *protected == "/" {
            return page == "/";
        }
        page == *protected
            || page
                .strip_prefix(*protected)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Axum Middleware: Session Guard for pages.
///
/// A protected page requested without an active session is redirected to the login page.
/// A failed session lookup counts as no session.
pub async fn page_guard(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if !is_protected(req.uri().path()) {
        return next.run(req).await;
    }

    match resolve_user(&state, req.headers()).await {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => Redirect::to(&state.config.login_path).into_response(),
        Err(e) => {
            tracing::debug!(path = req.uri().path(), "Page guard rejected session: {}", e);
            Redirect::to(&state.config.login_path).into_response()
        }
    }
}
