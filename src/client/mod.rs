// src/client/mod.rs

//! Typed client for the HTTP API plus the view state built on it:
//! the session guard, the post composer and the feed views.

pub mod composer;
pub mod events;
pub mod feed;
pub mod guard;

use reqwest::{Method, RequestBuilder, StatusCode, header, multipart, redirect};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        like::LikeToggle,
        post::{FeedPost, Post, PostForm},
        user::{AuthResponse, AuthUser, Credentials, SessionResponse},
    },
};

pub use composer::PostComposer;
pub use events::{AuthEvent, AuthEvents, Subscription};
pub use feed::{FeedAction, FeedList, FeedMode, FeedView};
pub use guard::{ActiveSession, GuardOutcome, SessionGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// User-facing notification left by a view after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    pub fn error(description: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            description: description.to_string(),
        }
    }
}

/// HTTP client holding the current session token.
/// Sign-in and sign-out are published on its `AuthEvents` channel.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    events: AuthEvents,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid base URL: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // Redirects are surfaced to the caller (federated sign-in hands out a location).
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: None,
            events: AuthEvents::default(),
        })
    }

    /// Shares an existing auth-state channel instead of the client's own.
    pub fn with_events(mut self, events: AuthEvents) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::Validation(format!("Invalid path '{}': {}", path, e)))?;

        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    fn require_token(&self) -> Result<(), AppError> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(AppError::Unauthenticated("Sign in required".to_string())),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| status.to_string());

        Err(AppError::from_status(status, message))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, AppError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn authenticate(&mut self, path: &str, email: &str, password: &str) -> Result<AuthUser, AppError> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = Self::send(self.request(Method::POST, path)?.json(&body)).await?;

        self.token = Some(response.token);
        self.events.publish(AuthEvent::SignedIn(response.user.clone()));
        Ok(response.user)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        self.authenticate("api/auth/signup", email, password).await
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        self.authenticate("api/auth/login", email, password).await
    }

    /// Ends the session server-side, then forgets the token.
    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.require_token()?;
        Self::check(self.request(Method::POST, "api/auth/logout")?.send().await?).await?;

        self.token = None;
        self.events.publish(AuthEvent::SignedOut);
        Ok(())
    }

    /// Location of the federated provider's sign-in page.
    pub async fn federated_sign_in_url(&self, provider: &str) -> Result<Url, AppError> {
        let path = format!("api/auth/oauth/{}", provider);
        let response = Self::check(self.request(Method::GET, &path)?.send().await?).await?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Store("Sign-in redirect has no location".to_string()))?;

        Url::parse(location).map_err(|e| AppError::Store(format!("Invalid sign-in location: {}", e)))
    }

    /// The signed-in user, or `None` without a token or with an ended session.
    pub async fn current_user(&self) -> Result<Option<AuthUser>, AppError> {
        if self.token.is_none() {
            return Ok(None);
        }

        match Self::send::<AuthUser>(self.request(Method::GET, "api/auth/user")?).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Unauthenticated(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn current_session(&self) -> Result<SessionResponse, AppError> {
        Self::send(self.request(Method::GET, "api/auth/session")?).await
    }

    pub async fn public_feed(&self) -> Result<Vec<FeedPost>, AppError> {
        Self::send(self.request(Method::GET, "api/posts")?).await
    }

    pub async fn own_posts(&self) -> Result<Vec<FeedPost>, AppError> {
        self.require_token()?;
        Self::send(self.request(Method::GET, "api/profile/posts")?).await
    }

    pub async fn create_post(&self, form: &PostForm) -> Result<Post, AppError> {
        self.require_token()?;

        let mut body = multipart::Form::new()
            .text("title", form.title.clone())
            .text("is_public", form.is_public.to_string());
        if let Some(kind) = form.kind {
            body = body.text("type", kind.as_str());
        }
        if let Some(description) = &form.description {
            body = body.text("description", description.clone());
        }
        if let Some(image) = &form.image {
            let mut part = multipart::Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
            if let Some(content_type) = &image.content_type {
                part = part.mime_str(content_type)?;
            }
            body = body.part("image", part);
        }

        let builder = self.request(Method::POST, "api/posts")?.multipart(body);
        let response = Self::check(builder.send().await?).await?;
        if response.status() != StatusCode::CREATED {
            return Err(AppError::Store(format!("Unexpected status {}", response.status())));
        }
        Ok(response.json::<Post>().await?)
    }

    /// Rejected with `Unauthenticated` before any request when signed out.
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<LikeToggle, AppError> {
        self.require_token()?;
        let path = format!("api/posts/{}/like", post_id);
        Self::send(self.request(Method::POST, &path)?).await
    }
}

