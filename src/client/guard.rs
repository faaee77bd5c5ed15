use super::{ApiClient, AuthEvent, Subscription};
use crate::models::user::AuthUser;

/// Result of mounting a protected view.
#[derive(Debug)]
pub enum GuardOutcome {
    /// No session: navigate here and render nothing.
    Redirect(String),
    Granted(ActiveSession),
}

impl GuardOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardOutcome::Granted(_))
    }
}

/// Gate in front of protected views.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    login_path: String,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl SessionGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    /// Asks the auth provider for the current user once. No retries: a failed query
    /// redirects exactly like a missing session.
    pub async fn mount(&self, client: &ApiClient) -> GuardOutcome {
        // Subscribe before the query so a sign-out racing the mount is not missed.
        let subscription = client.events().subscribe();

        match client.current_user().await {
            Ok(Some(user)) => GuardOutcome::Granted(ActiveSession {
                user: Some(user),
                subscription,
            }),
            Ok(None) => GuardOutcome::Redirect(self.login_path.clone()),
            Err(e) => {
                tracing::warn!("Session check failed, redirecting to login: {}", e);
                GuardOutcome::Redirect(self.login_path.clone())
            }
        }
    }
}

/// A mounted protected view. Tracks auth-state changes until `teardown`.
#[derive(Debug)]
pub struct ActiveSession {
    user: Option<AuthUser>,
    subscription: Subscription,
}

impl ActiveSession {
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn apply(&mut self, event: AuthEvent) {
        self.user = match event {
            AuthEvent::SignedIn(user) => Some(user),
            AuthEvent::SignedOut => None,
        };
    }

    /// Applies every queued event. Returns whether any arrived.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.subscription.try_next() {
            self.apply(event);
            changed = true;
        }
        changed
    }

    /// Waits for the next auth-state change and applies it.
    pub async fn changed(&mut self) -> Option<Option<&AuthUser>> {
        let event = self.subscription.next().await?;
        self.apply(event);
        Some(self.user.as_ref())
    }

    /// Releases the subscription. Further events are not observed.
    pub fn teardown(mut self) {
        self.subscription.release();
    }
}
