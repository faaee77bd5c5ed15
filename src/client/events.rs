use tokio::sync::broadcast::{self, Receiver, Sender, error::TryRecvError};

use crate::models::user::AuthUser;

/// Auth-state change published by the client after sign-in or sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

/// Process-wide auth-state channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscriptions received the event.
    pub fn publish(&self, event: AuthEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live subscription. Events published after `subscribe` are queued until read.
/// `release` (or drop) unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<Receiver<AuthEvent>>,
}

impl Subscription {
    /// Next queued event without waiting. Lagged events are skipped.
    pub fn try_next(&mut self) -> Option<AuthEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscription lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next event. `None` once released or the channel is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn release(&mut self) {
        self.receiver = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn release_unsubscribes() {
        let events = AuthEvents::default();
        let mut sub = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);

        assert_eq!(events.publish(AuthEvent::SignedOut), 1);
        assert_eq!(sub.try_next(), Some(AuthEvent::SignedOut));
        assert_eq!(sub.try_next(), None);

        sub.release();
        assert!(!sub.is_active());
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(events.publish(AuthEvent::SignedOut), 0);
    }

    #[tokio::test]
    async fn events_reach_every_subscriber() {
        let events = AuthEvents::default();
        let mut a = events.subscribe();
        let mut b = events.subscribe();
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            session_id: Uuid::new_v4(),
        };

        events.publish(AuthEvent::SignedIn(user.clone()));
        assert_eq!(a.next().await, Some(AuthEvent::SignedIn(user.clone())));
        assert_eq!(b.try_next(), Some(AuthEvent::SignedIn(user)));
    }
}
