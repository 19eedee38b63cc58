use std::sync::RwLock;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Active,
    Expired,
}

/// Credentials handed explicitly to the API client.
///
/// A 401 from the backend clears the token and publishes
/// [`SessionEvent::Expired`]; callers decide how to leave the dashboard.
#[derive(Debug)]
pub struct Session {
    token: RwLock<Option<String>>,
    events: watch::Sender<SessionEvent>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        let (events, _) = watch::channel(SessionEvent::Active);
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
            events,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn expire(&self) {
        if let Ok(mut guard) = self.token.write() {
            guard.take();
        }
        self.events.send_replace(SessionEvent::Expired);
    }

    pub fn is_expired(&self) -> bool {
        *self.events.borrow() == SessionEvent::Expired
    }
}
