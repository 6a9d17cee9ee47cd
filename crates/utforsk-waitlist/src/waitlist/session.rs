use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::controller::WaitlistController;
use super::gateway::{GatewayKind, WaitlistGateway};

struct SessionEntry {
    controller: Arc<WaitlistController>,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) >= ttl && !self.controller.is_submitting()
    }
}

/// Page sessions, each with its own controller. All controllers share the
/// gateway chosen at startup.
pub struct SessionRegistry {
    gateway: Arc<dyn WaitlistGateway>,
    ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

    pub fn new(gateway: Arc<dyn WaitlistGateway>, ttl: Duration) -> Self {
        Self {
            gateway,
            ttl,
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Caps the number of live sessions. When full, opening a session evicts
    /// the least recently seen one that has no submit in flight.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn gateway_kind(&self) -> GatewayKind {
        self.gateway.kind()
    }

    /// Opens a fresh session, pruning idle ones first.
    pub fn create(&self) -> (Uuid, Arc<WaitlistController>) {
        let mut sessions = self.lock();
        let now = Instant::now();
        prune_idle(&mut sessions, now, self.ttl);
        while sessions.len() >= self.max_sessions {
            if !evict_least_recent(&mut sessions) {
                break;
            }
        }

        let id = Uuid::new_v4();
        let controller = Arc::new(WaitlistController::new(self.gateway.clone()));
        sessions.insert(
            id,
            SessionEntry {
                controller: controller.clone(),
                last_seen: now,
            },
        );
        debug!(session = %id, active = sessions.len(), "waitlist session opened");
        (id, controller)
    }

    /// Looks up a live session and marks it as seen. An expired session is
    /// dropped here rather than waiting for the next prune.
    pub fn get(&self, id: &Uuid) -> Option<Arc<WaitlistController>> {
        let mut sessions = self.lock();
        let now = Instant::now();
        if sessions.get(id)?.is_expired(now, self.ttl) {
            sessions.remove(id);
            debug!(session = %id, "expired waitlist session discarded");
            return None;
        }

        let entry = sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(entry.controller.clone())
    }

    /// Resumes a known session or opens a new one when the id is missing or
    /// has expired.
    pub fn resume_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<WaitlistController>) {
        if let Some(id) = id {
            if let Some(controller) = self.get(&id) {
                return (id, controller);
            }
        }
        self.create()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("gateway", &self.gateway.kind())
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .field("sessions", &self.len())
            .finish()
    }
}

fn prune_idle(sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant, ttl: Duration) {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(now, ttl));
    let pruned = before - sessions.len();
    if pruned > 0 {
        debug!(pruned, "expired waitlist sessions removed");
    }
}

fn evict_least_recent(sessions: &mut HashMap<Uuid, SessionEntry>) -> bool {
    let oldest = sessions
        .iter()
        .filter(|(_, entry)| !entry.controller.is_submitting())
        .min_by_key(|(_, entry)| entry.last_seen)
        .map(|(id, _)| *id);

    match oldest {
        Some(id) => {
            sessions.remove(&id);
            debug!(session = %id, "waitlist session evicted at capacity");
            true
        }
        None => false,
    }
}
