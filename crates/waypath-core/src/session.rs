//! Planning sessions and their registry.
//!
//! A [`Session`] owns one traveler's live state, the feasible set and
//! lattice last computed for it, and its snapshots. Sessions are kept in a
//! [`SessionRegistry`]: the map sits behind a `tokio::sync::RwLock` and
//! every session behind its own `tokio::sync::Mutex`, so independent
//! sessions proceed concurrently while operations on one session are
//! serialized.
//!
//! Expiry is an explicit rule, [`is_expired`]: a session idle for longer
//! than the timeout is gone. Lookups enforce it, and
//! [`SessionRegistry::expire_idle`] sweeps the whole map.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use waypath_types::{Lattice, SessionId, Snapshot, TravelState, UserProfile};

use crate::config::LayerWeights;
use crate::error::EngineError;
use crate::feasibility::FeasibleSet;

/// One traveler's planning session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// The traveler's preferences.
    pub profile: UserProfile,
    /// Layer weights for this session.
    pub weights: LayerWeights,
    /// Live state. Replaced only by a successful transition.
    pub state: TravelState,
    /// The feasible set last computed for `state`, if any.
    pub last_feasible: Option<FeasibleSet>,
    /// The lattice last previewed for `state`, if any.
    pub lattice: Option<Lattice>,
    /// Snapshots in the order they were taken.
    pub snapshots: Vec<Snapshot>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last time the session was used.
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// A fresh session starting from `state`.
    pub fn new(
        profile: UserProfile,
        weights: LayerWeights,
        state: TravelState,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            profile,
            weights,
            state,
            last_feasible: None,
            lattice: None,
            snapshots: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }
}

/// Whether a session last used at `last_active` has expired at `now`.
pub fn is_expired(last_active: DateTime<Utc>, now: DateTime<Utc>, idle_timeout: TimeDelta) -> bool {
    now.signed_duration_since(last_active) > idle_timeout
}

/// Live sessions by ID.
#[derive(Debug)]
pub struct SessionRegistry {
    /// The sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<Mutex<Session>>>>,
    /// Idle time after which a session expires.
    idle_timeout: TimeDelta,
}

impl SessionRegistry {
    /// An empty registry expiring sessions after `idle_timeout_minutes`.
    pub fn new(idle_timeout_minutes: u32) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            idle_timeout: TimeDelta::minutes(i64::from(idle_timeout_minutes)),
        }
    }

    /// The idle timeout.
    pub const fn idle_timeout(&self) -> TimeDelta {
        self.idle_timeout
    }

    /// Register `session`.
    pub async fn insert(&self, session: Session) -> SessionId {
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session_id = %id, "Session created");
        id
    }

    /// Look up a live session and mark it active at `now`.
    ///
    /// An expired session is removed on the spot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] if there is no such
    /// session or it has expired.
    pub async fn get(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Arc<Mutex<Session>>, EngineError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::SessionNotFound(id))?;

        let expired = {
            let mut session = handle.lock().await;
            if is_expired(session.last_active, now, self.idle_timeout) {
                true
            } else {
                session.last_active = now;
                false
            }
        };
        if expired {
            self.sessions.write().await.remove(&id);
            info!(session_id = %id, "Session expired on access");
            return Err(EngineError::SessionNotFound(id));
        }
        Ok(handle)
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session closed");
        }
        removed
    }

    /// Drop every session idle past the timeout at `now` and return their
    /// IDs. Sessions busy with an operation are skipped.
    pub async fn expire_idle(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, handle)| {
                handle
                    .try_lock()
                    .is_ok_and(|s| is_expired(s.last_active, now, self.idle_timeout))
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), remaining = sessions.len(), "Idle sessions expired");
        }
        expired
    }

    /// Number of registered sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
