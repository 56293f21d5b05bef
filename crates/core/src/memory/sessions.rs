use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{NewSession, Session, SessionState};
use crate::ports::{SessionStore, StoreError, StoreResult};
use crate::token::TokenHash;
use crate::types::DbId;

/// Both indexes live behind one lock so they never disagree.
#[derive(Default)]
struct SessionIndex {
    by_hash: HashMap<TokenHash, Session>,
    by_user: HashMap<DbId, HashSet<TokenHash>>,
}

impl SessionIndex {
    fn remove(&mut self, hash: &TokenHash) -> Option<Session> {
        let session = self.by_hash.remove(hash)?;
        if let Some(hashes) = self.by_user.get_mut(&session.user.id) {
            hashes.remove(hash);
            if hashes.is_empty() {
                self.by_user.remove(&session.user.id);
            }
        }
        Some(session)
    }
}

/// Session store held in process memory.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct InMemorySessionStore {
    sessions: RwLock<SessionIndex>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(SessionIndex::default()),
            clock,
        }
    }

    /// Number of records held, including expired and revoked ones not yet purged.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.by_hash.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, input: NewSession) -> StoreResult<Session> {
        let mut index = self.sessions.write().await;
        if index.by_hash.contains_key(&input.token_hash) {
            return Err(StoreError::DuplicateToken);
        }

        let session = Session {
            id: Uuid::new_v4(),
            user: input.user,
            token_hash: input.token_hash,
            created_at: input.created_at,
            expires_at: input.expires_at,
            revoked_at: None,
            user_agent: input.user_agent,
            ip_address: input.ip_address,
        };
        index
            .by_user
            .entry(session.user.id)
            .or_default()
            .insert(session.token_hash.clone());
        index
            .by_hash
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn get_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<Session> {
        let now = self.clock.now();
        {
            let index = self.sessions.read().await;
            let session = index.by_hash.get(hash).ok_or(StoreError::NotFound)?;
            match session.state_at(now) {
                SessionState::Active => return Ok(session.clone()),
                SessionState::Revoked => return Err(StoreError::Revoked),
                SessionState::Expired => {}
            }
        }

        // Lazy cleanup. Re-check under the write lock: the record may have
        // been revoked or purged in between.
        let mut index = self.sessions.write().await;
        match index.by_hash.get(hash).map(|s| s.state_at(now)) {
            None => Err(StoreError::NotFound),
            Some(SessionState::Revoked) => Err(StoreError::Revoked),
            Some(SessionState::Active) => Ok(index.by_hash[hash].clone()),
            Some(SessionState::Expired) => {
                index.remove(hash);
                Err(StoreError::Expired)
            }
        }
    }

    async fn revoke_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<()> {
        let now = self.clock.now();
        let mut index = self.sessions.write().await;
        if let Some(session) = index.by_hash.get_mut(hash) {
            if session.revoked_at.is_none() {
                session.revoked_at = Some(now);
            }
        }
        Ok(())
    }

    async fn revoke_all_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        let now = self.clock.now();
        let mut index = self.sessions.write().await;
        let SessionIndex { by_hash, by_user } = &mut *index;

        let mut revoked = 0;
        for hash in by_user.get(&user_id).into_iter().flatten() {
            if let Some(session) = by_hash.get_mut(hash) {
                if session.is_valid_at(now) {
                    session.revoked_at = Some(now);
                    revoked += 1;
                }
            }
        }
        Ok(revoked)
    }

    async fn list_active_sessions_for_user(&self, user_id: DbId) -> StoreResult<Vec<Session>> {
        let now = self.clock.now();
        let index = self.sessions.read().await;
        let mut sessions: Vec<Session> = index
            .by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|hash| index.by_hash.get(hash))
            .filter(|s| s.is_valid_at(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = self.clock.now();
        let mut index = self.sessions.write().await;
        let stale: Vec<TokenHash> = index
            .by_hash
            .values()
            .filter(|s| !s.is_valid_at(now))
            .map(|s| s.token_hash.clone())
            .collect();
        for hash in &stale {
            index.remove(hash);
        }
        Ok(stale.len() as u64)
    }
}
