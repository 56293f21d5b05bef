use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::models::{normalize_email, NewUser, User};
use crate::ports::{DirectoryError, UserDirectory};
use crate::types::DbId;

#[derive(Default)]
struct Directory {
    users: HashMap<DbId, User>,
    by_email: HashMap<String, DbId>,
    next_id: DbId,
}

/// User directory held in process memory.
///
/// Email uniqueness is checked and claimed under the same write lock, so two
/// concurrent inserts of one address cannot both succeed.
pub struct InMemoryUserDirectory {
    inner: RwLock<Directory>,
    clock: Arc<dyn Clock>,
}

impl InMemoryUserDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Directory {
                next_id: 1,
                ..Directory::default()
            }),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let dir = self.inner.read().await;
        Ok(dir
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| dir.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, DirectoryError> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn insert(&self, input: &NewUser) -> Result<User, DirectoryError> {
        let email = normalize_email(&input.email);
        let mut dir = self.inner.write().await;
        if dir.by_email.contains_key(&email) {
            return Err(DirectoryError::EmailTaken);
        }

        let id = dir.next_id;
        dir.next_id += 1;
        let user = User {
            id,
            name: input.name.clone(),
            email: email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: self.clock.now(),
        };
        dir.by_email.insert(email, id);
        dir.users.insert(id, user.clone());
        Ok(user)
    }
}
