//! Login, registration and token resolution.
//!
//! [`AuthService`] holds no session state of its own; it orchestrates the
//! password hasher, the token generator and the two collaborator traits.
//! Every method is an `async fn`: dropping the returned future is the
//! cancellation signal. Argon2 work runs on the blocking pool and finishes
//! even if the caller goes away, and a session becomes visible through a
//! single store insert, so an abandoned login leaves either a complete
//! session or nothing.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use validator::ValidateEmail;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::models::{
    normalize_email, ClientInfo, IssuedToken, LoginOutcome, NewSession, NewUser, Session,
    SessionUser, User, UserProfile,
};
use crate::password::{validate_password_strength, PasswordHasher};
use crate::ports::{SessionStore, StoreError, UserDirectory};
use crate::token::{SessionToken, TokenGenerator};
use crate::types::DbId;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Token generation attempts before a digest collision is surfaced.
pub const DEFAULT_MAX_TOKEN_ATTEMPTS: u32 = 3;

/// Default minimum password length at registration.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Session and credential policy.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub max_token_attempts: u32,
    pub min_password_length: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            max_token_attempts: DEFAULT_MAX_TOKEN_ATTEMPTS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Credential verification and session lifecycle.
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    tokens: TokenGenerator,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
    /// Verified against when the email is unknown, so that path costs about
    /// as much as a wrong password.
    decoy_hash: String,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Build the service. Computes the decoy hash once, so this costs one
    /// password hash.
    ///
    /// Fails with [`CoreError::Validation`] if the session lifetime is not
    /// positive, since every issued token would already be expired.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        tokens: TokenGenerator,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Result<Self, CoreError> {
        if settings.session_ttl <= Duration::zero() {
            return Err(CoreError::Validation(
                "Session lifetime must be positive".into(),
            ));
        }
        let decoy_secret = tokens.generate()?;
        let decoy_hash = hasher.hash(decoy_secret.as_str())?;
        Ok(Self {
            users,
            sessions,
            hasher,
            tokens,
            clock,
            settings,
            decoy_hash,
        })
    }

    /// Register a user.
    ///
    /// The existence pre-check gives a fast answer; the directory's own
    /// uniqueness constraint is the final authority and is mapped to the
    /// same [`CoreError::AlreadyExists`].
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Name must not be empty".into()));
        }
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(CoreError::Validation("Email address is not valid".into()));
        }
        validate_password_strength(password, self.settings.min_password_length)
            .map_err(CoreError::Validation)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(CoreError::AlreadyExists);
        }

        let password_hash = self.hash_blocking(password).await?;
        let user = self
            .users
            .insert(&NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email and wrong password produce the same
    /// [`CoreError::InvalidCredentials`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, CoreError> {
        let user = self.users.find_by_email(&normalize_email(email)).await?;

        let Some(user) = user else {
            // Burn the same Argon2 cost as a real verification.
            self.verify_blocking(password, self.decoy_hash.clone())
                .await?;
            tracing::debug!("Login rejected: unknown email");
            return Err(CoreError::InvalidCredentials);
        };

        if !self
            .verify_blocking(password, user.password_hash.clone())
            .await?
        {
            tracing::debug!(user_id = user.id, "Login rejected: password mismatch");
            return Err(CoreError::InvalidCredentials);
        }

        let session = self.open_session(&user, client).await?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginOutcome {
            user: UserProfile::from(&user),
            session,
        })
    }

    /// Resolve a presented raw token to its live session.
    ///
    /// Absent, expired and revoked sessions all yield [`CoreError::Unauthorized`].
    pub async fn authenticate(&self, raw_token: &str) -> Result<Session, CoreError> {
        let hash = SessionToken::from_raw(raw_token).digest();
        match self.sessions.get_session_by_token_hash(&hash).await {
            Ok(session) => Ok(session),
            Err(StoreError::Backend(msg)) => Err(CoreError::Storage(msg)),
            Err(reason) => {
                tracing::debug!(%reason, "Token rejected");
                Err(CoreError::Unauthorized)
            }
        }
    }

    /// Revoke the session behind a raw token. Unknown tokens are ignored.
    pub async fn logout(&self, raw_token: &str) -> Result<(), CoreError> {
        let hash = SessionToken::from_raw(raw_token).digest();
        self.sessions
            .revoke_session_by_token_hash(&hash)
            .await
            .map_err(store_fault)
    }

    /// Revoke every session of a user ("log out everywhere").
    pub async fn logout_everywhere(&self, user_id: DbId) -> Result<u64, CoreError> {
        let revoked = self
            .sessions
            .revoke_all_sessions_for_user(user_id)
            .await
            .map_err(store_fault)?;
        tracing::info!(user_id, revoked, "Revoked all sessions for user");
        Ok(revoked)
    }

    pub async fn active_sessions(&self, user_id: DbId) -> Result<Vec<Session>, CoreError> {
        self.sessions
            .list_active_sessions_for_user(user_id)
            .await
            .map_err(store_fault)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, CoreError> {
        let users = self.users.list().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn get_user(&self, id: DbId) -> Result<UserProfile, CoreError> {
        self.users
            .find_by_id(id)
            .await?
            .map(|u| UserProfile::from(&u))
            .ok_or(CoreError::NotFound { entity: "user", id })
    }

    /// Delete expired and revoked sessions from the store.
    pub async fn purge_expired_sessions(&self) -> Result<u64, CoreError> {
        self.sessions.purge_expired().await.map_err(store_fault)
    }

    pub async fn store_health(&self) -> Result<(), CoreError> {
        self.sessions.health_check().await.map_err(store_fault)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Issue a token and persist its digest, regenerating on collision.
    async fn open_session(
        &self,
        user: &User,
        client: &ClientInfo,
    ) -> Result<IssuedToken, CoreError> {
        let attempts = self.settings.max_token_attempts.max(1);
        for attempt in 1..=attempts {
            let token = self.tokens.generate()?;
            let now = self.clock.now();
            let input = NewSession {
                user: SessionUser::from(user),
                token_hash: token.digest(),
                created_at: now,
                expires_at: now + self.settings.session_ttl,
                user_agent: client.user_agent.clone(),
                ip_address: client.ip_address.clone(),
            };

            match self.sessions.create_session(input).await {
                Ok(session) => {
                    tracing::debug!(user_id = user.id, session_id = %session.id, "Session created");
                    return Ok(IssuedToken {
                        token,
                        expires_at: session.expires_at,
                    });
                }
                Err(StoreError::DuplicateToken) => {
                    tracing::warn!(attempt, "Session token collision, regenerating");
                }
                Err(e) => return Err(store_fault(e)),
            }
        }
        tracing::error!(attempts, "Session token collisions exhausted all attempts");
        Err(CoreError::DuplicateToken)
    }

    async fn hash_blocking(&self, password: &str) -> Result<String, CoreError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                CoreError::HashingFailure
            })?
    }

    async fn verify_blocking(&self, password: &str, hash: String) -> Result<bool, CoreError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                CoreError::HashingFailure
            })
    }
}

/// Map a store failure outside of token resolution.
fn store_fault(err: StoreError) -> CoreError {
    match err {
        StoreError::Backend(msg) => CoreError::Storage(msg),
        StoreError::DuplicateToken => CoreError::DuplicateToken,
        StoreError::NotFound | StoreError::Expired | StoreError::Revoked => {
            CoreError::Unauthorized
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::{InMemorySessionStore, InMemoryUserDirectory};
    use crate::password::HashCost;
    use crate::ports::{DirectoryError, StoreResult};
    use crate::token::{EntropyError, EntropySource, TokenHash};

    struct Harness {
        service: Arc<AuthService>,
        clock: Arc<ManualClock>,
        store: Arc<InMemorySessionStore>,
    }

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost::new(1024, 1, 1)).unwrap()
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::starting_now());
        let users = Arc::new(InMemoryUserDirectory::new(clock.clone()));
        let store = Arc::new(InMemorySessionStore::new(clock.clone()));
        let service = AuthService::new(
            users,
            store.clone(),
            cheap_hasher(),
            TokenGenerator::os(),
            clock.clone(),
            AuthSettings::default(),
        )
        .unwrap();
        Harness {
            service: Arc::new(service),
            clock,
            store,
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            user_agent: Some("Mozilla/5.0".into()),
            ip_address: Some("203.0.113.7".into()),
        }
    }

    async fn register_alice(service: &AuthService) -> User {
        service
            .create_user("Alice", "alice@example.com", "correct-horse")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn end_to_end_register_login_authenticate_expire() {
        let h = harness();
        let alice = register_alice(&h.service).await;
        assert!(alice.password_hash.starts_with("$argon2id$"));
        assert_ne!(alice.password_hash, "correct-horse");

        let outcome = h
            .service
            .login("alice@example.com", "correct-horse", &client())
            .await
            .unwrap();
        assert_eq!(outcome.user.id, alice.id);
        assert_eq!(
            outcome.session.expires_at,
            h.clock.now() + Duration::hours(24)
        );

        let token = outcome.session.token.as_str().to_string();
        let session = h.service.authenticate(&token).await.unwrap();
        assert_eq!(session.user.name, "Alice");
        assert_eq!(session.user.email, "alice@example.com");
        assert_eq!(session.ip_address.as_deref(), Some("203.0.113.7"));
        assert_ne!(session.token_hash.as_str(), token);

        h.clock.advance(Duration::hours(25));
        assert_matches!(
            h.service.authenticate(&token).await,
            Err(CoreError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let h = harness();
        register_alice(&h.service).await;

        let wrong = h
            .service
            .login("alice@example.com", "wrong", &client())
            .await
            .unwrap_err();
        let ghost = h
            .service
            .login("ghost@example.com", "anything", &client())
            .await
            .unwrap_err();

        assert_eq!(wrong, CoreError::InvalidCredentials);
        assert_eq!(wrong, ghost);
        assert_eq!(wrong.to_string(), ghost.to_string());
        assert_eq!(h.store.session_count().await, 0);
    }

    #[tokio::test]
    async fn login_email_is_case_insensitive() {
        let h = harness();
        register_alice(&h.service).await;
        assert!(h
            .service
            .login("  ALICE@example.com", "correct-horse", &client())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let h = harness();
        register_alice(&h.service).await;
        assert_matches!(
            h.service
                .create_user("Alice Again", "Alice@Example.com", "another-password")
                .await,
            Err(CoreError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn registration_validates_input() {
        let h = harness();
        assert_matches!(
            h.service.create_user("  ", "a@example.com", "long-enough").await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            h.service.create_user("A", "not-an-email", "long-enough").await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            h.service.create_user("A", "a@example.com", "short").await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let h = harness();
        assert_matches!(
            h.service.authenticate("not-a-real-token").await,
            Err(CoreError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn logout_revokes_only_that_session() {
        let h = harness();
        register_alice(&h.service).await;
        let first = h
            .service
            .login("alice@example.com", "correct-horse", &client())
            .await
            .unwrap();
        let second = h
            .service
            .login("alice@example.com", "correct-horse", &client())
            .await
            .unwrap();

        h.service
            .logout(first.session.token.as_str())
            .await
            .unwrap();
        // Second logout of the same token is a no-op.
        h.service
            .logout(first.session.token.as_str())
            .await
            .unwrap();

        assert_matches!(
            h.service.authenticate(first.session.token.as_str()).await,
            Err(CoreError::Unauthorized)
        );
        assert!(h
            .service
            .authenticate(second.session.token.as_str())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn logout_everywhere_revokes_all() {
        let h = harness();
        let alice = register_alice(&h.service).await;
        let mut tokens = Vec::new();
        for _ in 0..3 {
            let outcome = h
                .service
                .login("alice@example.com", "correct-horse", &client())
                .await
                .unwrap();
            tokens.push(outcome.session.token);
        }
        assert_eq!(h.service.active_sessions(alice.id).await.unwrap().len(), 3);

        assert_eq!(h.service.logout_everywhere(alice.id).await.unwrap(), 3);
        for token in &tokens {
            assert_matches!(
                h.service.authenticate(token.as_str()).await,
                Err(CoreError::Unauthorized)
            );
        }
        assert!(h.service.active_sessions(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hundred_concurrent_logins_yield_independent_sessions() {
        let h = harness();
        let alice = register_alice(&h.service).await;

        let logins = (0..100).map(|_| {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                service
                    .login("alice@example.com", "correct-horse", &client())
                    .await
                    .unwrap()
            })
        });
        let outcomes: Vec<LoginOutcome> = futures::future::join_all(logins)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let distinct: HashSet<&str> = outcomes
            .iter()
            .map(|o| o.session.token.as_str())
            .collect();
        assert_eq!(distinct.len(), 100);
        assert_eq!(h.service.active_sessions(alice.id).await.unwrap().len(), 100);

        // Revoking one leaves the other 99 valid.
        let (revoked, rest) = outcomes.split_first().unwrap();
        h.service
            .logout(revoked.session.token.as_str())
            .await
            .unwrap();
        assert!(h
            .service
            .authenticate(revoked.session.token.as_str())
            .await
            .is_err());
        for outcome in rest {
            assert!(h
                .service
                .authenticate(outcome.session.token.as_str())
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn list_and_get_users() {
        let h = harness();
        let alice = register_alice(&h.service).await;
        h.service
            .create_user("Bob", "bob@example.com", "hunter2hunter2")
            .await
            .unwrap();

        assert_eq!(h.service.list_users().await.unwrap().len(), 2);
        assert_eq!(h.service.get_user(alice.id).await.unwrap().name, "Alice");
        assert_matches!(
            h.service.get_user(999).await,
            Err(CoreError::NotFound { entity: "user", id: 999 })
        );
    }

    #[tokio::test]
    async fn purge_expired_sessions_through_service() {
        let h = harness();
        register_alice(&h.service).await;
        h.service
            .login("alice@example.com", "correct-horse", &client())
            .await
            .unwrap();
        h.clock.advance(Duration::hours(30));
        assert_eq!(h.service.purge_expired_sessions().await.unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    /// A store that reports a collision for the first `collisions` creates.
    struct CollidingStore {
        inner: InMemorySessionStore,
        collisions: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for CollidingStore {
        async fn create_session(&self, input: NewSession) -> StoreResult<Session> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(StoreError::DuplicateToken);
            }
            self.inner.create_session(input).await
        }
        async fn get_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<Session> {
            self.inner.get_session_by_token_hash(hash).await
        }
        async fn revoke_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<()> {
            self.inner.revoke_session_by_token_hash(hash).await
        }
        async fn revoke_all_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
            self.inner.revoke_all_sessions_for_user(user_id).await
        }
        async fn list_active_sessions_for_user(&self, user_id: DbId) -> StoreResult<Vec<Session>> {
            self.inner.list_active_sessions_for_user(user_id).await
        }
        async fn purge_expired(&self) -> StoreResult<u64> {
            self.inner.purge_expired().await
        }
    }

    fn service_with_store(
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
    ) -> AuthService {
        AuthService::new(
            users,
            store,
            cheap_hasher(),
            TokenGenerator::os(),
            Arc::new(ManualClock::starting_now()),
            AuthSettings::default(),
        )
        .unwrap()
    }

    fn colliding(collisions: usize) -> (Arc<CollidingStore>, Arc<InMemoryUserDirectory>) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(CollidingStore {
            inner: InMemorySessionStore::new(clock.clone()),
            collisions,
            calls: AtomicUsize::new(0),
        });
        (store, Arc::new(InMemoryUserDirectory::new(clock)))
    }

    #[tokio::test]
    async fn token_collision_is_retried() {
        let (store, users) = colliding(2);
        let service = service_with_store(store.clone(), users);
        register_alice(&service).await;

        let outcome = service
            .login("alice@example.com", "correct-horse", &client())
            .await
            .unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(service
            .authenticate(outcome.session.token.as_str())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn persistent_collisions_surface_after_bounded_attempts() {
        let (store, users) = colliding(usize::MAX);
        let service = service_with_store(store.clone(), users);
        register_alice(&service).await;

        assert_matches!(
            service
                .login("alice@example.com", "correct-horse", &client())
                .await,
            Err(CoreError::DuplicateToken)
        );
        assert_eq!(
            store.calls.load(Ordering::SeqCst),
            DEFAULT_MAX_TOKEN_ATTEMPTS as usize
        );
    }

    /// A directory whose uniqueness constraint fires even though the
    /// pre-check saw nothing (a concurrent registration won the race).
    struct RacingDirectory;

    #[async_trait]
    impl UserDirectory for RacingDirectory {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DirectoryError> {
            Ok(None)
        }
        async fn find_by_id(&self, _id: DbId) -> Result<Option<User>, DirectoryError> {
            Ok(None)
        }
        async fn list(&self) -> Result<Vec<User>, DirectoryError> {
            Ok(Vec::new())
        }
        async fn insert(&self, _input: &NewUser) -> Result<User, DirectoryError> {
            Err(DirectoryError::EmailTaken)
        }
    }

    #[tokio::test]
    async fn downstream_uniqueness_violation_is_already_exists() {
        let clock = Arc::new(ManualClock::starting_now());
        let service = service_with_store(
            Arc::new(InMemorySessionStore::new(clock)),
            Arc::new(RacingDirectory),
        );
        assert_matches!(
            service
                .create_user("Alice", "alice@example.com", "correct-horse")
                .await,
            Err(CoreError::AlreadyExists)
        );
    }

    struct DeadEntropy;

    impl EntropySource for DeadEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError("no entropy".into()))
        }
    }

    #[tokio::test]
    async fn entropy_failure_propagates() {
        let clock = Arc::new(ManualClock::starting_now());
        let result = AuthService::new(
            Arc::new(InMemoryUserDirectory::new(clock.clone())),
            Arc::new(InMemorySessionStore::new(clock.clone())),
            cheap_hasher(),
            TokenGenerator::new(Arc::new(DeadEntropy)),
            clock,
            AuthSettings::default(),
        );
        assert_matches!(result.err(), Some(CoreError::EntropyUnavailable));
    }

    #[test]
    fn non_positive_session_lifetime_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let result = AuthService::new(
            Arc::new(InMemoryUserDirectory::new(clock.clone())),
            Arc::new(InMemorySessionStore::new(clock.clone())),
            cheap_hasher(),
            TokenGenerator::os(),
            clock,
            AuthSettings {
                session_ttl: Duration::zero(),
                ..AuthSettings::default()
            },
        );
        assert_matches!(result.err(), Some(CoreError::Validation(_)));
    }

    #[test]
    fn debug_output_hides_decoy_hash() {
        let h = harness();
        let rendered = format!("{:?}", h.service);
        assert!(rendered.starts_with("AuthService"));
        assert!(!rendered.contains("$argon2"));
    }

    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn create_session(&self, _input: NewSession) -> StoreResult<Session> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn get_session_by_token_hash(&self, _hash: &TokenHash) -> StoreResult<Session> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn revoke_session_by_token_hash(&self, _hash: &TokenHash) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn revoke_all_sessions_for_user(&self, _user_id: DbId) -> StoreResult<u64> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn list_active_sessions_for_user(&self, _user_id: DbId) -> StoreResult<Vec<Session>> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn purge_expired(&self) -> StoreResult<u64> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn backend_failures_are_not_reported_as_unauthorized() {
        let clock = Arc::new(ManualClock::starting_now());
        let service = service_with_store(
            Arc::new(BrokenStore),
            Arc::new(InMemoryUserDirectory::new(clock)),
        );
        register_alice(&service).await;

        assert_matches!(
            service
                .login("alice@example.com", "correct-horse", &client())
                .await,
            Err(CoreError::Storage(_))
        );
        assert_matches!(
            service.authenticate("whatever").await,
            Err(CoreError::Storage(_))
        );
    }
}
