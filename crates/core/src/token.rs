//! Opaque session tokens and their digests.
//!
//! A [`SessionToken`] is 32 bytes from the operating system CSPRNG encoded
//! as unpadded base64url. It is handed to the client once and never stored.
//! The session store is keyed by its [`TokenHash`], a SHA-256 hex digest: the
//! token already carries 256 bits of entropy, so a fast digest is enough
//! here and the slow password hasher is never used for tokens.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Number of random bytes in a session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// The random source could not supply bytes.
#[derive(Debug, thiserror::Error)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(pub String);

/// A cryptographically secure byte source.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError(e.to_string()))
    }
}

/// Raw bearer token as issued to, or presented by, a client.
///
/// `Debug` is redacted so the token cannot leak through `{:?}` logging.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token presented by a client.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Digest used as the session store key.
    pub fn digest(&self) -> TokenHash {
        TokenHash::of_raw(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// SHA-256 hex digest of a session token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    pub fn of_raw(raw: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(raw.as_bytes())))
    }

    /// Rebuild a digest read back from storage.
    pub fn from_stored(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to correlate in a debugger, not enough to look a session up.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "TokenHash({prefix}..)")
    }
}

/// Produces session tokens from an [`EntropySource`].
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn EntropySource>,
}

impl TokenGenerator {
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Generator backed by the operating system CSPRNG.
    pub fn os() -> Self {
        Self::new(Arc::new(OsEntropy))
    }

    /// Draw [`TOKEN_BYTES`] random bytes and encode them as unpadded base64url.
    ///
    /// Fails with [`CoreError::EntropyUnavailable`] if the source fails; there
    /// is no fallback to a weaker generator.
    pub fn generate(&self) -> Result<SessionToken, CoreError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.source.fill(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "Could not draw session token bytes");
            CoreError::EntropyUnavailable
        })?;
        Ok(SessionToken(URL_SAFE_NO_PAD.encode(bytes)))
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::os()
    }
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use super::*;

    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError("device unavailable".into()))
        }
    }

    #[test]
    fn token_is_url_safe_and_unpadded() {
        let token = TokenGenerator::os().generate().unwrap();
        // 32 bytes -> 43 base64 chars without padding.
        assert_eq!(token.as_str().len(), 43);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(URL_SAFE_NO_PAD.decode(token.as_str()).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn ten_thousand_tokens_are_distinct() {
        let generator = TokenGenerator::os();
        let tokens: HashSet<String> = (0..10_000)
            .map(|_| generator.generate().unwrap().into_inner())
            .collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn failing_source_is_not_papered_over() {
        let generator = TokenGenerator::new(Arc::new(BrokenEntropy));
        assert_matches!(generator.generate(), Err(CoreError::EntropyUnavailable));
    }

    #[test]
    fn digest_is_stable_sha256_hex() {
        let token = SessionToken::from_raw("abc");
        assert_eq!(token.digest(), TokenHash::of_raw("abc"));
        assert_eq!(
            token.digest().as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(TokenHash::of_raw("abc"), TokenHash::of_raw("abd"));
    }

    #[test]
    fn debug_output_does_not_leak_secrets() {
        let token = TokenGenerator::os().generate().unwrap();
        let printed = format!("{token:?}");
        assert!(!printed.contains(token.as_str()));

        let digest = token.digest();
        assert!(!format!("{digest:?}").contains(digest.as_str()));
    }
}
