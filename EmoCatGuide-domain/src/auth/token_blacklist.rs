use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};
use once_cell::sync::Lazy;

/// Process-wide blacklist of revoked token ids
static TOKEN_BLACKLIST: Lazy<TokenBlacklist> = Lazy::new(TokenBlacklist::new);

/// Revoked token ids, each kept until the token would have expired.
///
/// The list is bounded. When full, expired entries are dropped; if it is still
/// full the new revocation is refused. Live entries are never evicted.
pub struct TokenBlacklist {
    /// jti -> (token expiration, revocation time)
    revoked_tokens: Mutex<HashMap<String, (SystemTime, SystemTime)>>,
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    /// Create a blacklist holding at most 10,000 entries
    pub fn new() -> Self {
        Self::with_max_size(10_000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revoked_tokens: Mutex::new(HashMap::new()),
            max_size,
        }
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<String, (SystemTime, SystemTime)>> {
        // A poisoned lock still guards a consistent map
        self.revoked_tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Revoke `token_id` until `expiration`.
    ///
    /// Returns false when the list is full of unexpired entries and the id
    /// could not be recorded.
    pub fn revoke_token(&self, token_id: &str, expiration: SystemTime) -> bool {
        let revocation_time = SystemTime::now();
        let mut tokens = self.tokens();

        if tokens.len() >= self.max_size && !tokens.contains_key(token_id) {
            warn!("Token blacklist reached max size ({}), dropping expired entries", self.max_size);
            Self::cleanup_expired_tokens_internal(&mut tokens);

            if tokens.len() >= self.max_size {
                error!("Token blacklist is full of live entries, refusing to revoke {}", token_id);
                return false;
            }
        }

        tokens.insert(token_id.to_string(), (expiration, revocation_time));
        info!("Token revoked: {}", token_id);
        true
    }

    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.tokens().contains_key(token_id)
    }

    /// Number of revoked tokens currently tracked
    pub fn size(&self) -> usize {
        self.tokens().len()
    }

    /// Remove entries whose tokens have expired, returning how many were removed
    pub fn cleanup_expired_tokens(&self) -> usize {
        let mut tokens = self.tokens();
        Self::cleanup_expired_tokens_internal(&mut tokens)
    }

    fn cleanup_expired_tokens_internal(tokens: &mut HashMap<String, (SystemTime, SystemTime)>) -> usize {
        let now = SystemTime::now();
        let before_count = tokens.len();

        tokens.retain(|_, (expiration, _)| *expiration > now);

        let removed = before_count - tokens.len();
        if removed > 0 {
            debug!("Removed {} expired tokens from blacklist", removed);
        }
        removed
    }
}

/// Get a reference to the global token blacklist
pub fn blacklist() -> &'static TokenBlacklist {
    &TOKEN_BLACKLIST
}

/// Spawn a task that prunes expired entries every hour
#[cfg(feature = "with-tokio")]
pub fn start_cleanup_task() {
    use tokio::time;
    use std::time::Duration;

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600));

        loop {
            interval.tick().await;
            debug!("Running scheduled token blacklist cleanup");
            let removed = blacklist().cleanup_expired_tokens();
            debug!("Removed {} expired tokens, {} remain in blacklist",
                  removed, blacklist().size());
        }
    });
}
