//! Memoized [`KinstaClient`] keyed on the configuration fingerprint.

use crate::config::{self, Configuration, EnvSource, ProcessEnv};
use crate::runtime::{ClientError, KinstaClient};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: String,
    client: Arc<KinstaClient>,
}

/// Holds at most one client, rebuilt whenever the environment's configuration changes.
///
/// The fingerprint is recomputed from the live environment on every lookup, so external
/// configuration changes are picked up without an explicit invalidation.
///
/// Lookup and rebuild are not one critical section: two concurrent callers that both observe a
/// miss will each build a client and the last write wins. Both clients are valid for the same
/// configuration.
pub struct ClientCache {
    env: Arc<dyn EnvSource>,
    timeout: Duration,
    slot: RwLock<Option<CacheEntry>>,
    builds: AtomicUsize,
}

impl ClientCache {
    #[must_use]
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self {
            env,
            timeout: KinstaClient::DEFAULT_TIMEOUT,
            slot: RwLock::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn from_process_env() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }

    /// Request timeout applied to clients built from now on.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Return the cached client, or build one from the current environment.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message if the configuration is incomplete or the client cannot be
    /// built. The cache is cleared in that case.
    pub fn get_client(&self) -> Result<Arc<KinstaClient>, String> {
        let fingerprint = config::fingerprint(self.env.as_ref());

        if let Some(entry) = self.slot.read().as_ref()
            && entry.fingerprint == fingerprint
        {
            return Ok(Arc::clone(&entry.client));
        }

        match self.build() {
            Ok(client) => {
                let client = Arc::new(client);
                let builds = self.builds.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    builds,
                    base_url = %client.config().base_url(),
                    "built kinsta api client"
                );
                *self.slot.write() = Some(CacheEntry {
                    fingerprint,
                    client: Arc::clone(&client),
                });
                Ok(client)
            }
            Err(e) => {
                self.invalidate();
                warn!(error = %e, "kinsta api client unavailable");
                Err(e.to_string())
            }
        }
    }

    /// [`ClientCache::get_client`] for call sites that propagate with `?` into `anyhow`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ClientCache::get_client`].
    pub fn require_client(&self) -> anyhow::Result<Arc<KinstaClient>> {
        self.get_client().map_err(anyhow::Error::msg)
    }

    /// Drop the cached client so the next lookup reloads credentials.
    pub fn invalidate(&self) {
        self.slot.write().take();
    }

    /// Number of clients built over the lifetime of this cache.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    fn build(&self) -> Result<KinstaClient, ClientError> {
        let config = Configuration::load(self.env.as_ref())?;
        KinstaClient::with_timeout(config, self.timeout)
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("timeout", &self.timeout)
            .field("cached", &self.slot.read().is_some())
            .field("builds", &self.build_count())
            .finish_non_exhaustive()
    }
}
