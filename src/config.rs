//! Per-platform import policy and its time-bounded cache.
//!
//! [`PlatformConfig`] tells the pipeline what a platform's exports look like
//! from the outside: which content types to accept, how large a file may
//! be, and how the platform's role vocabulary maps onto canonical roles.
//!
//! [`PlatformConfigStore`] caches configs with a fixed time-to-live so that
//! config edits at the backing source propagate without a restart. A reload
//! failure keeps serving the stale entry — config staleness is preferable
//! to total unavailability.
//!
//! # Example
//!
//! ```rust
//! use chatstitch::config::{PlatformConfigStore, StaticConfigSource};
//! use chatstitch::platform::Platform;
//! use std::sync::Arc;
//!
//! let store = PlatformConfigStore::new(Arc::new(StaticConfigSource::default()));
//! let config = store.get(Platform::ChatGpt).unwrap();
//! assert!(config.allowed_types.iter().any(|t| t == "application/json"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::message::Role;
use crate::platform::Platform;

/// Default payload size cap applied when a platform config omits its own.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB

/// Default cache time-to-live for platform configs.
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Field-mapping rules for one platform's export layout.
///
/// Today this carries the role vocabulary; parsers consult it before
/// falling back to [`Role::from_alias`], so a platform introducing a new
/// author label can be handled by a config edit instead of a release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    /// Platform-native role label (lowercase) to canonical role.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub role_aliases: BTreeMap<String, Role>,
}

impl FieldMap {
    /// Resolves a platform-native role label, preferring configured aliases
    /// over the built-in vocabulary.
    pub fn resolve_role(&self, label: &str) -> Role {
        self.role_aliases
            .get(&label.to_lowercase())
            .copied()
            .unwrap_or_else(|| Role::from_alias(label))
    }
}

/// Parsing and validation policy for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform this config applies to.
    pub platform: Platform,
    /// Accepted declared content types (lowercase, without parameters).
    pub allowed_types: Vec<String>,
    /// Maximum accepted payload size in bytes.
    ///
    /// `None` means the policy default of [`DEFAULT_MAX_FILE_SIZE`].
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Export schema version this config targets.
    pub schema_version: u32,
    /// Field-mapping rules.
    #[serde(default)]
    pub mapping: FieldMap,
}

impl PlatformConfig {
    /// Creates a config accepting JSON exports with default limits.
    pub fn json_default(platform: Platform) -> Self {
        Self {
            platform,
            allowed_types: vec!["application/json".to_string()],
            max_file_size: None,
            schema_version: 1,
            mapping: FieldMap::default(),
        }
    }

    /// Returns the effective size limit for this platform.
    pub fn effective_max_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }
}

/// A transient failure while fetching config from the backing source.
///
/// Distinct from a platform being absent: absence means the platform is
/// unsupported, a fetch error means the source is temporarily unreachable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("config source unavailable: {0}")]
pub struct ConfigFetchError(pub String);

/// Backing source of platform configs (an external collaborator).
///
/// `Ok(None)` means the platform is not present in the source at all;
/// `Err` means the fetch itself failed and a cached entry should keep
/// serving.
pub trait ConfigSource: Send + Sync {
    /// Loads the active config for one platform.
    fn load(&self, platform: Platform)
    -> std::result::Result<Option<PlatformConfig>, ConfigFetchError>;
}

/// In-process config source with built-in defaults for every supported
/// platform. Doubles as the reference `ConfigSource` for tests.
#[derive(Debug)]
pub struct StaticConfigSource {
    configs: RwLock<HashMap<Platform, PlatformConfig>>,
}

impl Default for StaticConfigSource {
    fn default() -> Self {
        let configs = Platform::all()
            .iter()
            .map(|p| (*p, PlatformConfig::json_default(*p)))
            .collect();
        Self {
            configs: RwLock::new(configs),
        }
    }
}

impl StaticConfigSource {
    /// Creates a source holding exactly the given configs.
    pub fn with_configs(configs: impl IntoIterator<Item = PlatformConfig>) -> Self {
        Self {
            configs: RwLock::new(configs.into_iter().map(|c| (c.platform, c)).collect()),
        }
    }

    /// Replaces the config for one platform.
    pub fn set(&self, config: PlatformConfig) {
        self.configs.write().insert(config.platform, config);
    }

    /// Removes a platform from the source entirely.
    pub fn remove(&self, platform: Platform) {
        self.configs.write().remove(&platform);
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(
        &self,
        platform: Platform,
    ) -> std::result::Result<Option<PlatformConfig>, ConfigFetchError> {
        Ok(self.configs.read().get(&platform).cloned())
    }
}

struct CacheEntry {
    config: Arc<PlatformConfig>,
    loaded_at: Instant,
}

/// Time-bounded cache in front of a [`ConfigSource`].
///
/// Entries are replaced atomically: a lookup racing a reload observes
/// either the stale-but-valid entry or the freshly loaded one, never a
/// partially updated one.
pub struct PlatformConfigStore {
    source: Arc<dyn ConfigSource>,
    ttl: Duration,
    cache: RwLock<HashMap<Platform, CacheEntry>>,
}

impl PlatformConfigStore {
    /// Creates a store with the default one hour TTL.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CONFIG_TTL)
    }

    /// Creates a store with an explicit TTL.
    ///
    /// A zero TTL disables caching and hits the source on every lookup,
    /// which is occasionally useful in tests.
    pub fn with_ttl(source: Arc<dyn ConfigSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the active config for a platform.
    ///
    /// A fresh cached entry is served as-is. On expiry the source is asked
    /// again; if that reload fails, the stale entry keeps serving and the
    /// failure is logged as non-fatal. A platform absent from the source
    /// (or unreachable with nothing cached) is reported as
    /// [`ImportError::UnsupportedPlatform`].
    pub fn get(&self, platform: Platform) -> Result<Arc<PlatformConfig>> {
        {
            let cache = self.cache.read();
            if let Some(entry) = cache.get(&platform) {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.config));
                }
            }
        }

        match self.source.load(platform) {
            Ok(Some(config)) => {
                debug!(platform = %platform, schema_version = config.schema_version, "loaded platform config");
                let config = Arc::new(config);
                self.cache.write().insert(
                    platform,
                    CacheEntry {
                        config: Arc::clone(&config),
                        loaded_at: Instant::now(),
                    },
                );
                Ok(config)
            }
            Ok(None) => {
                // Absent from the source: drop any stale entry so a removed
                // platform stops serving at the next expiry.
                self.cache.write().remove(&platform);
                Err(ImportError::UnsupportedPlatform(
                    platform.as_str().to_string(),
                ))
            }
            Err(err) => {
                let cache = self.cache.read();
                if let Some(entry) = cache.get(&platform) {
                    warn!(platform = %platform, error = %err, "config reload failed, serving stale entry");
                    Ok(Arc::clone(&entry.config))
                } else {
                    warn!(platform = %platform, error = %err, "config fetch failed with no cached entry");
                    Err(ImportError::UnsupportedPlatform(
                        platform.as_str().to_string(),
                    ))
                }
            }
        }
    }
}
