//! Database configuration.

use std::time::Duration;

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a read-cache entry stays valid.
    ///
    /// `Duration::ZERO` disables the cache.
    pub cache_ttl: Duration,

    /// Minimum time between bulk sweeps of expired cache entries.
    pub cache_sweep_interval: Duration,

    /// Whether the snapshot file is pretty-printed.
    pub pretty_print: bool,

    /// Whether to fsync the snapshot file on every commit.
    pub sync_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            cache_sweep_interval: Duration::from_secs(10 * 60),
            pretty_print: true,
            sync_on_commit: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read-cache time-to-live.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the interval between expired-entry sweeps.
    #[must_use]
    pub const fn cache_sweep_interval(mut self, interval: Duration) -> Self {
        self.cache_sweep_interval = interval;
        self
    }

    /// Sets whether the snapshot file is pretty-printed.
    #[must_use]
    pub const fn pretty_print(mut self, value: bool) -> Self {
        self.pretty_print = value;
        self
    }

    /// Sets whether to fsync on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}
