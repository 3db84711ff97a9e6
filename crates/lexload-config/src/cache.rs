//! Lock-free holder for the configuration currently in effect.

use crate::schema::Config;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Shared, swappable configuration.
///
/// Readers take a snapshot with [`get`](Self::get) and keep using it even if
/// the configuration is replaced afterwards.
#[derive(Debug)]
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Holds `config` as the configuration in effect.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Snapshot of the configuration in effect.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Replaces the configuration, returning the one it replaced.
    pub fn update(&self, config: Config) -> Arc<Config> {
        self.config.swap(Arc::new(config))
    }

    /// Applies `f` to a copy of the current configuration and stores it,
    /// returning the configuration it replaced.
    ///
    /// `f` may run more than once if another writer races this one.
    pub fn modify(&self, f: impl Fn(&mut Config)) -> Arc<Config> {
        self.config.rcu(|current| {
            let mut next = Config::clone(current);
            f(&mut next);
            next
        })
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
