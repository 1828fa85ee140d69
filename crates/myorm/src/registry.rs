//! Named connection registry.
//!
//! A [`Registry`] maps names to [`ConnectionConfig`]s and lazily builds one
//! pool per name on first use. Every [`Registry::get`] returns a fresh pooled
//! [`Executor`] sharing that cached pool. There is no process-wide instance:
//! create one at startup and pass it to whatever needs lookups.
//!
//! ```ignore
//! let registry = Registry::new();
//! registry.register("main", ConnectionConfig::from_file("db.toml", "main")?).await;
//!
//! let db = registry.get("main").await?;
//! let n = db.table("users").count().await?;
//!
//! registry.disconnect_all().await;
//! ```

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::pool::connect;
use mysql_async::Pool;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct RegistryState {
    configs: HashMap<String, ConnectionConfig>,
    pools: HashMap<String, Pool>,
}

/// Named configurations and the pools built from them.
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named configuration.
    ///
    /// Replacing a name drops its cached pool so the next [`get`](Self::get)
    /// connects with the new settings.
    pub async fn register(&self, name: impl Into<String>, config: ConnectionConfig) {
        let name = name.into();
        let stale = {
            let mut state = self.state.lock().await;
            state.configs.insert(name.clone(), config);
            state.pools.remove(&name)
        };

        if let Some(pool) = stale {
            tracing::debug!(target: "myorm.sql", name = %name, "replacing registered connection");
            if let Err(err) = pool.disconnect().await {
                tracing::warn!(target: "myorm.sql", name = %name, error = %err, "pool disconnect failed");
            }
        }
    }

    /// The configuration registered under `name`.
    pub async fn config(&self, name: &str) -> Option<ConnectionConfig> {
        self.state.lock().await.configs.get(name).cloned()
    }

    /// Registered names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.configs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a pool for `name` has been built and is cached.
    pub async fn is_cached(&self, name: &str) -> bool {
        self.state.lock().await.pools.contains_key(name)
    }

    /// A pooled executor for `name`, connecting on first use.
    ///
    /// Fails with [`OrmError::NotFound`] when nothing is registered under `name`.
    pub async fn get(&self, name: &str) -> OrmResult<Executor> {
        let mut state = self.state.lock().await;

        if let Some(pool) = state.pools.get(name) {
            return Ok(Executor::pooled(pool.clone()));
        }

        let config = state
            .configs
            .get(name)
            .ok_or_else(|| OrmError::not_found(format!("no connection registered as '{name}'")))?;

        // The lock is held across connect so concurrent callers share one pool.
        let executor = connect(config).await?;
        if let Some(pool) = executor.pool() {
            state.pools.insert(name.to_string(), pool.clone());
        }
        Ok(executor)
    }

    /// Forget `name` and shut down its pool. Returns whether it was registered.
    pub async fn remove(&self, name: &str) -> bool {
        let (known, pool) = {
            let mut state = self.state.lock().await;
            (state.configs.remove(name).is_some(), state.pools.remove(name))
        };

        if let Some(pool) = pool {
            if let Err(err) = pool.disconnect().await {
                tracing::warn!(target: "myorm.sql", name = %name, error = %err, "pool disconnect failed");
            }
        }
        known
    }

    /// Shut down every cached pool. Configurations stay registered.
    pub async fn disconnect_all(&self) {
        let pools: Vec<(String, Pool)> = self.state.lock().await.pools.drain().collect();

        for (name, pool) in pools {
            if let Err(err) = pool.disconnect().await {
                tracing::warn!(target: "myorm.sql", name = %name, error = %err, "pool disconnect failed");
            }
        }
    }
}
