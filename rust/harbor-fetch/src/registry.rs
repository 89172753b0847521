use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use crate::{FetchContext, FetchError, FetchStream, Fetcher, Metadata};

/// The set of [Fetcher]s available to a process, keyed by plugin id. Hosts
/// build one at startup and share it (it is cheap to clone).
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: BTreeMap<&'static str, Arc<dyn Fetcher>>,
}

impl FetcherRegistry {
    /// Register a [Fetcher] under its plugin id. Registering a second fetcher
    /// with an id that is already taken is an error.
    pub fn register<F>(&mut self, fetcher: F) -> Result<(), FetchError>
    where
        F: Fetcher + 'static,
    {
        self.register_shared(Arc::new(fetcher))
    }

    pub fn register_shared(&mut self, fetcher: Arc<dyn Fetcher>) -> Result<(), FetchError> {
        let plugin_id = fetcher.plugin_id();

        if self.fetchers.contains_key(plugin_id) {
            return Err(FetchError::DuplicateFetcher(plugin_id.to_string()));
        }

        debug!("Registered fetcher {}", plugin_id);
        self.fetchers.insert(plugin_id, fetcher);
        Ok(())
    }

    pub fn get(&self, plugin_id: &str) -> Option<Arc<dyn Fetcher>> {
        self.fetchers.get(plugin_id).cloned()
    }

    pub fn plugin_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fetchers.keys().copied()
    }

    /// Fetch `key` with the fetcher registered under `plugin_id`
    pub async fn fetch(
        &self,
        plugin_id: &str,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        let fetcher = self
            .fetchers
            .get(plugin_id)
            .ok_or_else(|| FetchError::UnknownFetcher(plugin_id.to_string()))?;

        fetcher.fetch(key, metadata, context).await
    }
}

impl Debug for FetcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("fetchers", &self.fetchers.keys().collect::<Vec<_>>())
            .finish()
    }
}
