// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! A memoizing cache in front of a remote ABI source.
//!
//! Entries are keyed by `network::address::module::function` and stay fresh for
//! [`AbiCacheConfig::ttl_secs`]. Concurrent lookups of the same key share one in-flight fetch. A
//! failed fetch is handed to every waiter and then dropped from the cache, so the next lookup
//! fetches again. Expired entries are swept whenever a new fetch is recorded.

use crate::remote_abi::{fetch_entry_function_abi, EntryFunctionAbi, MoveModuleAbi};
use anyhow::Result;
use async_trait::async_trait;
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use move_core_types::language_storage::ModuleId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Source of module ABIs, usually a fullnode's REST API.
#[async_trait]
pub trait ModuleAbiSource: Send + Sync {
    async fn get_module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi>;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbiCacheConfig {
    /// How long a fetched ABI is served before it is fetched again.
    pub ttl_secs: u64,
    /// Name of the network the ABIs come from. Part of every cache key.
    pub network: String,
}

impl Default for AbiCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            network: "mainnet".to_string(),
        }
    }
}

type SharedAbiFuture =
    Shared<BoxFuture<'static, std::result::Result<Arc<EntryFunctionAbi>, Arc<anyhow::Error>>>>;

struct CacheEntry {
    created_at: Instant,
    future: SharedAbiFuture,
}

/// Converts a future into a shared one by putting the error into an Arc.
fn make_shared<F, T, E>(fut: F) -> Shared<BoxFuture<'static, std::result::Result<T, Arc<E>>>>
where
    T: Clone + Send + 'static,
    E: Send + Sync + 'static,
    F: Future<Output = std::result::Result<T, E>> + Send + 'static,
{
    fut.map(|r| r.map_err(|err| Arc::new(err))).boxed().shared()
}

/// A fetch failure handed to every waiter. The shared error stays reachable as the source, so
/// callers can still downcast along the chain.
#[derive(Debug)]
struct SharedFetchError(Arc<anyhow::Error>);

impl fmt::Display for SharedFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ABI fetch failed")
    }
}

impl std::error::Error for SharedFetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let err: &(dyn std::error::Error + Send + Sync + 'static) = (*self.0).as_ref();
        Some(err)
    }
}

pub struct AbiCache {
    config: AbiCacheConfig,
    source: Arc<dyn ModuleAbiSource>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl AbiCache {
    pub fn new(config: AbiCacheConfig, source: Arc<dyn ModuleAbiSource>) -> Self {
        Self {
            config,
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AbiCacheConfig {
        &self.config
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    fn cache_key(&self, module: &ModuleId, function: &str) -> String {
        format!(
            "{}::{}::{}::{}",
            self.config.network,
            module.address().to_hex_literal(),
            module.name(),
            function
        )
    }

    /// Returns the ABI of `module::function`, fetching it unless a fresh entry or an in-flight
    /// fetch for it exists.
    pub async fn get_entry_function_abi(
        &self,
        module: &ModuleId,
        function: &str,
    ) -> Result<Arc<EntryFunctionAbi>> {
        let key = self.cache_key(module, function);
        let future = self.lookup_or_fetch(&key, module, function);

        match future.clone().await {
            Ok(abi) => Ok(abi),
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to fetch entry function ABI");
                let mut entries = self.entries.lock();
                // A newer fetch may already have replaced the failed one.
                if entries
                    .get(&key)
                    .is_some_and(|entry| entry.future.ptr_eq(&future))
                {
                    entries.remove(&key);
                }
                Err(anyhow::Error::new(SharedFetchError(err))
                    .context(format!("ABI lookup for {} failed", key)))
            },
        }
    }

    fn lookup_or_fetch(&self, key: &str, module: &ModuleId, function: &str) -> SharedAbiFuture {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            if entry.created_at.elapsed() < self.ttl() {
                debug!(key = %key, "ABI cache hit");
                return entry.future.clone();
            }
            debug!(key = %key, "ABI cache entry expired");
        } else {
            debug!(key = %key, "ABI cache miss");
        }

        let ttl = self.ttl();
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        if entries.len() < before {
            debug!(swept = before - entries.len(), "Dropped expired ABI cache entries");
        }

        let source = self.source.clone();
        let module = module.clone();
        let function = function.to_string();
        let future = make_shared(async move {
            fetch_entry_function_abi(source.as_ref(), &module, &function)
                .await
                .map(Arc::new)
        });
        entries.insert(key.to_string(), CacheEntry {
            created_at: Instant::now(),
            future: future.clone(),
        });
        future
    }

    /// Drops the entry for `module::function`, if any.
    pub fn invalidate(&self, module: &ModuleId, function: &str) {
        let key = self.cache_key(module, function);
        self.entries.lock().remove(&key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote_abi::{MoveFunctionAbi, MoveFunctionGenericTypeParam};
    use claims::{assert_err, assert_ok};
    use move_core_types::{account_address::AccountAddress, identifier::Identifier};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("node unavailable")]
    struct NodeUnavailable;

    struct CountingSource {
        calls: AtomicUsize,
        failures_left: AtomicUsize,
        delay: Duration,
    }

    impl CountingSource {
        fn new(failures: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(failures),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModuleAbiSource for CountingSource {
        async fn get_module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NodeUnavailable.into());
            }
            Ok(MoveModuleAbi {
                address: module.address().to_hex_literal(),
                name: module.name().to_string(),
                friends: vec![],
                exposed_functions: vec![MoveFunctionAbi {
                    name: "transfer".to_string(),
                    visibility: "public".to_string(),
                    is_entry: true,
                    is_view: false,
                    generic_type_params: vec![MoveFunctionGenericTypeParam::default()],
                    params: vec!["&signer".to_string(), "address".to_string(), "u64".to_string()],
                    return_: vec![],
                }],
            })
        }
    }

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn coin() -> ModuleId {
        ModuleId::new(AccountAddress::ONE, Identifier::new("coin").unwrap())
    }

    fn cache(source: Arc<CountingSource>, ttl_secs: u64) -> AbiCache {
        AbiCache::new(
            AbiCacheConfig {
                ttl_secs,
                network: "testnet".to_string(),
            },
            source,
        )
    }

    #[test]
    fn test_config_defaults() {
        let config: AbiCacheConfig = serde_json::from_str(r#"{"network": "devnet"}"#).unwrap();
        assert_eq!(config.ttl_secs, 300);
        assert_eq!(config.network, "devnet");
        assert_err!(serde_json::from_str::<AbiCacheConfig>(r#"{"ttl": 5}"#));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        init_logging();
        let source = CountingSource::new(0, Duration::from_millis(20));
        let cache = cache(source.clone(), 300);
        let module = coin();

        let (first, second, third) = tokio::join!(
            cache.get_entry_function_abi(&module, "transfer"),
            cache.get_entry_function_abi(&module, "transfer"),
            cache.get_entry_function_abi(&module, "transfer"),
        );
        let first = first.unwrap();
        assert!(Arc::ptr_eq(&first, &second.unwrap()));
        assert!(Arc::ptr_eq(&first, &third.unwrap()));
        assert_eq!(source.calls(), 1);
        assert_eq!(first.params().len(), 2);
        assert_eq!(first.type_param_count(), 1);

        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let source = CountingSource::new(0, Duration::ZERO);
        let cache = cache(source.clone(), 60);
        let module = coin();

        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        init_logging();
        let source = CountingSource::new(1, Duration::ZERO);
        let cache = cache(source.clone(), 300);
        let module = coin();

        let err = cache
            .get_entry_function_abi(&module, "transfer")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("node unavailable"));
        assert!(format!("{:#}", err).contains("testnet::0x1::coin::transfer"));
        assert!(err
            .chain()
            .any(|cause| cause.downcast_ref::<NodeUnavailable>().is_some()));
        assert!(cache.is_empty());

        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_every_waiter_sees_the_typed_failure() {
        let source = CountingSource::new(1, Duration::from_millis(20));
        let cache = cache(source.clone(), 300);
        let module = coin();

        let (first, second) = tokio::join!(
            cache.get_entry_function_abi(&module, "transfer"),
            cache.get_entry_function_abi(&module, "transfer"),
        );
        assert_eq!(source.calls(), 1);
        for err in [first.unwrap_err(), second.unwrap_err()] {
            assert!(err
                .chain()
                .any(|cause| cause.downcast_ref::<NodeUnavailable>().is_some()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_swept_on_insert() {
        let source = CountingSource::new(0, Duration::ZERO);
        let cache = cache(source.clone(), 60);
        let coin = coin();
        let account = ModuleId::new(AccountAddress::ONE, Identifier::new("aptos_account").unwrap());
        let staking = ModuleId::new(AccountAddress::ONE, Identifier::new("staking").unwrap());

        assert_ok!(cache.get_entry_function_abi(&coin, "transfer").await);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_ok!(cache.get_entry_function_abi(&account, "transfer").await);
        assert_eq!(cache.len(), 2);

        // The coin entry went stale and is never looked up again.
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_ok!(cache.get_entry_function_abi(&staking, "transfer").await);
        assert_eq!(cache.len(), 2);
        cache.invalidate(&account, "transfer");
        cache.invalidate(&staking, "transfer");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_per_function_and_invalidation() {
        let source = CountingSource::new(0, Duration::ZERO);
        let cache = cache(source.clone(), 300);
        let module = coin();

        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        // Unknown functions fail after the module was fetched and leave no entry behind.
        assert_err!(cache.get_entry_function_abi(&module, "mint").await);
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len(), 1);

        cache.invalidate(&module, "transfer");
        assert!(cache.is_empty());
        assert_ok!(cache.get_entry_function_abi(&module, "transfer").await);
        assert_eq!(source.calls(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }
}
