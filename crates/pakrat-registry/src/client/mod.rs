//! HTTP client implementation with batching and retry logic

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use pakrat_core::error::PakratError;
use pakrat_core::types::Package;
use reqwest::{Client, ClientBuilder};
use tokio::task::JoinSet;
use tracing::debug;

use crate::api::RpcResponse;
use crate::cache::MetadataCache;
use crate::RegistryResult;

/// Registry used when nothing else is configured
pub const DEFAULT_REGISTRY_URL: &str = "https://aur.archlinux.org";

/// Names sent in a single info request
pub const DEFAULT_MAX_NAMES_PER_REQUEST: usize = 200;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Settings for a [`RegistryClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Registry base URL, without the `/rpc` path
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Chunk size for batched info requests
    pub max_names_per_request: usize,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_names_per_request: DEFAULT_MAX_NAMES_PER_REQUEST,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Outcome of a batched lookup.
///
/// Names the registry does not know are not an error; they are returned in
/// `missing` next to the records that were found.
#[derive(Debug, Clone, Default)]
pub struct InfoResult {
    /// Found records, in request order
    pub packages: Vec<Package>,
    /// Requested names without a record, in request order
    pub missing: Vec<String>,
}

/// Batched multi-name lookup against a package registry
pub trait RegistryQuery: Send + Sync {
    /// Look up every name. Transport failures are errors, unknown names are not.
    fn info(&self, names: &[String]) -> impl Future<Output = RegistryResult<InfoResult>> + Send;
}

/// HTTP client for the registry RPC interface
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Base registry URL
    base_url: String,
    max_names_per_request: usize,
    cache: Arc<MetadataCache>,
}

impl RegistryClient {
    /// Create new registry client for the default registry
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create registry client with custom configuration
    pub fn with_config(config: ClientConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(concat!("pakrat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PakratError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            retry_config: config.retry,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_names_per_request: config.max_names_per_request.max(1),
            cache: Arc::new(MetadataCache::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Records cached by this client
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Registry-reported errors will not go away on retry
                    let retryable = !matches!(error, PakratError::Registry { .. });
                    last_error = Some(error);

                    if attempt == self.retry_config.max_retries || !retryable {
                        break;
                    }

                    debug!(attempt, ?delay, "registry request failed, retrying");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }

        Err(last_error.unwrap_or_else(|| PakratError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// Fetch one chunk of names with retry logic
    async fn fetch_chunk(&self, names: &[String]) -> RegistryResult<Vec<Package>> {
        let url = format!("{}/rpc/", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("v", "5"), ("type", "info")];
        query.extend(names.iter().map(|name| ("arg[]", name.as_str())));

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|e| PakratError::network(format!("Failed to query registry: {}", e), e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PakratError::Network {
                    message: format!("Registry returned status {}", status),
                    source: None,
                });
            }

            let body = response.json::<RpcResponse>().await.map_err(|e| {
                PakratError::network(format!("Failed to parse registry response: {}", e), e)
            })?;

            if body.is_error() {
                return Err(PakratError::Registry {
                    message: body
                        .error
                        .unwrap_or_else(|| "unknown registry error".to_string()),
                });
            }

            Ok(body
                .results
                .into_iter()
                .map(|result| result.into_package())
                .collect())
        })
        .await
    }

    /// Look up names in batches of `max_names_per_request`.
    ///
    /// Chunks are requested concurrently and merged in request order. Cached
    /// records are served without a request.
    pub async fn info(&self, names: &[String]) -> RegistryResult<InfoResult> {
        let requested: IndexSet<&str> = names.iter().map(String::as_str).collect();

        let mut found: HashMap<String, Package> = HashMap::new();
        let mut uncached = Vec::new();
        for name in &requested {
            match self.cache.get(name) {
                Some(package) => {
                    found.insert(package.name.clone(), package);
                },
                None => uncached.push(name.to_string()),
            }
        }

        if !uncached.is_empty() {
            debug!(
                names = uncached.len(),
                cached = found.len(),
                "querying registry"
            );

            let mut tasks = JoinSet::new();
            for (index, chunk) in uncached.chunks(self.max_names_per_request).enumerate() {
                let client = self.clone();
                let chunk = chunk.to_vec();
                tasks.spawn(async move { (index, client.fetch_chunk(&chunk).await) });
            }

            let mut chunks = Vec::with_capacity(tasks.len());
            while let Some(joined) = tasks.join_next().await {
                let (index, result) = joined
                    .map_err(|e| PakratError::network("Registry request task failed".to_string(), e))?;
                chunks.push((index, result?));
            }
            chunks.sort_by_key(|(index, _)| *index);

            for package in chunks.into_iter().flat_map(|(_, packages)| packages) {
                self.cache.insert(package.clone());
                found.insert(package.name.clone(), package);
            }
        }

        let mut result = InfoResult::default();
        for name in requested {
            match found.remove(name) {
                Some(package) => result.packages.push(package),
                None => result.missing.push(name.to_string()),
            }
        }

        if !result.missing.is_empty() {
            debug!(missing = ?result.missing, "names not found in registry");
        }

        Ok(result)
    }
}

impl RegistryQuery for RegistryClient {
    async fn info(&self, names: &[String]) -> RegistryResult<InfoResult> {
        RegistryClient::info(self, names).await
    }
}

#[cfg(test)]
mod tests;
