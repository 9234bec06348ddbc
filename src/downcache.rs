//! Cache-or-fetch orchestration
//!
//! [`Downcache`] answers a retrieve from the on-disk cache when it can and
//! otherwise goes live through the rate limiter, writing the body back to the
//! cache on a 200.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use url::Url;

use crate::cache::path::{parse_url, url_to_path};
use crate::cache::{cache_file_path, CacheStore, FsStorage, Storage};
use crate::config::{Config, ConfigUpdate, LogLevel};
use crate::errors::{DowncacheError, Result};
use crate::fetch::{
    Body, FetchRequest, FetchResult, FetchStatus, FetchedResponse, Fetcher, ReqwestFetcher,
    RetrieveOptions,
};
use crate::limiter::RateLimiter;
use crate::observer::{Observer, Severity, TracingObserver};

/// Everything a single call needs, resolved at call start
struct Plan {
    url: Url,
    /// URL exactly as the caller gave it
    url_str: String,
    /// Cache file path, base directory included
    path: PathBuf,
    force: bool,
    no_cache: bool,
    json: bool,
    log_level: LogLevel,
    limiter: Arc<RateLimiter>,
}

/// Disk-backed HTTP response cache
///
/// Cheap to share behind an `Arc`; concurrent retrieves proceed independently.
/// Each instance owns its config and rate limiter, so several can coexist.
pub struct Downcache {
    config: RwLock<Config>,
    /// Shared token bucket for live fetches; replaced when the configured limit changes
    limiter: RwLock<Arc<RateLimiter>>,
    fetcher: Arc<dyn Fetcher>,
    store: CacheStore,
    observer: Arc<dyn Observer>,
}

impl Downcache {
    /// Create a cache that fetches with reqwest and stores on the local filesystem
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = ReqwestFetcher::new()?;
        Ok(Self::with_parts(config, Arc::new(fetcher), Arc::new(FsStorage)))
    }

    /// Create a cache from explicit capabilities
    pub fn with_parts(config: Config, fetcher: Arc<dyn Fetcher>, storage: Arc<dyn Storage>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self {
            config: RwLock::new(config),
            limiter: RwLock::new(limiter),
            fetcher,
            store: CacheStore::new(storage),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the event observer
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Snapshot of the current config
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Merge a partial update into the config
    ///
    /// A changed rate limit replaces the token bucket; the next live fetch
    /// starts from a fresh one.
    pub fn configure(&self, update: ConfigUpdate) {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        if config.apply(update) {
            // Swapped under the config guard so a concurrent plan() sees the
            // new limit and the new bucket together
            let fresh = Arc::new(RateLimiter::new(config.rate_limit));
            *self.limiter.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        }
    }

    /// Set one setting by name, e.g. `set("limit", "500")`
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.configure(ConfigUpdate::from_pair(key, value)?);
        Ok(())
    }

    /// Return the cached body for a URL, fetching and caching it on a miss
    ///
    /// Request fields override the config snapshot taken when the call starts.
    /// A per-call `rate_limit` does not affect gating: every live fetch draws
    /// from the one bucket built from the configured limit.
    pub async fn retrieve(&self, request: impl Into<FetchRequest>) -> Result<FetchResult> {
        let plan = self.plan(request.into())?;

        if plan.force {
            self.emit(&plan, Severity::Verbose, "Forced live call, ignoring cache");
        } else if let Some(body) = self.store.read(&plan.path).await {
            self.emit(
                &plan,
                Severity::Verbose,
                &format!("Loaded from cache at {}", plan.path.display()),
            );
            let result = FetchResult {
                status: FetchStatus::FromCache,
                url: plan.url_str.clone(),
                path: plan.path.clone(),
                body: Body::Raw(body),
                status_code: None,
                headers: None,
            };
            return self.finish(&plan, result);
        } else {
            self.emit(
                &plan,
                Severity::Verbose,
                &format!(
                    "Not in cache (looked for it at {}), calling live",
                    plan.path.display()
                ),
            );
        }

        self.live(&plan, true).await
    }

    /// [`Self::retrieve`] for a bare URL plus options
    pub async fn retrieve_url(&self, url: &str, options: RetrieveOptions) -> Result<FetchResult> {
        self.retrieve(FetchRequest::with_options(url, options)).await
    }

    /// Fetch live through the rate limiter without reading the cache
    pub async fn download(&self, request: impl Into<FetchRequest>) -> Result<FetchResult> {
        let plan = self.plan(request.into())?;
        self.live(&plan, true).await
    }

    /// Fetch live without reading the cache or consulting the rate limiter
    pub async fn download_direct(&self, request: impl Into<FetchRequest>) -> Result<FetchResult> {
        let plan = self.plan(request.into())?;
        self.live(&plan, false).await
    }

    /// Resolve a request against the current config
    fn plan(&self, request: FetchRequest) -> Result<Plan> {
        let (config, limiter) = {
            let config = self.config.read().unwrap_or_else(|e| e.into_inner());
            let limiter = Arc::clone(&self.limiter.read().unwrap_or_else(|e| e.into_inner()));
            (config.clone(), limiter)
        };
        let FetchRequest { url: url_str, options } = request;

        let url = parse_url(&url_str)?;
        let relative = options
            .path
            .unwrap_or_else(|| PathBuf::from(url_to_path(&url)));
        let base_directory = options.directory.unwrap_or(config.base_directory);
        let path = cache_file_path(&base_directory, &relative);

        Ok(Plan {
            url,
            url_str,
            path,
            force: options.force,
            no_cache: options.no_cache,
            json: options.json,
            log_level: config.log_level,
            limiter,
        })
    }

    /// The live leg: rate limit, fetch, write through
    async fn live(&self, plan: &Plan, rate_limited: bool) -> Result<FetchResult> {
        if rate_limited && plan.limiter.acquire().is_err() {
            self.emit(plan, Severity::Warn, "Rate limited");
            return Err(DowncacheError::RateLimited {
                url: plan.url_str.clone(),
            });
        }

        let response = match self.fetcher.fetch(&plan.url).await {
            Ok(response) => response,
            Err(source) => {
                self.emit(
                    plan,
                    Severity::Error,
                    &format!("Error retrieving: {}", source),
                );
                return Err(DowncacheError::Fetch {
                    url: plan.url_str.clone(),
                    source,
                });
            }
        };

        if response.status_code != 200 {
            self.emit(
                plan,
                Severity::Info,
                &format!(
                    "Did not cache because response code was {}",
                    response.status_code
                ),
            );
            return Err(DowncacheError::BadStatus {
                url: plan.url_str.clone(),
                response: Box::new(response),
            });
        }

        let FetchedResponse {
            status_code,
            headers,
            body,
        } = response;

        let status = if plan.no_cache {
            FetchStatus::FetchedNotCached
        } else {
            match self.store.write(&plan.path, &body).await {
                Ok(()) => {
                    self.emit(
                        plan,
                        Severity::Verbose,
                        &format!("Cached at {}", plan.path.display()),
                    );
                    FetchStatus::FetchedAndCached
                }
                Err(e) => {
                    self.emit(
                        plan,
                        Severity::Error,
                        &format!("Failed to cache at {}: {}", plan.path.display(), e),
                    );
                    let fetched = FetchResult {
                        status: FetchStatus::Error,
                        url: plan.url_str.clone(),
                        path: plan.path.clone(),
                        body: Body::Raw(body),
                        status_code: Some(status_code),
                        headers: Some(headers),
                    };
                    return Err(DowncacheError::storage(&plan.path, e, Some(fetched)));
                }
            }
        };

        let result = FetchResult {
            status,
            url: plan.url_str.clone(),
            path: plan.path.clone(),
            body: Body::Raw(body),
            status_code: Some(status_code),
            headers: Some(headers),
        };
        self.finish(plan, result)
    }

    /// Decode the body as JSON when asked to
    fn finish(&self, plan: &Plan, mut result: FetchResult) -> Result<FetchResult> {
        if !plan.json {
            return Ok(result);
        }
        let Body::Raw(raw) = &result.body else {
            return Ok(result);
        };

        match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(value) => {
                result.body = Body::Json(value);
                Ok(result)
            }
            Err(source) => {
                self.emit(
                    plan,
                    Severity::Error,
                    "Couldn't parse response as JSON, returning raw body with the error",
                );
                Err(DowncacheError::Parse {
                    body: String::from_utf8_lossy(raw).into_owned(),
                    source,
                })
            }
        }
    }

    fn emit(&self, plan: &Plan, severity: Severity, message: &str) {
        self.observer
            .event(plan.log_level, severity, &plan.url_str, message);
    }
}
