//! Search orchestration.
//!
//! A search fans out in three levels. One task fetches the catalog (or
//! starts directly from a single image name). One task per repository
//! fetches its tag list. One manifest job per tag goes to the rate-limited
//! [`WorkerPool`]. Every level reports through the same result stream, and
//! a failure only ends the branch it happened in.
//!
//! ```no_run
//! use libscout::config::SearchConfig;
//! use libscout::render::OutputFormat;
//! use libscout::search;
//!
//! # async fn example() -> libscout::error::Result<()> {
//! let config = SearchConfig::new("http://localhost:5000", true, OutputFormat::Text);
//! let handle = search::search_all(config, "", "")?;
//! let results = handle.collect().await;
//! println!("{} results", results.len());
//! # Ok(())
//! # }
//! ```

use crate::aggregate::{self, JobResult, Producer, ResultStream};
use crate::auth::Credentials;
use crate::cancel::CancelSignal;
use crate::client::{Client, ClientConfig};
use crate::config::SearchConfig;
use crate::error::{Result, ScoutError};
use crate::pool::{JobSubmitter, ManifestJob, PoolConfig, PoolMonitor, PoolState, WorkerPool};
use std::sync::Arc;
use tokio::sync::Semaphore;


/// Starts a search over every repository in the registry.
///
/// Returns as soon as the work is spawned; results arrive on the handle.
///
/// # Errors
///
/// Fails synchronously with [`ScoutError::InvalidUrl`] for a malformed
/// server URL, or [`ScoutError::Config`] outside a Tokio runtime.
pub fn search_all(config: SearchConfig, username: &str, password: &str) -> Result<SearchHandle> {
    Searcher::new(config, PoolConfig::default())?
        .search_all(Credentials::from_pair(username, password))
}

/// Starts a search over the tags of one image, skipping the catalog.
pub fn search_by_name(
    config: SearchConfig,
    username: &str,
    password: &str,
    image_name: &str,
) -> Result<SearchHandle> {
    Searcher::new(config, PoolConfig::default())?
        .search_by_name(Credentials::from_pair(username, password), image_name)
}

/// Reusable entry point holding the client and pool settings.
#[derive(Debug, Clone)]
pub struct Searcher {
    client: Arc<Client>,
    config: Arc<SearchConfig>,
    pool_config: PoolConfig,
}

impl Searcher {
    /// Builds a searcher with default HTTP settings.
    pub fn new(config: SearchConfig, pool_config: PoolConfig) -> Result<Self> {
        Self::with_client_config(config, pool_config, ClientConfig::default())
    }

    pub fn with_client_config(
        config: SearchConfig,
        pool_config: PoolConfig,
        client_config: ClientConfig,
    ) -> Result<Self> {
        let client = Client::with_config(&config, client_config)?;
        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            pool_config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn search_all(&self, credentials: Credentials) -> Result<SearchHandle> {
        self.start(credentials, None, CancelSignal::new())
    }

    pub fn search_by_name(&self, credentials: Credentials, image_name: &str) -> Result<SearchHandle> {
        self.start(credentials, Some(image_name), CancelSignal::new())
    }

    /// Starts a search driven by an externally owned cancellation signal.
    ///
    /// `image_name` restricts the search to one image.
    pub fn start(
        &self,
        credentials: Credentials,
        image_name: Option<&str>,
        cancel: CancelSignal,
    ) -> Result<SearchHandle> {
        let catalog_url = self.client.endpoint("/v2/_catalog")?;
        tokio::runtime::Handle::try_current().map_err(|e| {
            ScoutError::config_with_source("A search must be started inside a Tokio runtime", None, e)
        })?;

        let (root, results) = aggregate::open(cancel.clone());
        let (pool, submitter) =
            WorkerPool::start(&self.pool_config, Arc::clone(&self.client), cancel.clone());

        let fan_out = FanOut {
            client: Arc::clone(&self.client),
            credentials: Arc::new(credentials),
            submitter,
            cancel: cancel.clone(),
            repository_limit: self
                .pool_config
                .repository_concurrency
                .map(|n| Arc::new(Semaphore::new(n.max(1)))),
        };

        match image_name {
            Some(name) => {
                tracing::info!(image = name, "searching image");
                tokio::spawn(fan_out.fetch_image(name.to_string(), root));
            }
            None => {
                tracing::info!(url = %catalog_url, "searching registry catalog");
                tokio::spawn(fan_out.fetch_catalog(root));
            }
        }

        Ok(SearchHandle {
            results,
            cancel,
            pool: pool.monitor(),
        })
    }
}

/// The running search's result stream and controls.
#[derive(Debug)]
pub struct SearchHandle {
    results: ResultStream,
    cancel: CancelSignal,
    pool: PoolMonitor,
}

impl SearchHandle {
    /// Next result; `None` once the search has finished.
    pub async fn recv(&mut self) -> Option<JobResult> {
        self.results.recv().await
    }

    /// Waits for the search to finish and returns every result.
    pub async fn collect(self) -> Vec<JobResult> {
        self.results.collect().await
    }

    /// Cancels the search. Pending work resolves to cancellation markers
    /// and the stream still closes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Units of work not yet finished.
    pub fn in_flight(&self) -> usize {
        self.results.in_flight()
    }

    pub fn pool_state(&self) -> PoolState {
        self.pool.state()
    }

    /// Resolves once every pool worker has exited.
    pub async fn pool_stopped(&self) {
        self.pool.stopped().await
    }
}

#[derive(Clone)]
struct FanOut {
    client: Arc<Client>,
    credentials: Arc<Credentials>,
    submitter: JobSubmitter,
    cancel: CancelSignal,
    repository_limit: Option<Arc<Semaphore>>,
}

impl FanOut {
    async fn fetch_catalog(self, root: Producer) {
        let catalog = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                root.emit(JobResult::cancelled(None, None));
                return;
            }
            catalog = self.client.fetch_catalog(&self.credentials) => catalog,
        };

        let repositories = match catalog {
            Ok(repositories) => repositories,
            Err(e) => {
                tracing::warn!(error = %e, "catalog fetch failed");
                root.emit(JobResult::failed(None, None, e));
                return;
            }
        };

        tracing::info!(count = repositories.len(), "catalog fetched");
        for repository in repositories {
            let producer = root.register();
            tokio::spawn(self.clone().fetch_image(repository, producer));
        }
    }

    async fn fetch_image(self, image: String, producer: Producer) {
        let _permit = match &self.repository_limit {
            Some(limit) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        producer.emit(JobResult::cancelled(Some(image), None));
                        return;
                    }
                    permit = Arc::clone(limit).acquire_owned() => permit.ok(),
                }
            }
            None => None,
        };

        let tags = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                producer.emit(JobResult::cancelled(Some(image), None));
                return;
            }
            tags = self.client.fetch_tags(&self.credentials, &image) => tags,
        };

        let tags = match tags {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(image = %image, error = %e, "tag list fetch failed");
                producer.emit(JobResult::failed(Some(image), None, e));
                return;
            }
        };

        tracing::debug!(image = %image, count = tags.len(), "queueing manifest fetches");
        for tag in tags {
            let child = producer.register();
            match self.client.endpoint(&format!("/v2/{}/manifests/{}", image, tag)) {
                Ok(url) => self.submitter.submit(
                    ManifestJob {
                        image: image.clone(),
                        tag,
                        url,
                        credentials: Arc::clone(&self.credentials),
                    },
                    child,
                ),
                Err(e) => child.emit(JobResult::failed(Some(image.clone()), Some(tag), e)),
            }
        }
    }
}
