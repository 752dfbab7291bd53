//! Rate-limited worker pool for manifest fetches.
//!
//! A fixed number of workers pull [`ManifestJob`]s from one shared queue.
//! Before each request a worker takes a token from a shared [`RateLimiter`],
//! so the pool as a whole never exceeds the configured request rate however
//! many workers run. Each job carries the [`Producer`] it reports through.
//!
//! On cancellation the pool moves to [`PoolState::Draining`]: workers stop
//! taking tokens, close the queue, answer every queued job with a
//! cancellation marker and exit. The last worker to exit moves the pool to
//! [`PoolState::Stopped`].

use crate::aggregate::{JobResult, Producer};
use crate::auth::Credentials;
use crate::cancel::CancelSignal;
use crate::error::{Result, ScoutError};
use crate::image::TagRecord;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;


/// Pool sizing and rate settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers (at least one is always started)
    pub workers: usize,
    /// Sustained manifest requests per second
    pub rate_per_second: u32,
    /// Bucket capacity: the largest burst allowed after idling
    pub burst: u32,
    /// Upper bound on concurrent tag-list fetches; unbounded when `None`
    pub repository_concurrency: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            rate_per_second: 10,
            burst: 5,
            repository_concurrency: None,
        }
    }
}

impl PoolConfig {
    /// Time between token refills.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::pool::PoolConfig;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfig { rate_per_second: 4, ..PoolConfig::default() };
    /// assert_eq!(config.refill_interval(), Duration::from_millis(250));
    /// ```
    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(1) / self.rate_per_second.max(1)
    }
}

/// A token bucket refilled one token per interval, up to its capacity.
///
/// Refills happen at whole multiples of the interval measured from creation,
/// so no interval ever hands out more than `capacity` tokens.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a full bucket.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            interval: interval.max(Duration::from_nanos(1)),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.burst, config.refill_interval())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Waits for a token.
    ///
    /// Returns [`ScoutError::Cancelled`] without consuming a token if
    /// `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancelSignal) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(ScoutError::Cancelled);
            }

            let wait = {
                let mut bucket = self.lock();
                let now = Instant::now();
                self.refill(&mut bucket, now);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return Ok(());
                }
                self.interval
                    .saturating_sub(now.saturating_duration_since(bucket.last_refill))
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScoutError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Tokens currently in the bucket.
    pub fn available(&self) -> u32 {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        bucket.tokens
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let intervals = elapsed.as_nanos() / self.interval.as_nanos();
        if intervals == 0 {
            return;
        }

        let added = intervals.min(u128::from(self.capacity)) as u32;
        bucket.tokens = bucket.tokens.saturating_add(added).min(self.capacity);
        let advance = self.interval.as_nanos() * intervals;
        bucket.last_refill += Duration::from_nanos(advance as u64);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// One manifest to fetch.
#[derive(Debug, Clone)]
pub struct ManifestJob {
    pub image: String,
    pub tag: String,
    /// Fully resolved manifest URL
    pub url: Url,
    pub credentials: Arc<Credentials>,
}

/// Performs the work of one [`ManifestJob`].
///
/// Implemented by [`crate::client::Client`]; tests substitute their own.
pub trait ManifestRunner: Send + Sync + 'static {
    fn run(&self, job: &ManifestJob) -> impl Future<Output = Result<TagRecord>> + Send;
}

/// Lifecycle of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Workers are accepting and running jobs.
    Running,
    /// Cancellation observed; queued jobs are being answered with markers.
    Draining,
    /// Every worker has exited.
    Stopped,
}

struct PoolShared {
    limiter: RateLimiter,
    cancel: CancelSignal,
    state: watch::Sender<PoolState>,
    alive: AtomicUsize,
}

impl PoolShared {
    fn enter_draining(&self) {
        self.state.send_if_modified(|state| {
            if *state == PoolState::Running {
                *state = PoolState::Draining;
                true
            } else {
                false
            }
        });
    }

    fn worker_exited(&self) {
        if self.alive.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.send_replace(PoolState::Stopped);
            tracing::debug!("worker pool stopped");
        }
    }
}

type QueuedJob = (ManifestJob, Producer);
type SharedQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedJob>>>;

/// Handle for enqueueing jobs.
///
/// The queue closes once every submitter is dropped and the queue is empty;
/// workers then exit on their own.
#[derive(Clone)]
pub struct JobSubmitter {
    tx: mpsc::UnboundedSender<QueuedJob>,
    cancel: CancelSignal,
}

impl JobSubmitter {
    /// Enqueues `job`, reporting through `producer`.
    ///
    /// If the search has been cancelled or the pool is draining, the job is
    /// answered with a cancellation marker instead.
    pub fn submit(&self, job: ManifestJob, producer: Producer) {
        if self.cancel.is_cancelled() {
            producer.emit(JobResult::cancelled(Some(job.image), Some(job.tag)));
            return;
        }

        if let Err(mpsc::error::SendError((job, producer))) = self.tx.send((job, producer)) {
            producer.emit(JobResult::cancelled(Some(job.image), Some(job.tag)));
        }
    }
}

impl std::fmt::Debug for JobSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSubmitter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Read-only view of a pool's lifecycle.
#[derive(Clone)]
pub struct PoolMonitor {
    shared: Arc<PoolShared>,
}

impl PoolMonitor {
    pub fn state(&self) -> PoolState {
        *self.shared.state.borrow()
    }

    /// Resolves once every worker has exited.
    pub async fn stopped(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|s| *s == PoolState::Stopped).await;
    }

    /// Tokens currently available to the workers.
    pub fn available_tokens(&self) -> u32 {
        self.shared.limiter.available()
    }
}

impl std::fmt::Debug for PoolMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolMonitor")
            .field("state", &self.state())
            .finish()
    }
}

/// A fixed set of workers sharing one queue and one rate limiter.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts the workers on the current Tokio runtime.
    ///
    /// Returns the pool and the first submitter for its queue.
    pub fn start<R: ManifestRunner>(
        config: &PoolConfig,
        runner: Arc<R>,
        cancel: CancelSignal,
    ) -> (Self, JobSubmitter) {
        let worker_count = config.workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let (state, _) = watch::channel(PoolState::Running);

        let shared = Arc::new(PoolShared {
            limiter: RateLimiter::from_config(config),
            cancel: cancel.clone(),
            state,
            alive: AtomicUsize::new(worker_count),
        });

        tracing::debug!(
            workers = worker_count,
            rate = config.rate_per_second,
            burst = config.burst,
            "starting worker pool"
        );

        let workers = (0..worker_count)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&shared),
                    Arc::clone(&runner),
                ))
            })
            .collect();

        (Self { shared, workers }, JobSubmitter { tx, cancel })
    }

    pub fn state(&self) -> PoolState {
        *self.shared.state.borrow()
    }

    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Waits for every worker to exit.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop<R: ManifestRunner>(
    id: usize,
    queue: SharedQueue,
    shared: Arc<PoolShared>,
    runner: Arc<R>,
) {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };

        let Some((job, producer)) = next else {
            break;
        };

        if shared.limiter.acquire(&shared.cancel).await.is_err() {
            producer.emit(JobResult::cancelled(Some(job.image), Some(job.tag)));
            continue;
        }

        tracing::trace!(worker = id, image = %job.image, tag = %job.tag, "fetching manifest");
        let result = match runner.run(&job).await {
            Ok(tag) => JobResult::tag(job.image, tag),
            Err(e) => {
                tracing::warn!(image = %job.image, tag = %job.tag, error = %e, "manifest fetch failed");
                JobResult::failed(Some(job.image), Some(job.tag), e)
            }
        };
        producer.emit(result);
    }

    if shared.cancel.is_cancelled() {
        shared.enter_draining();
        let mut rx = queue.lock().await;
        rx.close();
        let mut drained = 0usize;
        while let Ok((job, producer)) = rx.try_recv() {
            producer.emit(JobResult::cancelled(Some(job.image), Some(job.tag)));
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(worker = id, drained, "drained queued jobs after cancellation");
        }
    }

    shared.worker_exited();
}
