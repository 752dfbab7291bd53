//! Result aggregation for a search.
//!
//! Every concurrent unit of the search (the catalog fetch, each repository's
//! tag-list fetch, each manifest fetch) reports into one unbounded channel
//! through a [`Producer`]. Producers are counted: registering a child
//! increments the in-flight counter and dropping a producer decrements it.
//! When the counter reaches zero the channel's only sender is dropped, so the
//! consumer observes end-of-stream exactly once and only after every producer
//! has finished.
//!
//! Emission is check-then-send under the same lock that closes the channel,
//! so no result can ever be sent after close. Once the search is cancelled,
//! data and failure results are replaced by [`JobResult::Cancelled`] markers.

use crate::cancel::CancelSignal;
use crate::error::ScoutError;
use crate::image::TagRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;


/// One outcome delivered to the consumer of a search.
#[derive(Debug)]
pub enum JobResult {
    /// A tag was resolved.
    Tag { image: String, tag: TagRecord },
    /// A catalog, tag-list or manifest call failed.
    ///
    /// `image` is `None` for a catalog failure; `tag` is `None` unless the
    /// failure belongs to one manifest.
    Failed {
        image: Option<String>,
        tag: Option<String>,
        error: ScoutError,
    },
    /// The unit of work was abandoned because the search was cancelled.
    Cancelled {
        image: Option<String>,
        tag: Option<String>,
    },
}

impl JobResult {
    pub fn tag(image: impl Into<String>, tag: TagRecord) -> Self {
        Self::Tag {
            image: image.into(),
            tag,
        }
    }

    pub fn failed(image: Option<String>, tag: Option<String>, error: ScoutError) -> Self {
        Self::Failed { image, tag, error }
    }

    pub fn cancelled(image: Option<String>, tag: Option<String>) -> Self {
        Self::Cancelled { image, tag }
    }

    /// The image this result belongs to, if known.
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Tag { image, .. } => Some(image),
            Self::Failed { image, .. } | Self::Cancelled { image, .. } => image.as_deref(),
        }
    }

    /// The tag this result belongs to, if known.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::Tag { tag, .. } => Some(&tag.name),
            Self::Failed { tag, .. } | Self::Cancelled { tag, .. } => tag.as_deref(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Turns this result into a cancellation marker with the same attribution.
    pub fn into_cancelled(self) -> Self {
        match self {
            Self::Tag { image, tag } => Self::Cancelled {
                image: Some(image),
                tag: Some(tag.name),
            },
            Self::Failed { image, tag, .. } => Self::Cancelled { image, tag },
            cancelled @ Self::Cancelled { .. } => cancelled,
        }
    }
}

struct Shared {
    sender: Mutex<Option<mpsc::UnboundedSender<JobResult>>>,
    in_flight: AtomicUsize,
    emitted: AtomicUsize,
    cancel: CancelSignal,
}

impl Shared {
    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<JobResult>>> {
        // The guarded section never panics, but recover rather than propagate poison.
        match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Opens the result channel for one search.
///
/// Returns the root [`Producer`] (already counted) and the consuming end.
///
/// # Examples
///
/// ```
/// use libscout::aggregate::{self, JobResult};
/// use libscout::cancel::CancelSignal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (root, mut stream) = aggregate::open(CancelSignal::new());
/// let child = root.register();
/// drop(root);
///
/// child.emit(JobResult::cancelled(None, None));
/// assert!(stream.recv().await.is_some());
/// assert!(stream.recv().await.is_none());
/// # }
/// ```
pub fn open(cancel: CancelSignal) -> (Producer, ResultStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        sender: Mutex::new(Some(tx)),
        in_flight: AtomicUsize::new(1),
        emitted: AtomicUsize::new(0),
        cancel,
    });

    let root = Producer {
        shared: Arc::clone(&shared),
    };
    (root, ResultStream { rx, shared })
}

/// A counted handle for one unit of work.
///
/// A producer may emit at most one result; it deregisters when dropped,
/// whether or not it emitted.
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Registers a child unit of work.
    ///
    /// The child is counted before this call returns, so the channel cannot
    /// close while the parent still holds its own registration.
    pub fn register(&self) -> Producer {
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        Producer {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Delivers `result` and deregisters this producer.
    pub fn emit(self, result: JobResult) {
        let result = if self.shared.cancel.is_cancelled() {
            result.into_cancelled()
        } else {
            result
        };

        let sender = self.shared.sender();
        if let Some(tx) = sender.as_ref()
            && tx.send(result).is_ok()
        {
            self.shared.emitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Deregisters without emitting anything.
    pub fn finish(self) {}

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        if self.shared.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            let closed = self.shared.sender().take();
            if closed.is_some() {
                tracing::debug!(
                    emitted = self.shared.emitted.load(Ordering::Relaxed),
                    "all producers finished, closing result stream"
                );
            }
        }
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("in_flight", &self.shared.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

/// The consuming end of a search's result channel.
pub struct ResultStream {
    rx: mpsc::UnboundedReceiver<JobResult>,
    shared: Arc<Shared>,
}

impl ResultStream {
    /// Receives the next result; `None` once every producer has finished.
    pub async fn recv(&mut self) -> Option<JobResult> {
        self.rx.recv().await
    }

    /// Drains the stream to completion.
    pub async fn collect(mut self) -> Vec<JobResult> {
        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }

    /// Number of registered producers that have not finished.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Number of results sent so far.
    pub fn emitted(&self) -> usize {
        self.shared.emitted.load(Ordering::Relaxed)
    }

    /// True once the last producer has finished and the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.shared.sender().is_none()
    }
}

impl std::fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("in_flight", &self.in_flight())
            .field("emitted", &self.emitted())
            .finish()
    }
}
