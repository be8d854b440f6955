//! Global loading signal
//!
//! A process-wide count of in-flight tracked requests. Views only care
//! whether the count is zero, so observers are plain callbacks that re-read
//! the snapshot with [`LoadingSignal::peek`] or [`LoadingSignal::is_loading`].
//!
//! The signal is an explicit handle: construct one at startup and hand
//! clones to whoever needs it. Every clone shares the same counter.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{trace, warn};
use url::Url;

type Observer = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Inner {
    count: AtomicUsize,
    next_id: AtomicU64,
    observers: Mutex<Vec<(u64, Observer)>>,
}

impl Inner {
    fn notify(&self) {
        // Snapshot first so observers may subscribe or unsubscribe re-entrantly.
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            observer();
        }
    }

    fn remove(&self, id: u64) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Shared in-flight request counter
#[derive(Clone, Default)]
pub struct LoadingSignal {
    inner: Arc<Inner>,
}

impl LoadingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a tracked request began, then notify observers
    pub fn start(&self) {
        let count = self.inner.count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(inflight = count, "tracked request started");
        self.inner.notify();
    }

    /// Record that a tracked request finished, then notify observers.
    ///
    /// The count never drops below zero. An `end` without a matching
    /// `start` is tolerated but logged, since it usually means a caller
    /// completed the same request twice.
    pub fn end(&self) {
        let previous = self
            .inner
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_sub(1)))
            .unwrap_or_else(|c| c);

        if previous == 0 {
            warn!("loading signal ended with no request in flight");
        } else {
            trace!(inflight = previous - 1, "tracked request finished");
        }
        self.inner.notify();
    }

    /// Current number of in-flight tracked requests
    pub fn peek(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.peek() > 0
    }

    /// Register a callback invoked after every `start` and `end`.
    ///
    /// Registering the same callback twice yields two invocations per event.
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped or unsubscribed.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));

        Subscription {
            id,
            signal: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Start a tracked request; the returned guard ends it when dropped
    pub fn begin(&self) -> InflightGuard {
        self.start();
        InflightGuard {
            signal: self.clone(),
        }
    }
}

impl std::fmt::Debug for LoadingSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingSignal")
            .field("inflight", &self.peek())
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Registration handle returned by [`LoadingSignal::subscribe`]
#[must_use = "dropping a Subscription unregisters its observer"]
pub struct Subscription {
    id: u64,
    signal: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.remove(self.id);
        }
    }
}

/// Ends one tracked request when dropped
#[must_use = "the request ends as soon as the guard is dropped"]
pub struct InflightGuard {
    signal: LoadingSignal,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.signal.end();
    }
}

// =============================================================================
// Request classification
// =============================================================================

/// The parts of an outgoing fetch the classifier looks at
#[derive(Debug, Clone, Copy, Default)]
pub struct OutgoingRequest<'a> {
    /// URL as passed to fetch, possibly relative
    pub url: &'a str,
    /// `purpose` header
    pub purpose: Option<&'a str>,
    /// `sec-purpose` header
    pub sec_purpose: Option<&'a str>,
}

impl<'a> OutgoingRequest<'a> {
    pub fn new(url: &'a str) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    fn purpose(&self) -> Option<&'a str> {
        self.purpose.or(self.sec_purpose)
    }
}

/// Value of header `name` among raw `(name, value)` pairs.
///
/// Names match case-insensitively. Repeated headers are joined with `", "`
/// and values are trimmed, the way a `Headers` object normalizes them.
pub fn header_value<'h, I>(pairs: I, name: &str) -> Option<String>
where
    I: IntoIterator<Item = (&'h str, &'h str)>,
{
    let values: Vec<&str> = pairs
        .into_iter()
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Decides which fetches count toward the global loading signal.
///
/// Framework bookkeeping traffic (asset loads, cache-busting refetches,
/// speculative prefetches, same-origin page requests) is ignored; API calls
/// and cross-origin requests are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    /// Same-origin paths under this prefix are tracked
    pub api_prefix: String,
    /// Paths under these prefixes are never tracked
    pub internal_prefixes: Vec<String>,
    /// Requests carrying this query parameter are never tracked
    pub cache_bust_param: String,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            internal_prefixes: vec!["/_next/".to_string(), "/pkg/".to_string()],
            cache_bust_param: "_rsc".to_string(),
        }
    }
}

impl RequestPolicy {
    /// Whether `request`, issued from the page at `page`, should be tracked.
    ///
    /// `page` is `None` outside a browser, where nothing is tracked.
    pub fn should_track(&self, request: &OutgoingRequest<'_>, page: Option<&Url>) -> bool {
        let Some(page) = page else {
            return false;
        };

        let Ok(url) = page.join(request.url) else {
            return false;
        };

        if url.query_pairs().any(|(key, _)| key == self.cache_bust_param.as_str()) {
            return false;
        }

        let path = url.path();
        if self.internal_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return false;
        }

        if request.purpose() == Some("prefetch") {
            return false;
        }

        let same_origin = url.origin() == page.origin();
        if same_origin && !path.starts_with(self.api_prefix.as_str()) {
            return false;
        }

        true
    }
}
