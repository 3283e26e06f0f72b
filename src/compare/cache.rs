//! Deduplicating, memoizing cache for comparison runs.
//!
//! At most one computation runs per fingerprint. Completed results are kept
//! forever; failures are not cached, so a later request starts a fresh run.

use crate::compare::result::ComparisonResult;
use crate::{Result, SeqscopeError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

const FINGERPRINT_SEPARATOR: &str = "::";
const ID_SEPARATOR: &str = ",";

pub type ComparisonOutcome = std::result::Result<Arc<ComparisonResult>, Arc<SeqscopeError>>;

/// Future-like handle to the eventual result of a comparison. Cloning it is
/// cheap and every clone resolves to the same value.
pub type ComparisonHandle = Shared<BoxFuture<'static, ComparisonOutcome>>;

/// Canonical cache key: reference id plus the sorted, deduplicated
/// comparison ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new<S: AsRef<str>>(reference_id: &str, comparison_ids: &[S]) -> Self {
        let mut ids: Vec<&str> = comparison_ids.iter().map(|s| s.as_ref()).collect();
        ids.sort_unstable();
        ids.dedup();
        Fingerprint(format!(
            "{}{}{}",
            reference_id,
            FINGERPRINT_SEPARATOR,
            ids.join(ID_SEPARATOR)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalised comparison request. Duplicate comparison ids are removed,
/// keeping the first occurrence, so caller order drives the match order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub reference_id: String,
    pub comparison_ids: Vec<String>,
}

impl ComparisonRequest {
    pub fn new<S: AsRef<str>>(reference_id: &str, comparison_ids: &[S]) -> Self {
        let mut ids: Vec<String> = Vec::with_capacity(comparison_ids.len());
        for id in comparison_ids {
            let id = id.as_ref();
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }

        Self {
            reference_id: reference_id.to_string(),
            comparison_ids: ids,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.reference_id, &self.comparison_ids)
    }
}

/// The blocking work behind a cache miss
pub trait ComparisonBackend: Send + Sync {
    fn run(&self, request: &ComparisonRequest) -> Result<ComparisonResult>;
}

/// Non-blocking view of a fingerprint's state
#[derive(Debug, Clone)]
pub enum ComparisonStatus {
    Ready(Arc<ComparisonResult>),
    Pending,
    NotFound,
}

impl ComparisonStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ComparisonStatus::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ComparisonStatus::Pending)
    }

    pub fn result(&self) -> Option<&Arc<ComparisonResult>> {
        match self {
            ComparisonStatus::Ready(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicUsize,
    joins: AtomicUsize,
    computations: AtomicUsize,
    failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from a completed result
    pub hits: usize,
    /// Requests that attached to an in-flight run
    pub joins: usize,
    /// Runs started
    pub computations: usize,
    /// Runs that ended in an error
    pub failures: usize,
}

struct Inner {
    results: DashMap<Fingerprint, Arc<ComparisonResult>>,
    in_flight: DashMap<Fingerprint, ComparisonHandle>,
    backend: Arc<dyn ComparisonBackend>,
    counters: Counters,
}

/// Completed entries are never evicted; memory grows with the number of
/// distinct fingerprints requested.
#[derive(Clone)]
pub struct ComparisonCache {
    inner: Arc<Inner>,
}

impl ComparisonCache {
    pub fn new(backend: Arc<dyn ComparisonBackend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                results: DashMap::new(),
                in_flight: DashMap::new(),
                backend,
                counters: Counters::default(),
            }),
        }
    }

    /// Return a handle to the result for this request, starting a run only if
    /// neither a completed result nor an in-flight run exists.
    ///
    /// Runs are spawned on the current Tokio runtime, so this must be called
    /// from within one.
    pub fn compare_sequences<S: AsRef<str>>(
        &self,
        reference_id: &str,
        comparison_ids: &[S],
    ) -> ComparisonHandle {
        let request = ComparisonRequest::new(reference_id, comparison_ids);
        let key = request.fingerprint();

        if let Some(result) = self.completed(&key) {
            return result;
        }

        match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                self.inner.counters.joins.fetch_add(1, Ordering::Relaxed);
                debug!("Comparison already running for {}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // A run may have finished between the lookup above and taking
                // the in-flight slot.
                if let Some(result) = self.completed(&key) {
                    return result;
                }
                let handle = self.spawn(key, request);
                entry.insert(handle.clone());
                handle
            }
        }
    }

    /// Await the result for this request, computing it if needed
    pub async fn compare(&self, reference_id: &str, comparison_ids: &[String]) -> ComparisonOutcome {
        self.compare_sequences(reference_id, comparison_ids).await
    }

    /// Poll without blocking or starting any work
    pub fn get_result<S: AsRef<str>>(&self, reference_id: &str, comparison_ids: &[S]) -> ComparisonStatus {
        let key = Fingerprint::new(reference_id, comparison_ids);

        if let Some(result) = self.inner.results.get(&key) {
            return ComparisonStatus::Ready(Arc::clone(result.value()));
        }

        if let Some(handle) = self.inner.in_flight.get(&key) {
            return match handle.peek() {
                Some(Ok(result)) => ComparisonStatus::Ready(Arc::clone(result)),
                // The run is about to drop its in-flight slot
                Some(Err(_)) => ComparisonStatus::NotFound,
                None => ComparisonStatus::Pending,
            };
        }

        ComparisonStatus::NotFound
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            joins: c.joins.load(Ordering::Relaxed),
            computations: c.computations.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
        }
    }

    /// Number of completed results held
    pub fn len(&self) -> usize {
        self.inner.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.results.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    fn completed(&self, key: &Fingerprint) -> Option<ComparisonHandle> {
        let result = self.inner.results.get(key).map(|r| Arc::clone(r.value()))?;
        self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
        info!("Result already cached for {}", key);
        Some(future::ready(Ok(result)).boxed().shared())
    }

    fn spawn(&self, key: Fingerprint, request: ComparisonRequest) -> ComparisonHandle {
        let inner = Arc::clone(&self.inner);
        inner.counters.computations.fetch_add(1, Ordering::Relaxed);
        info!(
            "Starting comparison: reference {} against {:?}",
            request.reference_id, request.comparison_ids
        );

        let task = tokio::spawn(async move {
            let backend = Arc::clone(&inner.backend);
            let outcome = match tokio::task::spawn_blocking(move || backend.run(&request)).await {
                Ok(outcome) => outcome,
                Err(e) => Err(SeqscopeError::Comparison(format!("comparison task aborted: {}", e))),
            };

            let outcome = match outcome {
                Ok(result) => {
                    let result = Arc::new(result);
                    inner.results.insert(key.clone(), Arc::clone(&result));
                    info!("Comparison completed for {}", key);
                    Ok(result)
                }
                Err(e) => {
                    inner.counters.failures.fetch_add(1, Ordering::Relaxed);
                    error!("Comparison failed for {}: {}", key, e);
                    Err(Arc::new(e))
                }
            };

            inner.in_flight.remove(&key);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(Arc::new(SeqscopeError::Comparison(format!(
                    "comparison task aborted: {}",
                    e
                ))))
            })
        }
        .boxed()
        .shared()
    }
}
