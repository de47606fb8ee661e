//! Asynchronous data loading with explicit load states.
//!
//! An [`AsyncResource`] wraps a [`DataSource`] and tracks one fetch at a time
//! through `Idle -> Loading -> {Success, Empty, Error}`. Every invocation is
//! tagged with a generation number; only the latest generation may settle the
//! state, and superseded invocations are cancelled.

pub mod mock;
pub mod render;
pub mod source;

use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use mock::{MockOptions, MockSource};
pub use render::{render, ContainerMessages, StateRenderer};
pub use source::{DataSource, Emptiness, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

impl FetchStatus {
    /// Whether an invocation has finished, successfully or not.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Empty | Self::Error)
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub status: FetchStatus,
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub generation: u64,
}

impl<T> Snapshot<T> {
    fn idle(generation: u64) -> Self {
        Self {
            status: FetchStatus::Idle,
            data: None,
            error: None,
            generation,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Per-invocation deadline. Expiry settles the invocation as an error.
    pub timeout: Option<Duration>,
}

impl ResourceOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

struct Flight {
    generation: u64,
    token: CancellationToken,
}

struct Inner<T> {
    source: Box<dyn DataSource<T>>,
    state: watch::Sender<Snapshot<T>>,
    flight: Mutex<Flight>,
    options: ResourceOptions,
}

/// Claimed generation of a load. Restores the previous status on drop
/// unless the load got as far as settling or being superseded.
struct PendingLoad<T>
where
    T: Emptiness + Clone + Send + Sync + 'static,
{
    resource: AsyncResource<T>,
    generation: u64,
    token: CancellationToken,
    previous_status: FetchStatus,
    previous_error: Option<FetchError>,
    armed: bool,
}

impl<T> PendingLoad<T>
where
    T: Emptiness + Clone + Send + Sync + 'static,
{
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for PendingLoad<T>
where
    T: Emptiness + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            self.resource
                .abandon(self.generation, self.previous_status, self.previous_error.take());
        }
    }
}

/// Shared handle to a loadable value. Clones observe and drive the same state.
pub struct AsyncResource<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for AsyncResource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AsyncResource<T>
where
    T: Emptiness + Clone + Send + Sync + 'static,
{
    pub fn new(source: impl DataSource<T> + 'static) -> Self {
        Self::with_options(source, ResourceOptions::default())
    }

    pub fn with_options(source: impl DataSource<T> + 'static, options: ResourceOptions) -> Self {
        let (state, _) = watch::channel(Snapshot::idle(0));
        Self {
            inner: Arc::new(Inner {
                source: Box::new(source),
                state,
                flight: Mutex::new(Flight {
                    generation: 0,
                    token: CancellationToken::new(),
                }),
                options,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.inner.state.borrow().status
    }

    pub fn data(&self) -> Option<T> {
        self.inner.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<FetchError> {
        self.inner.state.borrow().error.clone()
    }

    /// Begin the resource lifecycle. With `initial_fetch` the first load is
    /// spawned immediately; otherwise the resource stays idle until
    /// [`retry`](Self::retry).
    pub fn start(&self, initial_fetch: bool) -> Option<JoinHandle<FetchStatus>> {
        initial_fetch.then(|| tokio::spawn(self.load()))
    }

    /// Invoke the source again. Legal from any state.
    pub fn retry(&self) -> impl Future<Output = FetchStatus> + Send + 'static {
        self.load()
    }

    /// Enter `Loading` and return the future that runs the invocation.
    ///
    /// The generation is claimed and any older invocation is cancelled when
    /// this is called, not when the returned future is first polled. Dropping
    /// the future before it settles puts the previous status back.
    pub fn load(&self) -> impl Future<Output = FetchStatus> + Send + 'static {
        let mut pending = self.begin();
        let this = self.clone();
        async move {
            let generation = pending.generation;
            let token = pending.token.clone();
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    pending.disarm();
                    debug!(generation, "Superseded fetch cancelled");
                    return this.status();
                }
                outcome = this.invoke() => outcome,
            };
            pending.disarm();
            if !this.settle(generation, outcome) {
                debug!(generation, "Discarded stale fetch result");
            }
            this.status()
        }
    }

    /// Clear value and error, return to `Idle`, and invalidate any in-flight
    /// invocation.
    pub fn reset(&self) {
        let mut flight = self.lock_flight();
        flight.generation += 1;
        flight.token.cancel();
        flight.token = CancellationToken::new();
        let generation = flight.generation;
        self.inner
            .state
            .send_modify(|snapshot| *snapshot = Snapshot::idle(generation));
        debug!(generation, "Resource reset");
    }

    /// Reload whenever `events` yields. Runs until the returned token is
    /// cancelled, the channel closes, or every handle to the resource is
    /// dropped. Must be called inside a Tokio runtime.
    pub fn refresh_on<E>(&self, mut events: broadcast::Receiver<E>) -> CancellationToken
    where
        E: Clone + Send + 'static,
    {
        let stop = CancellationToken::new();
        let guard = stop.clone();
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Refresh subscriber lagged, reloading once");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
                let Some(inner) = weak.upgrade() else { break };
                let load = AsyncResource { inner }.load();
                load.await;
            }
            debug!("Refresh subscription ended");
        });

        stop
    }

    async fn invoke(&self) -> Result<T, FetchError> {
        let fetch = self.inner.source.fetch();
        match self.inner.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::new(format!(
                    "Request timed out after {} ms",
                    limit.as_millis()
                ))),
            },
            None => fetch.await,
        }
    }

    fn begin(&self) -> PendingLoad<T> {
        let mut flight = self.lock_flight();
        flight.generation += 1;
        flight.token.cancel();
        flight.token = CancellationToken::new();
        let generation = flight.generation;
        let token = flight.token.clone();

        let mut previous = (FetchStatus::Idle, None);
        self.inner.state.send_modify(|snapshot| {
            previous = (snapshot.status, snapshot.error.take());
            snapshot.status = FetchStatus::Loading;
            snapshot.generation = generation;
        });
        debug!(generation, "Fetch started");

        PendingLoad {
            resource: self.clone(),
            generation,
            token,
            previous_status: previous.0,
            previous_error: previous.1,
            armed: true,
        }
    }

    /// Undo `Loading` for an invocation that ended without settling.
    fn abandon(&self, generation: u64, previous_status: FetchStatus, previous_error: Option<FetchError>) {
        let restored = self.inner.state.send_if_modified(move |snapshot| {
            if snapshot.generation != generation || snapshot.status != FetchStatus::Loading {
                return false;
            }
            snapshot.status = match (previous_status, &snapshot.data) {
                // The load we replaced was cancelled, so report what it left behind
                (FetchStatus::Loading, Some(value)) if value.is_empty_value() => FetchStatus::Empty,
                (FetchStatus::Loading, Some(_)) => FetchStatus::Success,
                (FetchStatus::Loading, None) => FetchStatus::Idle,
                (status, _) => status,
            };
            snapshot.error = previous_error;
            true
        });
        if restored {
            debug!(generation, "Abandoned fetch, previous status restored");
        }
    }

    /// Apply an outcome if `generation` is still current. Returns whether it
    /// was applied.
    fn settle(&self, generation: u64, outcome: Result<T, FetchError>) -> bool {
        self.inner.state.send_if_modified(move |snapshot| {
            if snapshot.generation != generation || snapshot.status != FetchStatus::Loading {
                return false;
            }
            match outcome {
                Ok(value) => {
                    snapshot.status = if value.is_empty_value() {
                        FetchStatus::Empty
                    } else {
                        FetchStatus::Success
                    };
                    snapshot.data = Some(value);
                    snapshot.error = None;
                }
                Err(error) => {
                    debug!(generation, error = %error, "Fetch failed");
                    snapshot.status = FetchStatus::Error;
                    snapshot.data = None;
                    snapshot.error = Some(error);
                }
            }
            true
        })
    }

    fn lock_flight(&self) -> std::sync::MutexGuard<'_, Flight> {
        self.inner
            .flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fixed<T: Clone + Send + Sync + 'static>(value: T) -> impl DataSource<T> {
        move || {
            let value = value.clone();
            async move { Ok::<_, FetchError>(value) }
        }
    }

    #[tokio::test]
    async fn test_starts_idle_without_initial_fetch() {
        let resource = AsyncResource::new(fixed(vec![1u32]));
        assert!(resource.start(false).is_none());
        assert_eq!(resource.status(), FetchStatus::Idle);
        assert!(resource.data().is_none());
    }

    #[tokio::test]
    async fn test_initial_fetch_reaches_success() {
        let resource = AsyncResource::new(fixed(vec![1u32, 2, 3]));
        let handle = resource.start(true).unwrap();
        assert_eq!(handle.await.unwrap(), FetchStatus::Success);
        assert_eq!(resource.data(), Some(vec![1, 2, 3]));
        assert!(resource.error().is_none());
    }

    #[tokio::test]
    async fn test_empty_values_reach_empty() {
        let list = AsyncResource::new(fixed(Vec::<u32>::new()));
        assert_eq!(list.load().await, FetchStatus::Empty);
        assert_eq!(list.data(), Some(Vec::new()));

        let map = AsyncResource::new(fixed(HashMap::<String, u32>::new()));
        assert_eq!(map.load().await, FetchStatus::Empty);

        let absent = AsyncResource::new(fixed(None::<Vec<u32>>));
        assert_eq!(absent.load().await, FetchStatus::Empty);
    }

    #[tokio::test]
    async fn test_failure_reaches_error_and_clears_data() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let resource = AsyncResource::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok::<_, FetchError>(vec![7u32])
                } else {
                    Err(FetchError::new("boom"))
                }
            }
        });

        assert_eq!(resource.load().await, FetchStatus::Success);
        assert_eq!(resource.retry().await, FetchStatus::Error);
        assert!(resource.data().is_none());
        assert_eq!(resource.error().unwrap().message(), "boom");
    }

    #[tokio::test]
    async fn test_loading_keeps_previous_value_and_clears_error() {
        let resource = AsyncResource::new(fixed(vec![1u32]));
        resource.load().await;

        let pending = resource.load();
        let snapshot = resource.snapshot();
        assert_eq!(snapshot.status, FetchStatus::Loading);
        assert_eq!(snapshot.data, Some(vec![1]));
        assert!(snapshot.error.is_none());
        pending.await;
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let resource = AsyncResource::new(fixed(vec![1u32]));
        resource.load().await;
        resource.reset();

        let snapshot = resource.snapshot();
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_reset_from_error() {
        let resource = AsyncResource::new(|| async { Err::<Vec<u32>, FetchError>(FetchError::new("down")) });
        assert_eq!(resource.load().await, FetchStatus::Error);

        resource.reset();
        let snapshot = resource.snapshot();
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());

        assert_eq!(resource.retry().await, FetchStatus::Error);
        assert_eq!(resource.error().unwrap().message(), "down");
    }

    #[tokio::test]
    async fn test_dropped_load_restores_previous_status() {
        let resource = AsyncResource::new(fixed(vec![1u32]));
        assert_eq!(resource.load().await, FetchStatus::Success);

        let pending = resource.load();
        assert_eq!(resource.status(), FetchStatus::Loading);
        drop(pending);
        assert_eq!(resource.status(), FetchStatus::Success);
        assert_eq!(resource.data(), Some(vec![1]));

        let failing = AsyncResource::new(|| async { Err::<Vec<u32>, FetchError>(FetchError::new("down")) });
        failing.load().await;
        drop(failing.retry());
        assert_eq!(failing.status(), FetchStatus::Error);
        assert_eq!(failing.error().unwrap().message(), "down");

        let fresh = AsyncResource::new(fixed(vec![2u32]));
        drop(fresh.load());
        assert_eq!(fresh.status(), FetchStatus::Idle);
        assert_eq!(fresh.load().await, FetchStatus::Success);
    }

    #[tokio::test]
    async fn test_dropping_superseded_load_keeps_latest() {
        let resource = AsyncResource::new(fixed(vec![3u32]));
        let first = resource.load();
        let second = resource.load();
        drop(first);
        assert_eq!(resource.status(), FetchStatus::Loading);
        assert_eq!(second.await, FetchStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_settlement_is_discarded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let resource = AsyncResource::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                // The first call is slow, the second fast.
                let delay = if n == 0 { 500 } else { 10 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, FetchError>(vec![n])
            }
        });

        let first = tokio::spawn(resource.load());
        tokio::task::yield_now().await;
        let second = tokio::spawn(resource.retry());

        second.await.unwrap();
        first.await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(resource.status(), FetchStatus::Success);
        assert_eq!(resource.data(), Some(vec![1]));
        assert_eq!(resource.snapshot().generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_flight_stays_idle() {
        let resource = AsyncResource::new(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, FetchError>(vec![1u32])
        });

        let pending = tokio::spawn(resource.load());
        resource.reset();
        pending.await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(resource.status(), FetchStatus::Idle);
        assert!(resource.data().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_error() {
        let resource = AsyncResource::with_options(
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, FetchError>(vec![1u32])
            },
            ResourceOptions::with_timeout(Duration::from_millis(50)),
        );

        assert_eq!(resource.load().await, FetchStatus::Error);
        assert!(resource.error().unwrap().message().contains("timed out"));
    }

    #[tokio::test]
    async fn test_watch_receivers_observe_transitions() {
        let resource = AsyncResource::new(fixed(vec![4u32]));
        let mut rx = resource.subscribe();
        assert_eq!(rx.borrow_and_update().status, FetchStatus::Idle);

        resource.load().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, FetchStatus::Success);
    }

    #[tokio::test]
    async fn test_refresh_on_reloads_per_event() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let resource = AsyncResource::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, FetchError>(vec![n]) }
        });
        let mut rx = resource.subscribe();

        let (tx, events) = broadcast::channel::<u64>(8);
        let stop = resource.refresh_on(events);

        tx.send(1).unwrap();
        loop {
            rx.changed().await.unwrap();
            if rx.borrow().status == FetchStatus::Success {
                break;
            }
        }
        assert_eq!(resource.data(), Some(vec![0]));

        stop.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
