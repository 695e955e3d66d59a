//! `FetchController` - runs one async producer per dependency key.
//!
//! The controller publishes a [`FetchState`] through a `watch` channel.
//! Every call to the producer is tagged with a generation number; an
//! outcome is applied only while its generation is still the latest one,
//! so results of superseded, reset, or dropped controllers are discarded
//! even though the underlying request runs to completion.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use tokio::sync::watch;

/// Normalized producer failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Builds an error from a panic payload.
    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| String::from(*s))
            .or_else(|| payload.downcast_ref::<String>().cloned());
        detail.map_or_else(
            || Self::new("fetch producer panicked"),
            |d| Self::new(format!("fetch producer panicked: {d}")),
        )
    }
}

impl From<&anyhow::Error> for FetchError {
    fn from(err: &anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Snapshot of one controller's data, loading flag and error.
///
/// `error` and `data` are not exclusive: a failed refresh keeps the
/// previous data so a caller can keep showing it next to the error.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Result of the latest successful invocation.
    pub data: Option<T>,
    /// True while the latest invocation is in flight.
    pub loading: bool,
    /// Failure of the latest invocation.
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// True when nothing is loaded, loading, or failed.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.data.is_none() && !self.loading && self.error.is_none()
    }
}

/// Type-erased producer.
type Producer<K, T> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Callback run for every applied outcome, with the key it was fetched for.
type Observer<K, T> = Arc<dyn Fn(&K, &FetchState<T>) + Send + Sync>;

/// Outcome of one invocation, including a caught panic.
type Outcome<T> = std::result::Result<Result<T>, Box<dyn Any + Send>>;

/// State shared between the controller and its in-flight invocations.
struct Shared<K, T> {
    /// Generation of the latest invocation (or reset/teardown).
    generation: AtomicU64,
    /// Published state.
    state: watch::Sender<FetchState<T>>,
    observer: Option<Observer<K, T>>,
}

impl<K, T> Shared<K, T> {
    /// Invalidates all in-flight invocations and returns the new generation.
    fn bump(&self) -> u64 {
        self.generation
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
    }

    /// Applies an outcome if `generation` is still current.
    ///
    /// The generation check runs under the channel's write lock, so a
    /// concurrent `reset` either happens before (outcome discarded) or
    /// after (outcome overwritten). The observer sees the applied state
    /// under the same lock.
    fn settle(&self, generation: u64, key: &K, outcome: Outcome<T>) {
        let outcome = match outcome {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(err)) => {
                tracing::warn!(error = format!("{err:#}"), "fetch failed");
                Err(FetchError::from(&err))
            }
            Err(payload) => {
                let err = FetchError::from_panic(payload.as_ref());
                tracing::warn!(error = %err, "fetch producer panicked");
                Err(err)
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match outcome {
                Ok(data) => state.data = Some(data),
                Err(err) => state.error = Some(err),
            }
            state.loading = false;
            if let Some(observer) = &self.observer {
                observer(key, state);
            }
            true
        });

        if !applied {
            tracing::debug!(generation, "discarded stale fetch result");
        }
    }
}

/// Runs a producer whenever its dependency key changes.
///
/// Must be created and driven inside a Tokio runtime: invocations that do
/// not complete on their first poll are moved to a spawned task.
pub struct FetchController<K, T> {
    shared: Arc<Shared<K, T>>,
    key: Mutex<K>,
    producer: Producer<K, T>,
}

impl<K, T> FetchController<K, T>
where
    K: Clone + PartialEq + Send + 'static,
    T: Send + Sync + 'static,
{
    /// Creates a controller and immediately invokes `producer` with `key`.
    pub fn new<F, Fut>(key: K, producer: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::build(key, producer, None)
    }

    /// Like [`FetchController::new`], and calls `observer` with the key
    /// and the new state each time an outcome is applied.
    ///
    /// Stale outcomes are not observed. `observer` runs while the state
    /// is locked, so it must not call back into the controller.
    pub fn observed<F, Fut, O>(key: K, producer: F, observer: O) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        O: Fn(&K, &FetchState<T>) + Send + Sync + 'static,
    {
        Self::build(key, producer, Some(Arc::new(observer)))
    }

    fn build<F, Fut>(key: K, producer: F, observer: Option<Observer<K, T>>) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (state, _) = watch::channel(FetchState::default());
        let controller = Self {
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                state,
                observer,
            }),
            key: Mutex::new(key),
            producer: Arc::new(move |key| producer(key).boxed()),
        };
        controller.refetch();
        controller
    }

    /// Replaces the dependency key and invokes the producer.
    ///
    /// Returns `false` without doing anything when `key` equals the
    /// current key.
    pub fn set_key(&self, key: K) -> bool {
        {
            let mut current = self.lock_key();
            if *current == key {
                return false;
            }
            current.clone_from(&key);
        }
        self.start(key);
        true
    }

    /// Invokes the producer again with the current key.
    pub fn refetch(&self) {
        let key = self.lock_key().clone();
        self.start(key);
    }

    /// Clears data, loading and error, and discards any in-flight result.
    pub fn reset(&self) {
        self.shared.bump();
        self.shared.state.send_replace(FetchState::default());
    }

    /// Returns the current dependency key.
    #[must_use]
    pub fn key(&self) -> K {
        self.lock_key().clone()
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> FetchState<T>
    where
        T: Clone,
    {
        self.shared.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    /// Waits until no invocation is in flight and returns that state.
    ///
    /// Never completes while a hung invocation keeps `loading` set.
    pub async fn settled(&self) -> FetchState<T>
    where
        T: Clone,
    {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Starts one invocation for `key`.
    fn start(&self, key: K) {
        let generation = self.shared.bump();
        self.shared.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let producer = Arc::clone(&self.producer);
        let input = key.clone();
        // The producer is called on first poll so a panic while building
        // the future is caught as well.
        let mut invocation =
            AssertUnwindSafe(async move { producer(input).await }).catch_unwind().boxed();

        match invocation.poll_unpin(&mut Context::from_waker(noop_waker_ref())) {
            Poll::Ready(outcome) => self.shared.settle(generation, &key, outcome),
            Poll::Pending => {
                let shared = Arc::clone(&self.shared);
                tokio::spawn(async move {
                    let outcome = invocation.await;
                    shared.settle(generation, &key, outcome);
                });
            }
        }
    }

    fn lock_key(&self) -> MutexGuard<'_, K> {
        self.key.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, T> Drop for FetchController<K, T> {
    fn drop(&mut self) {
        self.shared.bump();
    }
}

impl<K: fmt::Debug, T> fmt::Debug for FetchController<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchController")
            .field("key", &self.key)
            .field("generation", &self.shared.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use anyhow::bail;

    use super::*;

    /// Producer that sleeps `key` milliseconds and returns the key.
    fn delayed(calls: Arc<AtomicUsize>) -> impl Fn(u64) -> BoxFuture<'static, Result<u64>> {
        move |delay_ms: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(delay_ms)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_starts_fetch() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));

        // Act
        let controller = FetchController::new(100, delayed(Arc::clone(&calls)));

        // Assert
        assert!(controller.state().loading);
        let state = controller.settled().await;
        assert_eq!(state.data, Some(100));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ready_producer_settles_synchronously() {
        // Arrange & Act
        let controller = FetchController::new(String::new(), |_query: String| async {
            Ok(Vec::<u32>::new())
        });

        // Assert
        let state = controller.state();
        assert_eq!(state.data, Some(Vec::new()));
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_key_does_not_refetch() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(10, delayed(Arc::clone(&calls)));
        controller.settled().await;

        // Act
        let changed = controller.set_key(10);

        // Assert
        assert!(!changed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_change_starts_exactly_one_fetch() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(10, delayed(Arc::clone(&calls)));
        controller.settled().await;

        // Act
        let changed = controller.set_key(20);
        let state = controller.settled().await;

        // Assert
        assert!(changed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.data, Some(20));
        assert_eq!(controller.key(), 20);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        // Arrange
        let controller = FetchController::new(String::from("dune"), |query: String| async move {
            if query == "bad" {
                bail!("Failed to fetch movies");
            }
            Ok(query.len())
        });
        assert_eq!(controller.state().data, Some(4));

        // Act
        controller.set_key(String::from("bad"));

        // Assert
        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(state.data, Some(4));
        assert_eq!(
            state.error.as_ref().map(FetchError::message),
            Some("Failed to fetch movies")
        );
    }

    #[tokio::test]
    async fn test_success_after_failure_clears_error() {
        // Arrange
        let controller = FetchController::new(String::from("bad"), |query: String| async move {
            if query == "bad" {
                bail!("boom");
            }
            Ok(query)
        });
        assert!(controller.state().error.is_some());
        assert!(controller.state().data.is_none());

        // Act
        controller.set_key(String::from("good"));

        // Assert
        let state = controller.state();
        assert!(state.error.is_none());
        assert_eq!(state.data.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_error_message_includes_context_chain() {
        // Arrange & Act
        let controller = FetchController::new((), |()| async {
            let inner: Result<u8> = Err(anyhow::anyhow!("HTTP 401"));
            anyhow::Context::context(inner, "failed to search movies")
        });

        // Assert
        let error = controller.state().error.unwrap();
        assert_eq!(error.message(), "failed to search movies: HTTP 401");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_in_flight_result() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(200, delayed(Arc::clone(&calls)));
        let mut rx = controller.subscribe();

        // Act
        controller.reset();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert!(controller.state().is_idle());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_result_settling_later_is_discarded() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(300, delayed(Arc::clone(&calls)));

        // Act: the second call settles first, the first settles afterwards.
        controller.set_key(100);
        tokio::time::sleep(Duration::from_millis(150)).await;
        let after_second = controller.state();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert_eq!(after_second.data, Some(100));
        assert!(!after_second.loading);
        assert_eq!(controller.state().data, Some(100));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_while_loading_keeps_loading_until_latest() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(100, delayed(Arc::clone(&calls)));

        // Act
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.refetch();
        tokio::time::sleep(Duration::from_millis(75)).await;

        // Assert: first call settled at 100ms but was superseded.
        assert!(controller.state().loading);
        let state = controller.settled().await;
        assert_eq!(state.data, Some(100));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_in_flight_result() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = FetchController::new(100, delayed(Arc::clone(&calls)));
        let mut rx = controller.subscribe();

        // Act
        drop(controller);
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert!(rx.borrow_and_update().loading);
        assert!(rx.borrow().data.is_none());
    }

    #[tokio::test]
    async fn test_producer_panic_is_normalized() {
        // Arrange & Act
        let controller = FetchController::new(0_u8, |_key: u8| async move {
            if true {
                panic!("decoder exploded");
            }
            Ok(0_u8)
        });

        // Assert
        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(
            state.error.as_ref().map(FetchError::message),
            Some("fetch producer panicked: decoder exploded")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_applied_outcomes_only() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let controller = FetchController::observed(
            300,
            delayed(Arc::clone(&calls)),
            move |key: &u64, state: &FetchState<u64>| {
                sink.lock().unwrap().push((*key, state.data, state.loading));
            },
        );

        // Act: 300 is superseded, 100 settles and is reset straight away.
        controller.set_key(100);
        let mut rx = controller.subscribe();
        rx.wait_for(|s| s.data.is_some()).await.unwrap();
        controller.reset();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert!(controller.state().is_idle());
        assert_eq!(*seen.lock().unwrap(), vec![(100, Some(100), false)]);
    }
}
