//! Trailing-edge debouncer for rapidly changing input values.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default quiet window before raw input settles.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Publishes a raw value as settled once it has been stable for `window`.
///
/// Every change of the raw value restarts the timer; intermediate values
/// of a burst are never published.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    settled: Arc<watch::Sender<T>>,
    window: Duration,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Spawns the timer task. `initial` is both the raw and settled value.
    #[must_use]
    pub fn spawn(initial: T, window: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (settled, _) = watch::channel(initial);
        let settled = Arc::new(settled);
        let task = tokio::spawn(run(input_rx, Arc::clone(&settled), window));
        Self {
            input,
            settled,
            window,
            task,
        }
    }

    /// Replaces the raw value. Returns `false` when it is unchanged.
    pub fn push(&self, value: T) -> bool {
        self.input.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Settles the current raw value immediately.
    pub fn flush(&self) {
        let value = self.input.borrow().clone();
        publish(&self.settled, value);
    }

    /// Returns the raw value.
    #[must_use]
    pub fn raw(&self) -> T {
        self.input.borrow().clone()
    }

    /// Returns the settled value.
    #[must_use]
    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    /// Subscribes to settled value changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }

    /// Returns the quiet window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

/// Timer loop: waits for a change, then for `window` without one.
async fn run<T>(mut input: watch::Receiver<T>, settled: Arc<watch::Sender<T>>, window: Duration)
where
    T: Clone + PartialEq,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                () = tokio::time::sleep(window) => {
                    let value = input.borrow_and_update().clone();
                    publish(&settled, value);
                    break;
                }
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Sends `value` unless it equals the current settled value.
fn publish<T: PartialEq>(settled: &watch::Sender<T>, value: T) {
    settled.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T: fmt::Debug> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("raw", &*self.input.borrow())
            .field("settled", &*self.settled.borrow())
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
