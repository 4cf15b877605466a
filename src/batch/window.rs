//! Batch window queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

type SweepFn<T, B> = dyn Fn(Vec<T>) -> Vec<B> + Send + Sync;
type DeliverFn<B> = dyn Fn(B) + Send + Sync;

struct Pending<T> {
    items: Vec<T>,
    timer: Option<JoinHandle<()>>,
}

/// Accumulates items for at most `wait`, then hands them to `sweep` as one
/// group and passes every swept unit to `deliver`.
///
/// Only the first push of a cycle arms the timer; later pushes never extend
/// it. With a zero `wait` nothing accumulates and `push` delivers inline.
pub struct BatchWindow<T, B> {
    id: String,
    wait: Duration,
    sweep: Arc<SweepFn<T, B>>,
    deliver: Arc<DeliverFn<B>>,
    pending: Arc<Mutex<Pending<T>>>,
}

impl<T, B> BatchWindow<T, B>
where
    T: Send + 'static,
    B: From<T> + Send + 'static,
{
    pub fn new<S, D>(id: impl Into<String>, wait: Duration, sweep: S, deliver: D) -> Self
    where
        S: Fn(Vec<T>) -> Vec<B> + Send + Sync + 'static,
        D: Fn(B) + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            wait,
            sweep: Arc::new(sweep),
            deliver: Arc::new(deliver),
            pending: Arc::new(Mutex::new(Pending {
                items: Vec::new(),
                timer: None,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Enqueue one item. Must be called inside a tokio runtime unless `wait`
    /// is zero.
    pub fn push(&self, item: T) {
        if self.wait.is_zero() {
            (self.deliver)(B::from(item));
            return;
        }

        let mut pending = lock(&self.pending);
        pending.items.push(item);
        if pending.timer.is_none() {
            debug!(queue = %self.id, wait_ms = self.wait.as_millis() as u64, "arming batch window");
            pending.timer = Some(self.arm());
        }
    }

    fn arm(&self) -> JoinHandle<()> {
        let id = self.id.clone();
        let wait = self.wait;
        let pending = Arc::clone(&self.pending);
        let sweep = Arc::clone(&self.sweep);
        let deliver = Arc::clone(&self.deliver);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let items = {
                let mut guard = lock(&pending);
                guard.timer = None;
                std::mem::take(&mut guard.items)
            };
            debug!(queue = %id, items = items.len(), "flushing batch window");
            for unit in sweep(items) {
                deliver(unit);
            }
        })
    }

    /// Items waiting for the current timer.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).items.len()
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.pending).timer.is_some()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
