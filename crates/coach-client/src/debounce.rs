//! Trailing-edge debouncer with per-call completion handles.
//!
//! Each [`Debouncer::schedule`] restarts the delay. When the delay runs out the
//! job runs once with the latest arguments. Every handle settles: the executed
//! call with [`Debounced::Completed`], every other call with
//! [`Debounced::Superseded`] as soon as a newer call replaces it.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    Completed(T),
    Superseded,
}

impl<T> Debounced<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Debounced::Completed(value) => Some(value),
            Debounced::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Debounced::Superseded)
    }
}

/// Resolves once the scheduled call either runs or is replaced.
pub struct DebounceHandle<T> {
    rx: oneshot::Receiver<Debounced<T>>,
}

impl<T> Future for DebounceHandle<T> {
    type Output = Debounced<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the job was cancelled or panicked
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Debounced::Superseded))
    }
}

struct Pending<T> {
    generation: u64,
    tx: oneshot::Sender<Debounced<T>>,
    timer: JoinHandle<()>,
}

struct Window<T> {
    generation: u64,
    pending: Option<Pending<T>>,
}

type Job<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, T> + Send + Sync>;

pub struct Debouncer<A, T> {
    job: Job<A, T>,
    delay: Duration,
    window: Arc<Mutex<Window<T>>>,
}

/// Lock, recovering the guard if a holder panicked. Every critical section in
/// this crate leaves its data consistent between statements.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A, T> Debouncer<A, T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    pub fn new<F>(delay: Duration, job: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, T> + Send + Sync + 'static,
    {
        Self {
            job: Arc::new(job),
            delay,
            window: Arc::new(Mutex::new(Window {
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Schedule a call, superseding any call still waiting for its delay.
    /// Must be called inside a tokio runtime.
    pub fn schedule(&self, args: A) -> DebounceHandle<T> {
        let (tx, rx) = oneshot::channel();
        let mut window = lock(&self.window);

        if let Some(previous) = window.pending.take() {
            previous.timer.abort();
            let _ = previous.tx.send(Debounced::Superseded);
            debug!(generation = previous.generation, "Debounced call superseded");
        }

        window.generation += 1;
        let generation = window.generation;
        let timer = tokio::spawn({
            let job = Arc::clone(&self.job);
            let shared = Arc::clone(&self.window);
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;

                let tx = {
                    let mut window = lock(&shared);
                    match window.pending.take() {
                        Some(p) if p.generation == generation => p.tx,
                        other => {
                            window.pending = other;
                            return;
                        }
                    }
                };

                debug!(generation, "Debounced call firing");
                let value = job(args).await;
                let _ = tx.send(Debounced::Completed(value));
            }
        });

        window.pending = Some(Pending {
            generation,
            tx,
            timer,
        });
        DebounceHandle { rx }
    }

    /// Supersede the waiting call, if any, without scheduling a new one.
    pub fn cancel(&self) {
        if let Some(pending) = lock(&self.window).pending.take() {
            pending.timer.abort();
            let _ = pending.tx.send(Debounced::Superseded);
        }
    }
}

impl<A, T> Drop for Debouncer<A, T> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.window).pending.take() {
            pending.timer.abort();
            let _ = pending.tx.send(Debounced::Superseded);
        }
    }
}
