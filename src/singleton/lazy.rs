//! Exactly-once async initializer with fallible construction.
//!
//! # Responsibilities
//! - Run a factory at most once per slot, whatever the number of callers
//! - Suspend concurrent callers until the slot reaches a terminal state
//! - Hand every caller a clone of the same value or the same error
//! - Convert panics and abandoned initializers into ordinary errors

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures_util::FutureExt;
use tokio::sync::watch;

use crate::observability::metrics;

/// Observable state of a singleton slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Constructing,
    Ready,
    Failed,
}

impl SlotState {
    /// True for `Ready` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SlotState::Ready | SlotState::Failed)
    }
}

/// A factory that panicked, or whose initiating caller went away before it resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("construction of `{resource}` did not complete: {reason}")]
pub struct ConstructionPanic {
    /// Name of the singleton whose factory faulted.
    pub resource: &'static str,
    /// Human readable description of the fault.
    pub reason: String,
}

impl ConstructionPanic {
    fn from_payload(resource: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(message) = payload.downcast_ref::<&str>() {
            format!("factory panicked: {}", message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            format!("factory panicked: {}", message)
        } else {
            "factory panicked".to_string()
        };
        Self { resource, reason }
    }

    fn abandoned(resource: &'static str) -> Self {
        Self {
            resource,
            reason: "initializer was dropped before the factory resolved".to_string(),
        }
    }
}

enum Slot<T, E> {
    Empty,
    Constructing,
    Ready(T),
    Failed(E),
}

impl<T, E> Slot<T, E> {
    fn state(&self) -> SlotState {
        match self {
            Slot::Empty => SlotState::Empty,
            Slot::Constructing => SlotState::Constructing,
            Slot::Ready(_) => SlotState::Ready,
            Slot::Failed(_) => SlotState::Failed,
        }
    }
}

impl<T: Clone, E: Clone> Slot<T, E> {
    fn outcome(&self) -> Option<Result<T, E>> {
        match self {
            Slot::Ready(value) => Some(Ok(value.clone())),
            Slot::Failed(error) => Some(Err(error.clone())),
            Slot::Empty | Slot::Constructing => None,
        }
    }
}

/// A lazily constructed, shared resource.
///
/// The first caller of [`LazySingleton::get_or_try_init`] runs its factory;
/// every other caller waits for that factory and receives a clone of its
/// outcome. Factories passed by later callers are dropped unused.
///
/// Failure is terminal. Once a factory has returned an error (or panicked),
/// every later call returns the same error without constructing anything.
pub struct LazySingleton<T, E> {
    name: &'static str,
    slot: watch::Sender<Slot<T, E>>,
    initializations: AtomicUsize,
}

impl<T, E> LazySingleton<T, E> {
    /// Create an empty slot. `name` labels logs and metrics.
    pub fn new(name: &'static str) -> Self {
        let (slot, _) = watch::channel(Slot::Empty);
        Self {
            name,
            slot,
            initializations: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state of the slot.
    pub fn state(&self) -> SlotState {
        self.slot.borrow().state()
    }

    /// Number of factories started on this slot. Never exceeds one.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

impl<T: Clone, E> LazySingleton<T, E> {
    /// The constructed value, if the slot is ready. Never waits.
    pub fn get(&self) -> Option<T> {
        match &*self.slot.borrow() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T, E> LazySingleton<T, E>
where
    T: Clone,
    E: Clone + fmt::Display + From<ConstructionPanic>,
{
    /// Return the shared value, constructing it with `factory` on first use.
    pub async fn get_or_try_init<F, Fut>(&self, factory: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Subscribe before claiming so a resolution between the two is not missed.
        let mut changes = self.slot.subscribe();

        let claimed = self.slot.send_if_modified(|slot| {
            if matches!(slot, Slot::Empty) {
                *slot = Slot::Constructing;
                true
            } else {
                false
            }
        });

        if claimed {
            return self.construct(factory).await;
        }

        loop {
            let outcome = changes.borrow_and_update().outcome();
            if let Some(outcome) = outcome {
                return outcome;
            }
            if changes.changed().await.is_err() {
                return Err(ConstructionPanic::abandoned(self.name).into());
            }
        }
    }

    async fn construct<F, Fut>(&self, factory: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let claim = Claim {
            slot: &self.slot,
            resource: self.name,
            resolved: false,
        };
        self.initializations.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(resource = self.name, "Constructing shared resource");

        let started = Instant::now();
        let outcome = match AssertUnwindSafe(async move { factory().await })
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => Err(ConstructionPanic::from_payload(self.name, payload).into()),
        };
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => tracing::info!(
                resource = self.name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Shared resource ready"
            ),
            Err(e) => tracing::error!(
                resource = self.name,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Shared resource construction failed"
            ),
        }
        metrics::record_singleton_init(self.name, outcome.is_ok(), elapsed);

        claim.resolve(match &outcome {
            Ok(value) => Slot::Ready(value.clone()),
            Err(error) => Slot::Failed(error.clone()),
        });
        outcome
    }
}

impl<T, E> fmt::Debug for LazySingleton<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySingleton")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Exclusive right to resolve a slot. Dropping it unresolved fails the slot.
struct Claim<'a, T, E: From<ConstructionPanic>> {
    slot: &'a watch::Sender<Slot<T, E>>,
    resource: &'static str,
    resolved: bool,
}

impl<T, E: From<ConstructionPanic>> Claim<'_, T, E> {
    fn resolve(mut self, terminal: Slot<T, E>) {
        self.slot.send_replace(terminal);
        self.resolved = true;
    }
}

impl<T, E: From<ConstructionPanic>> Drop for Claim<'_, T, E> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        tracing::warn!(resource = self.resource, "Initializer dropped mid-construction");
        let error = ConstructionPanic::abandoned(self.resource);
        self.slot.send_replace(Slot::Failed(error.into()));
    }
}
