//! One-shot wake timer.
//!
//! At most one wake is armed at a time. A fired wake carries the generation
//! it was armed under; the engine drops a wake whose generation is no longer
//! current, so a timer that raced with [`UpdateScheduler::cancel`] never
//! triggers a redraw.

use crate::cancel::CancelScope;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A fired wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    pub generation: u64,
}

#[derive(Debug)]
pub struct UpdateScheduler {
    wakes: mpsc::UnboundedSender<Wake>,
    scope: CancelScope,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl UpdateScheduler {
    pub fn new(wakes: mpsc::UnboundedSender<Wake>, scope: CancelScope) -> Self {
        Self {
            wakes,
            scope,
            generation: 0,
            pending: None,
        }
    }

    /// Arm a wake `delay_ms` from now, replacing any armed one.
    pub fn schedule_next(&mut self, delay_ms: u64) {
        self.cancel();
        self.generation += 1;

        let wake = Wake {
            generation: self.generation,
        };
        let wakes = self.wakes.clone();
        let scope = self.scope.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    let _ = wakes.send(wake);
                }
            }
        }));
        tracing::trace!(delay_ms, generation = self.generation, "wake armed");
    }

    /// Disarm the pending wake. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            self.generation += 1;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume a fired wake. Returns `false` for a stale one.
    pub fn on_wake(&mut self, wake: Wake) -> bool {
        if wake.generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
