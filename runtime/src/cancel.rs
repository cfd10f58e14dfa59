//! Cooperative cancellation for background work.
//!
//! Every task the engine spawns receives a [`CancelScope`]. Cancelling a scope
//! cancels all of its children; a task checks the scope before committing any
//! result, and [`CancelScope::run`] turns cancellation into
//! [`RuntimeError::Cancelled`] so it propagates instead of being handled as a
//! failure.

use crate::error::{Result, RuntimeError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelScope {
    /// Own flag first, then every ancestor's.
    chain: Vec<Arc<watch::Sender<bool>>>,
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            chain: vec![Arc::new(tx)],
        }
    }

    /// A scope cancelled together with this one, and cancellable on its own.
    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(false);
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.push(Arc::new(tx));
        chain.extend(self.chain.iter().cloned());
        Self { chain }
    }

    pub fn cancel(&self) {
        if let Some(own) = self.chain.first() {
            own.send_replace(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.chain.iter().any(|flag| *flag.borrow())
    }

    /// Resolves once this scope or an ancestor is cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let waits = self.chain.iter().map(|flag| {
            let mut rx = flag.subscribe();
            Box::pin(async move {
                let _ = rx.wait_for(|cancelled| *cancelled).await;
            })
        });
        futures::future::select_all(waits).await;
    }

    /// Run `fut` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(RuntimeError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn parent_cancels_children() {
        let parent = CancelScope::new();
        let child = parent.child();
        let grandchild = child.child();

        assert!(!grandchild.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        grandchild.cancelled().await;
    }

    #[tokio::test]
    async fn child_does_not_cancel_parent() {
        let parent = CancelScope::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_cancelled() {
        let scope = CancelScope::new();
        let task_scope = scope.clone();
        let task = tokio::spawn(async move {
            task_scope
                .run(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, RuntimeError>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        scope.cancel();
        let result = task.await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }
}
