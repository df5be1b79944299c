//! Pool manager for scrape contexts.
//!
//! At most `max_concurrent` browser contexts are open at once. Further
//! callers wait in arrival order (tokio's semaphore is fair) and are admitted
//! as running scrapes finish.

use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Handle to a borrowed browser context from the pool.
///
/// Dropping the handle frees the slot. A context still held at drop time
/// is closed in the background.
pub struct ContextHandle {
    context: Option<Box<dyn RenderContext>>,
    _permit: OwnedSemaphorePermit,
    active_count: Arc<AtomicUsize>,
}

impl ContextHandle {
    /// Get a mutable reference to the render context.
    pub fn context_mut(&mut self) -> Option<&mut (dyn RenderContext + 'static)> {
        self.context.as_deref_mut()
    }

    /// Take the context out of the handle (for passing to close).
    fn take(&mut self) -> Option<Box<dyn RenderContext>> {
        self.context.take()
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        if let Some(mut context) = self.context.take() {
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(async move {
                    if let Err(e) = context.close().await {
                        warn!("failed to close abandoned context: {e}");
                    }
                });
            }
        }
    }
}

/// Decrements the waiting counter even if the waiter is cancelled.
struct WaitGuard<'a>(&'a AtomicUsize);

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub active: usize,
    pub queued: usize,
    pub max_concurrent: usize,
}

/// Bounds concurrent scrapes and queues the rest in FIFO order.
pub struct ScrapePool {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    active_count: Arc<AtomicUsize>,
    waiting: AtomicUsize,
}

impl ScrapePool {
    pub fn new(renderer: Arc<dyn Renderer>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            active_count: Arc::new(AtomicUsize::new(0)),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Acquire a browser context, waiting for a free slot if needed.
    pub async fn acquire(&self) -> Result<ContextHandle> {
        let permit = {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let _guard = WaitGuard(&self.waiting);
            Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|e| anyhow::anyhow!("scrape pool closed: {e}"))?
        };

        // Counted before opening so a failed open releases the slot cleanly.
        self.active_count.fetch_add(1, Ordering::SeqCst);
        let mut handle = ContextHandle {
            context: None,
            _permit: permit,
            active_count: Arc::clone(&self.active_count),
        };
        handle.context = Some(self.renderer.new_context().await?);
        debug!(active = self.active(), queued = self.queued(), "context acquired");
        Ok(handle)
    }

    /// Close the context and free the slot.
    pub async fn release(&self, mut handle: ContextHandle) -> Result<()> {
        match handle.take() {
            Some(mut context) => context.close().await,
            None => Ok(()),
        }
    }

    /// Number of scrapes currently holding a context.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Number of callers waiting for a slot.
    pub fn queued(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            active: self.active(),
            queued: self.queued(),
            max_concurrent: self.max_concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::FakeRenderer;
    use std::time::Duration;

    fn pool(max: usize) -> (Arc<FakeRenderer>, Arc<ScrapePool>) {
        let renderer = Arc::new(FakeRenderer::default());
        let pool = Arc::new(ScrapePool::new(renderer.clone(), max));
        (renderer, pool)
    }

    #[tokio::test]
    async fn test_admits_up_to_limit() {
        let (renderer, pool) = pool(2);
        let h1 = pool.acquire().await.unwrap();
        let _h2 = pool.acquire().await.unwrap();
        assert_eq!(pool.active(), 2);
        assert_eq!(pool.available(), 0);
        assert_eq!(renderer.active_contexts(), 2);

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err());
        assert_eq!(pool.queued(), 0);

        pool.release(h1).await.unwrap();
        assert_eq!(pool.active(), 1);
        assert_eq!(renderer.active_contexts(), 1);
        let _h3 = pool.acquire().await.unwrap();
        assert_eq!(pool.active(), 2);
    }

    #[tokio::test]
    async fn test_queued_waiter_is_admitted_on_release() {
        let (_renderer, pool) = pool(1);
        let h1 = pool.acquire().await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        for _ in 0..50 {
            if pool.queued() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(pool.queued(), 1);
        assert_eq!(
            pool.status(),
            PoolStatus {
                active: 1,
                queued: 1,
                max_concurrent: 1
            }
        );

        drop(h1);
        waiter.await.unwrap().unwrap();
        assert_eq!(pool.queued(), 0);
    }

    #[tokio::test]
    async fn test_failed_open_frees_slot() {
        let renderer = Arc::new(FakeRenderer::failing_launch("no browser"));
        let pool = ScrapePool::new(renderer, 1);
        let err = pool.acquire().await.err().unwrap();
        assert!(err.to_string().contains("no browser"));
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped() {
        let (_renderer, pool) = pool(0);
        assert_eq!(pool.max_concurrent(), 1);
        let _h = pool.acquire().await.unwrap();
    }
}
