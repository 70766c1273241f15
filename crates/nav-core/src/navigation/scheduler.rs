//! Deferral of page loads until pending UI work has run

use async_trait::async_trait;

/// Defers a unit of work until the events already queued on the current
/// event loop have been processed
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn after_pending_events(&self);
}

/// Yields once to the tokio event loop
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLoopScheduler;

#[async_trait]
impl Scheduler for EventLoopScheduler {
    async fn after_pending_events(&self) {
        tokio::task::yield_now().await;
    }
}

/// Runs the work straight away, for hosts without an event queue
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn after_pending_events(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_event_loop_scheduler_lets_queued_tasks_run() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = tokio::spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });

        EventLoopScheduler.after_pending_events().await;

        assert!(ran.load(Ordering::SeqCst));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_immediate_scheduler_does_not_yield() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = tokio::spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });

        ImmediateScheduler.after_pending_events().await;

        assert!(!ran.load(Ordering::SeqCst));
        task.await.unwrap();
    }
}
