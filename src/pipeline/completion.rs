use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts finished tasks and wakes waiters once a fixed target is reached.
///
/// Each task holds a [`DoneGuard`]; dropping the guard (normally or while
/// unwinding from a panic) signals completion exactly once.
#[derive(Debug)]
pub struct CompletionCounter {
    target: usize,
    completed: AtomicUsize,
    notify: Notify,
}

impl CompletionCounter {
    pub fn new(target: usize) -> Arc<Self> {
        Arc::new(Self {
            target,
            completed: AtomicUsize::new(0),
            notify: Notify::new(),
        })
    }

    /// Hand out a guard that signals completion when dropped.
    ///
    /// Callers must create exactly `target` guards.
    pub fn guard(self: &Arc<Self>) -> DoneGuard {
        DoneGuard {
            counter: Arc::clone(self),
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.target
    }

    /// Wait until `target` completions have been signalled.
    ///
    /// Returns immediately for a target of zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a signal between the check and the
            // await is not lost.
            notified.as_mut().enable();

            if self.is_complete() {
                return;
            }

            notified.await;
        }
    }

    fn signal(&self) {
        let previous = self.completed.fetch_add(1, Ordering::AcqRel);
        debug_assert!(previous < self.target, "more completions than guards");

        if previous + 1 == self.target {
            self.notify.notify_waiters();
        }
    }
}

/// Signals one completion on its [`CompletionCounter`] when dropped.
#[derive(Debug)]
pub struct DoneGuard {
    counter: Arc<CompletionCounter>,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.counter.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_zero_target_completes_immediately() {
        let counter = CompletionCounter::new(0);
        assert!(counter.is_complete());

        tokio::time::timeout(Duration::from_secs(1), counter.wait())
            .await
            .expect("wait on empty counter should not block");
    }

    #[tokio::test]
    async fn test_wait_blocks_until_all_guards_dropped() {
        let counter = CompletionCounter::new(3);
        let guards: Vec<_> = (0..3).map(|_| counter.guard()).collect();

        let waiter = {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move { counter.wait().await })
        };

        let mut guards = guards.into_iter();
        drop(guards.next());
        drop(guards.next());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.completed(), 2);
        assert!(!waiter.is_finished());

        drop(guards.next());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish after last guard")
            .unwrap();
        assert!(counter.is_complete());
    }

    #[tokio::test]
    async fn test_guard_signals_on_panic() {
        let counter = CompletionCounter::new(1);
        let guard = counter.guard();

        let result = tokio::spawn(async move {
            let _guard = guard;
            panic!("producer crashed");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.completed(), 1);
        counter.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_signals_are_all_counted() {
        let counter = CompletionCounter::new(500);
        let handles: Vec<_> = (0..500)
            .map(|_| {
                let guard = counter.guard();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    drop(guard);
                })
            })
            .collect();

        counter.wait().await;
        assert_eq!(counter.completed(), 500);

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
