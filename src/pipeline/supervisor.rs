use super::channel::Sender;
use super::completion::CompletionCounter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawn the task that closes the conduit.
///
/// `sink` must be the last sender not owned by a producer. It is dropped only
/// after `done` has seen every producer finish, which makes this task the
/// single closer and keeps every send ahead of the close.
pub fn supervise(done: Arc<CompletionCounter>, sink: Sender<u64>) -> JoinHandle<()> {
    tokio::spawn(async move {
        done.wait().await;
        debug!(producers = done.target(), "All producers finished, closing channel");
        drop(sink);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::create_channel;
    use std::time::Duration;

    #[tokio::test]
    async fn test_channel_stays_open_until_all_done() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let done = CompletionCounter::new(2);
        let first = done.guard();
        let second = done.guard();

        let supervisor = supervise(Arc::clone(&done), tx);

        drop(first);
        let early = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(early.is_err(), "channel closed before all producers finished");

        drop(second);
        assert_eq!(rx.recv().await, None);
        supervisor.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_producers_closes_immediately() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let supervisor = supervise(CompletionCounter::new(0), tx);

        assert_eq!(rx.recv().await, None);
        supervisor.await.unwrap();
    }
}
