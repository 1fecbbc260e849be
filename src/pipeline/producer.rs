use super::channel::Sender;
use super::completion::{CompletionCounter, DoneGuard};
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Values emitted by producer `index`: `index * items_per_producer + j` for
/// `j` in `0..items_per_producer`.
pub fn producer_values(index: usize, items_per_producer: usize) -> Range<u64> {
    let start = index as u64 * items_per_producer as u64;
    start..start + items_per_producer as u64
}

/// Spawn `count` producer tasks writing into `sink`.
///
/// Each task owns a clone of `sink` and one guard from `done`. The clone is
/// released before the guard fires, so once `done` reaches its target no
/// producer can send again. Every handle resolves to the number of values
/// that producer actually sent.
pub fn spawn_producers(
    count: usize,
    items_per_producer: usize,
    sink: &Sender<u64>,
    done: &Arc<CompletionCounter>,
    shutdown: Option<watch::Receiver<bool>>,
) -> Vec<JoinHandle<u64>> {
    (0..count)
        .map(|index| {
            let producer = Producer {
                index,
                items_per_producer,
                sink: sink.clone(),
                shutdown: shutdown.clone(),
                _done: done.guard(),
            };
            tokio::spawn(producer.run())
        })
        .collect()
}

struct Producer {
    index: usize,
    items_per_producer: usize,
    // Fields drop in declaration order: the sender goes before the guard.
    sink: Sender<u64>,
    shutdown: Option<watch::Receiver<bool>>,
    _done: DoneGuard,
}

impl Producer {
    async fn run(mut self) -> u64 {
        let mut sent = 0u64;

        for value in producer_values(self.index, self.items_per_producer) {
            if self.stop_flag_set() {
                debug!(producer = self.index, sent, "Producer stopping on shutdown");
                break;
            }

            tokio::select! {
                biased;
                _ = stop_requested(self.shutdown.as_mut()) => {
                    debug!(producer = self.index, sent, "Producer stopping on shutdown");
                    break;
                }
                result = self.sink.send(value) => {
                    if result.is_err() {
                        debug!(producer = self.index, sent, "Consumer dropped, producer stopping");
                        break;
                    }
                    sent += 1;
                }
            }
        }

        debug!(producer = self.index, sent, "Producer finished");
        sent
    }

    fn stop_flag_set(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}

/// Resolves once shutdown is requested. Never resolves without a shutdown
/// channel or after its sender has gone away.
async fn stop_requested(shutdown: Option<&mut watch::Receiver<bool>>) {
    match shutdown {
        Some(rx) => {
            if rx.wait_for(|&stop| stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::create_channel;

    #[test]
    fn test_producer_values_are_disjoint_ranges() {
        assert_eq!(producer_values(0, 10), 0..10);
        assert_eq!(producer_values(3, 10), 30..40);
        assert_eq!(producer_values(1, 3), 3..6);
        assert!(producer_values(7, 0).is_empty());
    }

    #[tokio::test]
    async fn test_single_producer_sends_in_order() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let done = CompletionCounter::new(1);

        let handles = spawn_producers(1, 5, &tx, &done, None);
        drop(tx);

        let mut received = Vec::new();
        while let Some(value) = rx.recv().await {
            received.push(value);
        }

        assert_eq!(received, vec![0, 1, 2, 3, 4]);
        assert!(done.is_complete());
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 5);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_producers_stall_on_full_channel() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let done = CompletionCounter::new(5);

        let handles = spawn_producers(5, 10, &tx, &done, None);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        // One value fills the only slot; every producer is parked on a send.
        assert_eq!(tx.capacity(), 0);
        assert_eq!(rx.len(), 1);
        assert!(handles.iter().all(|handle| !handle.is_finished()));
        assert_eq!(done.completed(), 0);

        drop(tx);
        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 50);
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 10);
        }
    }

    #[tokio::test]
    async fn test_producer_stops_when_consumer_dropped() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let done = CompletionCounter::new(1);

        let handles = spawn_producers(1, 100, &tx, &done, None);
        drop(tx);

        assert_eq!(rx.recv().await, Some(0));
        drop(rx);

        let sent = handles.into_iter().next().unwrap().await.unwrap();
        assert!(sent < 100);
        done.wait().await;
    }

    #[tokio::test]
    async fn test_producer_honours_shutdown_before_first_send() {
        let (tx, mut rx) = create_channel::<u64>(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(true);
        let done = CompletionCounter::new(2);

        let handles = spawn_producers(2, 10, &tx, &done, Some(shutdown_rx));
        drop(tx);

        assert_eq!(rx.recv().await, None);
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 0);
        }
        assert!(done.is_complete());
        drop(shutdown_tx);
    }
}
