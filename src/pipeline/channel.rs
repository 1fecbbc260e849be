use tokio::sync::mpsc;

pub type Sender<T> = mpsc::Sender<T>;
pub type Receiver<T> = mpsc::Receiver<T>;

/// Smallest capacity tokio offers: one shared slot, so a producer can be at
/// most one value ahead of the consumer.
pub const RENDEZVOUS_CAPACITY: usize = 1;

/// Create the shared conduit with the specified capacity.
///
/// Capacity must be at least one; callers validate this first.
pub fn create_channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    mpsc::channel(capacity)
}
