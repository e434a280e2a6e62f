use std::sync::Arc;
use tokio::sync::watch;

/// Latest-value holder that a presentation layer can watch.
///
/// Cloning shares the same underlying value; new subscribers immediately see
/// whatever was last published. Only this crate can publish.
#[derive(Debug)]
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub(crate) fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that starts at the current value and wakes on every publish.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Whether both handles refer to the same holder.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    pub(crate) fn set(&self, value: T) {
        // send_replace succeeds even with no receivers
        self.tx.send_replace(value);
    }
}
