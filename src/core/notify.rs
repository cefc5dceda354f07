//! Purpose: Tell interested parties that a new snapshot replaced the previous one.
//! Exports: `Notifier`, `SnapshotReplaced`.
//! Role: Explicit event hub handed to the publisher; no process-wide state.
//! Invariants: Delivery is fire-and-forget; a dropped receiver never fails a publish.
//! Invariants: Generations start at 1 and increase by one per notification.
//! Invariants: Callbacks run after the subscriber lock is released, so they may call back in.
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SnapshotReplaced {
    pub generation: u64,
}

type Callback = Arc<dyn Fn(SnapshotReplaced) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    generation: u64,
    senders: Vec<Sender<SnapshotReplaced>>,
    callbacks: Vec<Callback>,
}

#[derive(Default)]
pub struct Notifier {
    inner: Mutex<Subscribers>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<SnapshotReplaced> {
        let (tx, rx) = mpsc::channel();
        self.lock().senders.push(tx);
        rx
    }

    pub fn on_published(&self, callback: impl Fn(SnapshotReplaced) + Send + Sync + 'static) {
        self.lock().callbacks.push(Arc::new(callback));
    }

    /// Generation of the last notification; 0 before the first.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn notify(&self) -> SnapshotReplaced {
        let (event, receivers, callbacks) = {
            let mut inner = self.lock();
            inner.generation += 1;
            let event = SnapshotReplaced {
                generation: inner.generation,
            };
            inner.senders.retain(|tx| tx.send(event).is_ok());
            (event, inner.senders.len(), inner.callbacks.clone())
        };
        for callback in &callbacks {
            callback(event);
        }
        debug!(
            generation = event.generation,
            receivers,
            callbacks = callbacks.len(),
            "snapshot replaced"
        );
        event
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Notifier")
            .field("generation", &inner.generation)
            .field("receivers", &inner.senders.len())
            .field("callbacks", &inner.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Notifier, SnapshotReplaced};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn receivers_and_callbacks_see_each_generation() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_in_callback = Arc::clone(&seen);
        notifier.on_published(move |event| {
            seen_in_callback.store(event.generation, Ordering::SeqCst);
        });

        assert_eq!(notifier.notify().generation, 1);
        assert_eq!(notifier.notify().generation, 2);
        assert_eq!(rx.try_recv().expect("first"), SnapshotReplaced { generation: 1 });
        assert_eq!(rx.try_recv().expect("second"), SnapshotReplaced { generation: 2 });
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.generation(), 2);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let notifier = Notifier::new();
        let kept = notifier.subscribe();
        drop(notifier.subscribe());
        notifier.notify();
        assert!(kept.try_recv().is_ok());
        assert!(format!("{notifier:?}").contains("receivers: 1"));
    }

    #[test]
    fn callbacks_may_call_back_into_the_notifier() {
        let notifier = Arc::new(Notifier::new());
        let seen = Arc::new(AtomicU64::new(0));
        let weak = Arc::downgrade(&notifier);
        let seen_in_callback = Arc::clone(&seen);
        notifier.on_published(move |_| {
            if let Some(notifier) = weak.upgrade() {
                seen_in_callback.store(notifier.generation(), Ordering::SeqCst);
                drop(notifier.subscribe());
            }
        });

        let worker = Arc::clone(&notifier);
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            worker.notify();
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("notify returned");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
