//! Property change notifications.
//!
//! Every property owns one [`PropertySignal`]. It delivers
//! [`PropertyEvent`]s two ways:
//!
//! - **Listeners** are synchronous callbacks invoked on the emitting thread,
//!   in connection order, before the emitting call returns. Dependency
//!   wiring and UI bindings use them so that metadata and display state are
//!   up to date by the time `change_value` or `route` returns.
//! - **Subscriptions** are `tokio::sync::broadcast` receivers for async
//!   observers (loggers, remote front ends) that may lag.
//!
//! Value-changed events carry a [`ValueOrigin`] tag so a binding can tell its
//! own edit apart from a device report.
//!
//! # Example
//!
//! ```rust,ignore
//! let id = signal.connect(|event| println!("{:?}", event));
//! let mut rx = signal.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         println!("async: {:?}", event);
//!     }
//! });
//! signal.disconnect(id);
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::value::NativeValue;

/// Buffered events per async subscriber before it starts lagging.
const SUBSCRIPTION_CAPACITY: usize = 64;

/// Where a value change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueOrigin {
    /// A caller wrote the value through `change_value`.
    LocalEdit,
    /// The device reported the value asynchronously.
    DeviceNotification,
}

/// Event emitted by a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyEvent {
    /// The value changed.
    ValueChanged {
        /// New value.
        value: NativeValue,
        /// Who changed it.
        origin: ValueOrigin,
    },
    /// The cached legal values or bounds were replaced.
    ListChanged,
}

/// Handle returned by [`PropertySignal::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Async subscription to a property's events.
pub type Subscription = broadcast::Receiver<PropertyEvent>;

type Listener = Arc<dyn Fn(&PropertyEvent) + Send + Sync>;

/// Multi-listener event source owned by a property.
pub struct PropertySignal {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<PropertyEvent>,
}

impl std::fmt::Debug for PropertySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySignal")
            .field("listeners", &self.listeners.read().len())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl PropertySignal {
    /// Create a signal without listeners.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            sender,
        }
    }

    /// Register a synchronous listener.
    pub fn connect<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PropertyEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Open an async subscription.
    pub fn subscribe(&self) -> Subscription {
        self.sender.subscribe()
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Number of open async subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver an event to every listener, then to every subscription.
    ///
    /// The listener list is snapshotted first, so a listener may connect,
    /// disconnect or emit on this same signal without deadlocking.
    pub fn emit(&self, event: PropertyEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(&event);
        }

        // No subscribers is the normal case.
        let _ = self.sender.send(event);
    }
}

impl Default for PropertySignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn listeners_run_in_order_and_disconnect() {
        let signal = PropertySignal::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let l1 = Arc::clone(&log);
        let first = signal.connect(move |_| l1.lock().push(1));
        let l2 = Arc::clone(&log);
        signal.connect(move |_| l2.lock().push(2));

        signal.emit(PropertyEvent::ListChanged);
        assert_eq!(*log.lock(), vec![1, 2]);

        assert!(signal.disconnect(first));
        assert!(!signal.disconnect(first));
        signal.emit(PropertyEvent::ListChanged);
        assert_eq!(*log.lock(), vec![1, 2, 2]);
    }

    #[test]
    fn listener_may_disconnect_itself() {
        let signal = Arc::new(PropertySignal::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let id_slot = Arc::new(parking_lot::Mutex::new(None));

        let sig = Arc::clone(&signal);
        let slot = Arc::clone(&id_slot);
        let counter = Arc::clone(&calls);
        let id = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock() {
                sig.disconnect(id);
            }
        });
        *id_slot.lock() = Some(id);

        signal.emit(PropertyEvent::ListChanged);
        signal.emit(PropertyEvent::ListChanged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let signal = PropertySignal::new();
        let mut rx = signal.subscribe();

        signal.emit(PropertyEvent::ValueChanged {
            value: NativeValue::Bool(true),
            origin: ValueOrigin::DeviceNotification,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PropertyEvent::ValueChanged {
                value: NativeValue::Bool(true),
                origin: ValueOrigin::DeviceNotification,
            }
        );
    }
}
