use super::core::{Event, EventType, Severity};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Sink for dispatcher notifications.
///
/// `emit` is called on the request path and must not block for long.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: &Event) {}
}

/// Logs every event through `tracing` at the event's severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl EventEmitter for TracingEmitter {
    fn emit(&self, event: &Event) {
        let kind = event.event_type.as_str();
        let data = serde_json::Value::Object(event.data.clone());
        match event.severity {
            Severity::Trace => trace!(event = kind, data = %data, "{}", event.message),
            Severity::Debug => debug!(event = kind, data = %data, "{}", event.message),
            Severity::Info => info!(event = kind, data = %data, "{}", event.message),
            Severity::Warn => warn!(event = kind, data = %data, "{}", event.message),
            Severity::Error => error!(event = kind, data = %data, "{}", event.message),
        }
    }
}

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    by_type: HashMap<EventType, Vec<(ListenerId, Callback)>>,
    global: Vec<(ListenerId, Callback)>,
}

/// Synchronous fan-out to registered listeners.
///
/// A panicking listener is logged and skipped; the remaining listeners still
/// receive the event.
#[derive(Default)]
pub struct ListenerEmitter {
    listeners: RwLock<Listeners>,
    next_id: AtomicU64,
}

impl ListenerEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Receive events of one type.
    pub fn register_listener<F>(&self, event_type: EventType, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .by_type
            .entry(event_type)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Receive every event.
    pub fn register_global_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .global
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a listener by id. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        guard.global.retain(|(lid, _)| *lid != id);
        for list in guard.by_type.values_mut() {
            list.retain(|(lid, _)| *lid != id);
        }
        guard.by_type.retain(|_, list| !list.is_empty());
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        guard.global.len() + guard.by_type.values().map(Vec::len).sum::<usize>()
    }
}

impl EventEmitter for ListenerEmitter {
    fn emit(&self, event: &Event) {
        // Snapshot so callbacks run without the lock held.
        let callbacks: Vec<Callback> = {
            let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            guard
                .by_type
                .get(&event.event_type)
                .into_iter()
                .flatten()
                .chain(guard.global.iter())
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };
        for cb in callbacks {
            if catch_unwind(AssertUnwindSafe(|| cb(event))).is_err() {
                warn!(event = event.event_type.as_str(), "Event listener panicked");
            }
        }
    }
}

/// Non-blocking emitter: events are queued and delivered to the wrapped
/// emitter on a background thread.
///
/// When the queue is full the event is dropped and counted. Dropping the
/// emitter drains the queue and joins the thread.
pub struct AsyncEmitter {
    sender: Option<SyncSender<Event>>,
    worker: Option<JoinHandle<()>>,
    dropped: AtomicU64,
}

impl AsyncEmitter {
    /// Spawn the delivery thread with room for `capacity` queued events.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the thread.
    pub fn spawn(inner: Arc<dyn EventEmitter>, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx) = sync_channel::<Event>(capacity.max(1));
        let worker = std::thread::Builder::new()
            .name("brrtdispatch-events".into())
            .spawn(move || {
                for event in rx {
                    inner.emit(&event);
                }
            })?;
        Ok(Self {
            sender: Some(tx),
            worker: Some(worker),
            dropped: AtomicU64::new(0),
        })
    }

    /// Events discarded because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventEmitter for AsyncEmitter {
    fn emit(&self, event: &Event) {
        let Some(tx) = &self.sender else {
            return;
        };
        match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(event = event.event_type.as_str(), "Event queue full; event dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Drop for AsyncEmitter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Event delivery thread panicked");
            }
        }
    }
}
