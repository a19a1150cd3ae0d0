//! Class-load events and the bus that carries them.

use imp_core::{CallFrame, LoaderId};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Auxiliary code was loaded into the host and `loader` can now resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLoadEvent {
    pub loader: LoaderId,
    /// Path of the loaded code, when the entry point exposes it.
    pub dex_path: Option<String>,
}

impl ClassLoadEvent {
    /// Build from a `loadDex(ClassLoader, String)` call frame.
    ///
    /// Returns `None` when the first argument is not a loader.
    pub fn from_load_call(frame: &CallFrame) -> Option<Self> {
        let loader = frame.arg(0)?.as_loader()?.clone();
        let dex_path = frame.arg(1).and_then(|v| v.as_str()).map(String::from);
        Some(Self { loader, dex_path })
    }
}

type Subscriber = Arc<dyn Fn(&ClassLoadEvent) + Send + Sync>;

/// Synchronous publish/subscribe bus for [`ClassLoadEvent`]s.
///
/// Subscribers run on the publishing thread, in subscription order.
#[derive(Default)]
pub struct ClassLoadBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl fmt::Debug for ClassLoadBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassLoadBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ClassLoadBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&ClassLoadEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }

    /// Deliver `event` to every subscriber. Returns the number reached.
    pub fn publish(&self, event: &ClassLoadEvent) -> usize {
        // Snapshot so a subscriber may install hooks (or subscribe) re-entrantly.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tracing::debug!(
            loader = %event.loader,
            subscribers = subscribers.len(),
            "Publishing class-load event"
        );
        for subscriber in &subscribers {
            subscriber(event);
        }
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imp_core::Value;
    use std::sync::Mutex;

    #[test]
    fn test_event_from_load_call() {
        let frame = CallFrame::new(
            None,
            vec![
                Value::Loader(LoaderId::new("dex-1")),
                Value::Str("/data/app/phrases.dex".into()),
            ],
        );
        let event = ClassLoadEvent::from_load_call(&frame).unwrap();
        assert_eq!(event.loader, LoaderId::new("dex-1"));
        assert_eq!(event.dex_path.as_deref(), Some("/data/app/phrases.dex"));
    }

    #[test]
    fn test_event_requires_loader_argument() {
        let frame = CallFrame::new(None, vec![Value::Null, Value::Str("x".into())]);
        assert!(ClassLoadEvent::from_load_call(&frame).is_none());
        assert!(ClassLoadEvent::from_load_call(&CallFrame::default()).is_none());
    }

    #[test]
    fn test_event_without_path() {
        let frame = CallFrame::new(None, vec![Value::Loader(LoaderId::new("dex-1")), Value::Null]);
        let event = ClassLoadEvent::from_load_call(&frame).unwrap();
        assert!(event.dex_path.is_none());
    }

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let bus = ClassLoadBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |event| {
                seen.lock()
                    .unwrap()
                    .push(format!("{tag}:{}", event.loader));
            });
        }

        let delivered = bus.publish(&ClassLoadEvent {
            loader: LoaderId::new("dex-1"),
            dex_path: None,
        });
        assert_eq!(delivered, 2);
        assert_eq!(*seen.lock().unwrap(), ["first:dex-1", "second:dex-1"]);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = ClassLoadBus::new();
        let event = ClassLoadEvent {
            loader: LoaderId::new("dex-1"),
            dex_path: None,
        };
        assert_eq!(bus.publish(&event), 0);
    }

    #[test]
    fn test_subscriber_may_subscribe_during_publish() {
        let bus = Arc::new(ClassLoadBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(move |_| inner.subscribe(|_| {}));

        let event = ClassLoadEvent {
            loader: LoaderId::new("dex-1"),
            dex_path: None,
        };
        assert_eq!(bus.publish(&event), 1);
        assert_eq!(bus.subscriber_count(), 2);
    }
}
