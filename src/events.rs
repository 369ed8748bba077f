use std::sync::{Arc, Mutex, Weak};

/// Named events with no payload. Delivery is at-least-once, so handlers
/// must be idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    RefreshSidebar,
    RefreshCloud,
}

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, AppEvent, Handler)>,
}

/// Explicit subscription registry. Subscriptions are handles: dropping
/// one tears its handler down, so a remounted component cannot leak or
/// double-register handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(
        &self,
        event: AppEvent,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = lock_registry(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, event, Arc::new(handler)));
        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn emit(&self, event: AppEvent) {
        // Handlers run outside the lock so one may emit further events.
        let matching: Vec<Handler> = {
            let registry = lock_registry(&self.inner);
            registry
                .handlers
                .iter()
                .filter(|(_, e, _)| *e == event)
                .map(|(_, _, h)| Arc::clone(h))
                .collect()
        };
        for handler in matching {
            handler();
        }
    }

    pub fn subscriber_count(&self, event: AppEvent) -> usize {
        lock_registry(&self.inner)
            .handlers
            .iter()
            .filter(|(_, e, _)| *e == event)
            .count()
    }
}

/// The registry stays structurally valid across a panicking handler, so
/// a poisoned lock is recovered rather than propagated.
fn lock_registry(inner: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for one registered handler.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            lock_registry(&inner)
                .handlers
                .retain(|(id, _, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_matching_subscribers_only() {
        let bus = EventBus::new();
        let sidebar = Arc::new(AtomicUsize::new(0));
        let cloud = Arc::new(AtomicUsize::new(0));

        let s = {
            let sidebar = Arc::clone(&sidebar);
            bus.subscribe(AppEvent::RefreshSidebar, move || {
                sidebar.fetch_add(1, Ordering::SeqCst);
            })
        };
        let c = {
            let cloud = Arc::clone(&cloud);
            bus.subscribe(AppEvent::RefreshCloud, move || {
                cloud.fetch_add(1, Ordering::SeqCst);
            })
        };

        bus.emit(AppEvent::RefreshSidebar);
        bus.emit(AppEvent::RefreshSidebar);
        assert_eq!(sidebar.load(Ordering::SeqCst), 2);
        assert_eq!(cloud.load(Ordering::SeqCst), 0);

        drop(s);
        drop(c);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count = Arc::clone(&count);
            let _sub = bus.subscribe(AppEvent::RefreshSidebar, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(bus.subscriber_count(AppEvent::RefreshSidebar), 1);
        }

        assert_eq!(bus.subscriber_count(AppEvent::RefreshSidebar), 0);
        bus.emit(AppEvent::RefreshSidebar);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bus_survives_panicking_handler() {
        let bus = EventBus::new();
        let bad = bus.subscribe(AppEvent::RefreshSidebar, || panic!("handler failure"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.emit(AppEvent::RefreshSidebar);
        }));
        assert!(result.is_err());
        drop(bad);

        // Subscription management keeps working after the unwind.
        let count = Arc::new(AtomicUsize::new(0));
        let _sub = {
            let count = Arc::clone(&count);
            bus.subscribe(AppEvent::RefreshSidebar, move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        bus.emit(AppEvent::RefreshSidebar);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_emit_again() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _cloud = {
            let count = Arc::clone(&count);
            bus.subscribe(AppEvent::RefreshCloud, move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _sidebar = {
            let bus2 = bus.clone();
            bus.subscribe(AppEvent::RefreshSidebar, move || {
                bus2.emit(AppEvent::RefreshCloud);
            })
        };

        bus.emit(AppEvent::RefreshSidebar);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
