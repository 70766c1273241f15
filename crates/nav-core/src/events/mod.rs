//! Typed event bus and the navigation events

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::navigation::Place;

/// Application-wide event bus
pub struct EventBus {
    handlers: Mutex<AHashMap<TypeId, Vec<Arc<dyn EventHandler>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &dyn Event);
}

/// The user (or the application) asked to go to a place
#[derive(Debug, Clone)]
pub struct NavigationRequested {
    pub place: Place,
}

/// The page manager committed to showing a place
#[derive(Debug, Clone)]
pub struct NavigationAgreed {
    pub place: Place,
}

macro_rules! impl_event {
    ($($t:ty),*) => {
        $(
            impl Event for $t {
                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    }
}

impl_event!(NavigationRequested, NavigationAgreed);

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(AHashMap::new()),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Arc<dyn EventHandler>) {
        let type_id = TypeId::of::<E>();
        self.handlers.lock().entry(type_id).or_default().push(handler);
    }

    /// Publish an event to every handler subscribed to its type.
    ///
    /// Handlers run after the lock is released, so they may publish or
    /// subscribe themselves.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();
        let handlers = match self.handlers.lock().get(&type_id) {
            Some(handlers) => handlers.clone(),
            None => return,
        };

        for handler in handlers {
            handler.handle(&event);
        }
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handler that only reacts to events of type `E`
pub struct TypedEventHandler<E, F> {
    handler: F,
    _phantom: PhantomData<fn(&E)>,
}

impl<E, F> EventHandler for TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) + Send + Sync,
{
    fn handle(&self, event: &dyn Event) {
        if let Some(event) = event.as_any().downcast_ref::<E>() {
            (self.handler)(event);
        }
    }
}

/// Create a typed event handler from a closure
pub fn handler_for<E, F>(f: F) -> Arc<dyn EventHandler>
where
    E: Event,
    F: Fn(&E) + Send + Sync + 'static,
{
    Arc::new(TypedEventHandler {
        handler: f,
        _phantom: PhantomData,
    })
}
