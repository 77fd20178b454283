//! Single-slot, per-type event channels.
//!
//! Each event type owns one channel holding at most one *pending* value and
//! at most one *visible* value. A channel moves through these states, driven
//! by writes and by the retire step that ends every update cycle:
//!
//! ```text
//! Empty --write (cycle N)--> Pending --retire N--> Visible --retire N+1--> Empty
//! ```
//!
//! Readers only ever see the visible value. A value written during cycle N is
//! therefore readable by every system of cycle N+1 (and by the driver between
//! the two cycles) and is gone during cycle N+2, unless it was written again
//! during N+1. Writing twice in one cycle keeps the last value.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

/// Marker trait for values sent through [`Events`].
pub trait Event: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Event for T {}

type Boxed = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct EventChannel {
    pending: Option<Boxed>,
    visible: Option<Boxed>,
}

/// The event bus of one world.
#[derive(Default)]
pub struct Events {
    channels: HashMap<TypeId, EventChannel>,
    retired: u64,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `event`. It becomes visible after the current cycle retires.
    pub fn send<T: Event>(&mut self, event: T) {
        self.channels
            .entry(TypeId::of::<T>())
            .or_default()
            .pending = Some(Box::new(event));
    }

    pub fn writer<T: Event>(&mut self) -> EventWriter<'_, T> {
        EventWriter {
            events: self,
            _marker: PhantomData,
        }
    }

    pub fn reader<T: Event>(&self) -> EventReader<'_, T> {
        EventReader {
            value: self.read::<T>(),
        }
    }

    /// Whether a `T` is currently visible.
    pub fn has<T: Event>(&self) -> bool {
        self.read::<T>().is_some()
    }

    /// The currently visible `T`, if any.
    pub fn read<T: Event>(&self) -> Option<&T> {
        self.channels
            .get(&TypeId::of::<T>())
            .and_then(|c| c.visible.as_ref())
            .and_then(|b| b.downcast_ref())
    }

    /// Consume the visible `T` so later readers in this cycle no longer see it.
    pub fn take<T: Event>(&mut self) -> Option<T> {
        self.channels
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.visible.take())
            .and_then(|b| b.downcast().ok())
            .map(|b| *b)
    }

    /// Drop both the visible and the pending `T`.
    pub fn clear<T: Event>(&mut self) {
        self.channels.remove(&TypeId::of::<T>());
    }

    /// End-of-cycle step: drop visible values and publish pending ones.
    pub(crate) fn retire(&mut self) {
        for channel in self.channels.values_mut() {
            channel.visible = channel.pending.take();
        }
        self.channels.retain(|_, c| c.visible.is_some());
        self.retired += 1;
    }

    /// Number of retire steps performed so far.
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Drop every channel.
    pub fn clear_all(&mut self) {
        self.channels.clear();
    }
}

/// Write handle for one event type.
pub struct EventWriter<'a, T: Event> {
    events: &'a mut Events,
    _marker: PhantomData<fn(T)>,
}

impl<T: Event> EventWriter<'_, T> {
    pub fn write(&mut self, event: T) {
        self.events.send(event);
    }
}

/// Read handle for one event type, bound to the value visible when it was created.
pub struct EventReader<'a, T: Event> {
    value: Option<&'a T>,
}

impl<'a, T: Event> EventReader<'a, T> {
    pub fn has(&self) -> bool {
        self.value.is_some()
    }

    pub fn read(&self) -> Option<&'a T> {
        self.value
    }
}
