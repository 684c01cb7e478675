// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Event sources and their subscription tables.
//!
//! Every event source owns a [`Signals`] table mapping event names to the
//! handles subscribed to them. The table guarantees at most one subscription
//! per (source, event, handle) triple and holds subscribers weakly, so
//! connecting a handle never extends its life. The connect/disconnect
//! operations themselves live on [`CallbackHandle`](crate::CallbackHandle).

mod subscription;

use crate::handle::{CallbackHandle, WeakCallbackHandle};
use crate::id::{HandleId, SourceId};
use crate::owner::WeakOwner;
use crate::variant::Variant;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Anything handles can subscribe to.
pub trait EventSource {
    /// Returns the subscription table of this source.
    fn signals(&self) -> &Signals;

    /// Returns the owner identity of this source, if it can hold handles.
    ///
    /// Sources returning `None` reject
    /// [`connect_and_attach`](crate::CallbackHandle::connect_and_attach).
    fn owner_link(&self) -> Option<WeakOwner> {
        None
    }

    /// Emits `event` with `args`. See [`Signals::emit`].
    fn emit(&self, event: &str, args: &[Variant]) -> usize {
        self.signals().emit(event, args)
    }
}

/// The per-source table of event subscriptions.
pub struct Signals {
    id: SourceId,
    label: String,
    events: RefCell<HashMap<String, Vec<WeakCallbackHandle>>>,
}

impl Signals {
    /// Creates an empty table labelled `label` for diagnostics.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: SourceId::next(),
            label: label.into(),
            events: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the identity of the source owning this table.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Returns the diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if the handle `id` is subscribed to `event`.
    pub fn is_subscribed(&self, event: &str, id: HandleId) -> bool {
        self.events
            .borrow()
            .get(event)
            .is_some_and(|subscribers| {
                subscribers
                    .iter()
                    .any(|subscriber| subscriber.id() == id && subscriber.is_alive())
            })
    }

    /// Returns the number of live subscriptions to `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.events.borrow().get(event).map_or(0, |subscribers| {
            subscribers
                .iter()
                .filter(|subscriber| subscriber.is_alive())
                .count()
        })
    }

    /// Invokes every handle subscribed to `event`, forwarding `args`.
    ///
    /// Subscribers are collected when the emission starts. A subscriber that
    /// is disconnected by an earlier target during the same emission is
    /// skipped, and one connected during it is not called until the next
    /// emission. Returns the number of handles invoked.
    pub fn emit(&self, event: &str, args: &[Variant]) -> usize {
        let subscribers: Vec<CallbackHandle> = {
            let mut events = self.events.borrow_mut();
            let Some(list) = events.get_mut(event) else {
                log::trace!("{} ('{}') emitted '{event}' with no subscribers", self.id, self.label);
                return 0;
            };
            list.retain(WeakCallbackHandle::is_alive);
            list.iter().filter_map(WeakCallbackHandle::upgrade).collect()
        };

        let mut invoked = 0;
        for handle in &subscribers {
            if !self.is_subscribed(event, handle.id()) {
                continue;
            }
            handle.invoke(args);
            invoked += 1;
        }
        log::trace!(
            "{} ('{}') emitted '{event}' to {invoked} subscriber(s)",
            self.id,
            self.label
        );
        invoked
    }

    /// Adds `handle` to `event`. Returns `false` if it was already subscribed.
    pub(crate) fn subscribe(&self, event: &str, handle: &CallbackHandle) -> bool {
        let mut events = self.events.borrow_mut();
        let subscribers = events.entry(event.to_owned()).or_default();
        subscribers.retain(WeakCallbackHandle::is_alive);
        if subscribers.iter().any(|s| s.id() == handle.id()) {
            return false;
        }
        subscribers.push(handle.downgrade());
        true
    }

    /// Removes `id` from `event`. Returns `false` if it was not subscribed.
    pub(crate) fn unsubscribe(&self, event: &str, id: HandleId) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(subscribers) = events.get_mut(event) else {
            return false;
        };
        let Some(index) = subscribers.iter().position(|s| s.id() == id) else {
            return false;
        };
        subscribers.remove(index);
        if subscribers.is_empty() {
            events.remove(event);
        }
        true
    }
}

impl fmt::Debug for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.events.borrow();
        let mut names: Vec<&str> = events.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Signals")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("events", &names)
            .finish()
    }
}

/// A plain event source that cannot own handles.
#[derive(Debug)]
pub struct Emitter {
    signals: Signals,
}

impl Emitter {
    /// Creates an emitter labelled `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            signals: Signals::new(label),
        }
    }
}

impl EventSource for Emitter {
    fn signals(&self) -> &Signals {
        &self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, CallbackHandle) {
        let count = Rc::new(Cell::new(0));
        let handle = CallbackHandle::new_standalone({
            let count = count.clone();
            move |_| count.set(count.get() + 1)
        });
        (count, handle)
    }

    #[test]
    fn subscribe_is_idempotent() {
        let signals = Signals::new("button");
        let (_, handle) = counter();

        assert!(signals.subscribe("pressed", &handle));
        assert!(!signals.subscribe("pressed", &handle));
        assert_eq!(signals.subscriber_count("pressed"), 1);
    }

    #[test]
    fn unsubscribe_missing_is_noop() {
        let signals = Signals::new("button");
        let (_, handle) = counter();

        assert!(!signals.unsubscribe("pressed", handle.id()));
        signals.subscribe("pressed", &handle);
        assert!(signals.unsubscribe("pressed", handle.id()));
        assert!(!signals.is_subscribed("pressed", handle.id()));
    }

    #[test]
    fn events_are_independent() {
        let signals = Signals::new("button");
        let (count, handle) = counter();
        signals.subscribe("pressed", &handle);

        assert_eq!(signals.emit("released", &[]), 0);
        assert_eq!(signals.emit("pressed", &[]), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dead_subscribers_are_pruned() {
        let signals = Signals::new("button");
        let (count, handle) = counter();
        signals.subscribe("pressed", &handle);
        drop(handle);

        assert_eq!(signals.subscriber_count("pressed"), 0);
        assert_eq!(signals.emit("pressed", &[]), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn emit_forwards_arguments_after_binds() {
        let signals = Signals::new("slider");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let handle = CallbackHandle::create(
            {
                let seen = seen.clone();
                move |args: &[Variant]| seen.borrow_mut().extend_from_slice(args)
            },
            vec!["volume".into()],
            true,
        )
        .unwrap();
        signals.subscribe("value_changed", &handle);

        signals.emit("value_changed", &[Variant::Float(0.5)]);
        assert_eq!(
            *seen.borrow(),
            vec![Variant::from("volume"), Variant::Float(0.5)]
        );
    }

    #[test]
    fn subscriber_disconnected_mid_emission_is_skipped() {
        let signals = Rc::new(Signals::new("button"));
        let (count, victim) = counter();
        let killer = CallbackHandle::new_standalone({
            let signals = Rc::downgrade(&signals);
            let victim = victim.id();
            move |_| {
                if let Some(signals) = signals.upgrade() {
                    signals.unsubscribe("pressed", victim);
                }
            }
        });
        signals.subscribe("pressed", &killer);
        signals.subscribe("pressed", &victim);

        assert_eq!(signals.emit("pressed", &[]), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn emitter_is_not_an_owner() {
        let emitter = Emitter::new("timer");
        assert!(emitter.owner_link().is_none());
        assert_eq!(emitter.signals().label(), "timer");
    }
}
