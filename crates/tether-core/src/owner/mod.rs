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

//! Owners: entities whose lifetime callback handles can be bound to.
//!
//! An [`Owner`] carries its own registry of attached handles. Handles refer
//! back to their owner through a [`WeakOwner`], so attaching a handle never
//! extends the owner's life. When the owner is dropped, its teardown releases
//! the registry and clears the link of every handle that outlives it.

mod registry;

pub(crate) use self::registry::OwnerRegistry;

use crate::handle::CallbackHandle;
use crate::id::OwnerId;
use crate::signal::{EventSource, Signals};
use crate::variant::Variant;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// State shared between an owner and the weak links pointing at it.
pub(crate) struct OwnerState {
    pub(crate) id: OwnerId,
    pub(crate) registry: RefCell<OwnerRegistry>,
    torn_down: Cell<bool>,
}

/// An entity that can hold callback handles for the duration of its life.
///
/// `Owner` is deliberately not `Clone`: dropping it is the owner's
/// destruction. Other parts of the program refer to it through
/// [`WeakOwner`]. An owner is also an [`EventSource`], so handles can be
/// connected to its events and attached to it in a single step with
/// [`CallbackHandle::connect_and_attach`].
pub struct Owner {
    state: Rc<OwnerState>,
    name: String,
    signals: Signals,
}

impl Owner {
    /// Creates a new owner with an empty registry.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let signals = Signals::new(name.clone());
        let state = Rc::new(OwnerState {
            id: OwnerId::next(),
            registry: RefCell::new(OwnerRegistry::default()),
            torn_down: Cell::new(false),
        });
        log::trace!("Created {} ('{}')", state.id, name);
        Self {
            state,
            name,
            signals,
        }
    }

    /// Returns this owner's identity.
    pub fn id(&self) -> OwnerId {
        self.state.id
    }

    /// Returns the diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a non-owning reference to this owner.
    pub fn downgrade(&self) -> WeakOwner {
        WeakOwner {
            id: self.state.id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Returns the number of handles currently attached.
    pub fn handle_count(&self) -> usize {
        self.state.registry.borrow().len()
    }

    /// Returns `true` if `handle` is attached to this owner.
    pub fn contains(&self, handle: &CallbackHandle) -> bool {
        self.state.registry.borrow().contains(handle.id())
    }

    /// Returns a snapshot of the attached handles, in creation order.
    ///
    /// The snapshot is detached from the registry: attaching or detaching
    /// handles while walking it is safe.
    pub fn handles(&self) -> Vec<CallbackHandle> {
        self.state.registry.borrow().snapshot()
    }

    /// Invokes every attached handle with `args`.
    ///
    /// Iteration runs over a snapshot. A handle that a previous target
    /// detached from this owner is skipped; a handle attached during the walk
    /// is not visited. Returns the number of handles invoked.
    pub fn invoke_all(&self, args: &[Variant]) -> usize {
        let mut invoked = 0;
        for handle in self.handles() {
            if handle.owner_id() != Some(self.id()) {
                continue;
            }
            handle.invoke(args);
            invoked += 1;
        }
        invoked
    }

    /// Detaches every attached handle. Returns how many were detached.
    pub fn detach_all(&self) -> usize {
        let mut detached = 0;
        for handle in self.handles() {
            if handle.owner_id() == Some(self.id()) {
                handle.detach();
                detached += 1;
            }
        }
        detached
    }
}

impl EventSource for Owner {
    fn signals(&self) -> &Signals {
        &self.signals
    }

    fn owner_link(&self) -> Option<WeakOwner> {
        Some(self.downgrade())
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.state.id)
            .field("name", &self.name)
            .field("handles", &self.handle_count())
            .finish()
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        // Released handles are dropped while the owner still counts as alive,
        // so handles retired together with their owner pass the lifecycle
        // check. Targets may re-attach during the release, hence the loop.
        loop {
            let released = self.state.registry.borrow_mut().drain();
            if released.is_empty() {
                break;
            }
            log::debug!(
                "Tearing down {} ('{}'): releasing {} handle(s)",
                self.state.id,
                self.name,
                released.len()
            );
            for handle in released {
                let weak = handle.downgrade();
                drop(handle);
                if let Some(survivor) = weak.upgrade() {
                    survivor.clear_owner_link(self.state.id);
                }
            }
        }
        self.state.torn_down.set(true);
    }
}

/// A non-owning reference to an [`Owner`].
///
/// Equality is identity: two `WeakOwner`s are equal when they refer to the
/// same owner, whether or not it is still alive.
#[derive(Clone)]
pub struct WeakOwner {
    id: OwnerId,
    state: Weak<OwnerState>,
}

impl WeakOwner {
    /// Returns the identity of the referenced owner.
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Returns `true` while the referenced owner has not been destroyed.
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<OwnerState>> {
        self.state
            .upgrade()
            .filter(|state| !state.torn_down.get())
    }
}

impl From<&Owner> for WeakOwner {
    fn from(owner: &Owner) -> Self {
        owner.downgrade()
    }
}

impl From<&WeakOwner> for WeakOwner {
    fn from(owner: &WeakOwner) -> Self {
        owner.clone()
    }
}

impl PartialEq for WeakOwner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WeakOwner {}

impl fmt::Debug for WeakOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakOwner")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::WeakCallbackHandle;
    use crate::lifecycle::DefectBus;
    use std::cell::Cell;

    #[test]
    fn weak_owner_goes_stale_on_drop() {
        let owner = Owner::new("node");
        let weak = owner.downgrade();
        assert!(weak.is_alive());

        drop(owner);
        assert!(!weak.is_alive());
    }

    #[test]
    fn teardown_retires_handles_without_defects() {
        let bus = DefectBus::new();
        let owner = Owner::new("node");
        let handle = CallbackHandle::new(|_| {});
        handle.attach(&owner).unwrap();
        drop(handle);
        assert_eq!(owner.handle_count(), 1);

        drop(owner);
        assert!(bus.is_empty());
    }

    #[test]
    fn teardown_clears_link_of_surviving_handles() {
        let owner = Owner::new("node");
        let handle = CallbackHandle::new_standalone(|_| {});
        handle.attach(&owner).unwrap();

        drop(owner);
        assert!(!handle.is_attached());
        assert!(handle.owner().is_none());
    }

    #[test]
    fn invoke_all_tolerates_self_detach() {
        let owner = Owner::new("node");
        let calls = Rc::new(Cell::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let calls = calls.clone();
            let me: Rc<RefCell<Option<WeakCallbackHandle>>> = Rc::new(RefCell::new(None));
            let handle = CallbackHandle::new_standalone({
                let me = me.clone();
                move |_| {
                    calls.set(calls.get() + 1);
                    if let Some(me) = me.borrow().as_ref().and_then(WeakCallbackHandle::upgrade) {
                        me.detach();
                    }
                }
            });
            *me.borrow_mut() = Some(handle.downgrade());
            handle.attach(&owner).unwrap();
            handles.push(handle);
        }

        assert_eq!(owner.invoke_all(&[]), 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(owner.handle_count(), 0);
        assert!(handles.iter().all(|h| !h.is_attached()));
    }

    #[test]
    fn invoke_all_skips_sibling_detached_mid_walk() {
        let owner = Owner::new("node");
        let calls = Rc::new(Cell::new(0));
        let sibling: Rc<RefCell<Option<WeakCallbackHandle>>> = Rc::new(RefCell::new(None));

        // Created first, so visited first.
        let first = CallbackHandle::new_standalone({
            let sibling = sibling.clone();
            move |_| {
                if let Some(s) = sibling.borrow().as_ref().and_then(WeakCallbackHandle::upgrade) {
                    s.detach();
                }
            }
        });
        let second = CallbackHandle::new_standalone({
            let calls = calls.clone();
            move |_| calls.set(calls.get() + 1)
        });
        *sibling.borrow_mut() = Some(second.downgrade());
        first.attach(&owner).unwrap();
        second.attach(&owner).unwrap();

        assert_eq!(owner.invoke_all(&[]), 1);
        assert_eq!(calls.get(), 0);
        assert!(!owner.contains(&second));
        assert!(owner.contains(&first));
    }

    #[test]
    fn detach_all_empties_registry() {
        let owner = Owner::new("node");
        let a = CallbackHandle::new_standalone(|_| {});
        let b = CallbackHandle::new_standalone(|_| {});
        a.attach(&owner).unwrap();
        b.attach(&owner).unwrap();

        assert_eq!(owner.detach_all(), 2);
        assert_eq!(owner.handle_count(), 0);
        assert!(!a.is_attached());
    }
}
