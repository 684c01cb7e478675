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

//! The callback handle: a deferred call bound to an owner's lifetime.

use crate::config::{CallbackConfig, DEFAULT_ARITY_CAP};
use crate::error::ConfigurationError;
use crate::id::{HandleId, OwnerId};
use crate::lifecycle;
use crate::owner::WeakOwner;
use crate::variant::Variant;
use std::cell::RefCell;
use std::fmt;
use std::panic::Location;
use std::rc::{Rc, Weak};

/// The signature every callback target implements.
pub type Target = dyn Fn(&[Variant]);

/// Where a handle sits with respect to owner attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    /// No live owner; the handle was created standalone.
    UnattachedStandalone,
    /// No live owner; dropping the handle in this state reports a defect.
    UnattachedNonStandalone,
    /// Registered with a live owner.
    Attached,
}

struct HandleInner {
    id: HandleId,
    target: Box<Target>,
    binds: Vec<Variant>,
    arity_cap: usize,
    standalone: bool,
    owner: RefCell<Option<WeakOwner>>,
    origin: &'static Location<'static>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        let link = self.owner.get_mut().take();
        let owner_alive = link.as_ref().is_some_and(WeakOwner::is_alive);
        let last_owner = link.map(|owner| owner.id()).filter(|_| !owner_alive);
        lifecycle::check_on_drop(
            self.id,
            self.origin,
            self.standalone,
            owner_alive,
            last_owner,
        );
    }
}

/// A reference-counted handle to a deferred call.
///
/// A handle wraps a target closure together with its bound arguments. Cloning
/// a handle is cheap and yields another reference to the same handle; the
/// handle is destroyed when its last strong reference is released. An owner
/// keeps a strong reference to each handle attached to it, while the handle
/// only keeps a [`WeakOwner`] back-reference.
///
/// Handles are single-threaded (`!Send`). Every operation runs to completion
/// and never holds an internal borrow while the target runs, so targets may
/// freely attach, detach, connect, or disconnect any handle, including their
/// own.
#[derive(Clone)]
pub struct CallbackHandle {
    inner: Rc<HandleInner>,
}

impl CallbackHandle {
    /// Creates a non-standalone handle without bound arguments.
    #[track_caller]
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&[Variant]) + 'static,
    {
        Self::build(
            Box::new(target),
            Vec::new(),
            false,
            DEFAULT_ARITY_CAP,
            Location::caller(),
        )
    }

    /// Creates a standalone handle without bound arguments.
    ///
    /// Standalone handles are managed outside the owner discipline and never
    /// report lifecycle defects.
    #[track_caller]
    pub fn new_standalone<F>(target: F) -> Self
    where
        F: Fn(&[Variant]) + 'static,
    {
        Self::build(
            Box::new(target),
            Vec::new(),
            true,
            DEFAULT_ARITY_CAP,
            Location::caller(),
        )
    }

    /// Creates a handle with bound arguments using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ArityExceeded`] if `binds` has more
    /// entries than the default arity cap.
    #[track_caller]
    pub fn create<F>(
        target: F,
        binds: Vec<Variant>,
        standalone: bool,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&[Variant]) + 'static,
    {
        Self::create_with(&CallbackConfig::default(), target, binds, standalone)
    }

    /// Creates a handle with bound arguments under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ArityExceeded`] if `binds` has more
    /// entries than `config.arity_cap`.
    #[track_caller]
    pub fn create_with<F>(
        config: &CallbackConfig,
        target: F,
        binds: Vec<Variant>,
        standalone: bool,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&[Variant]) + 'static,
    {
        let origin = Location::caller();
        if binds.len() > config.arity_cap {
            return Err(ConfigurationError::ArityExceeded {
                count: binds.len(),
                cap: config.arity_cap,
            });
        }
        Ok(Self::build(
            Box::new(target),
            binds,
            standalone,
            config.arity_cap,
            origin,
        ))
    }

    fn build(
        target: Box<Target>,
        binds: Vec<Variant>,
        standalone: bool,
        arity_cap: usize,
        origin: &'static Location<'static>,
    ) -> Self {
        let id = HandleId::next();
        log::trace!("Created {id} at {origin} (standalone: {standalone})");
        Self {
            inner: Rc::new(HandleInner {
                id,
                target,
                binds,
                arity_cap,
                standalone,
                owner: RefCell::new(None),
                origin,
            }),
        }
    }

    /// Returns this handle's identity.
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// Returns the pre-bound arguments.
    pub fn binds(&self) -> &[Variant] {
        &self.inner.binds
    }

    /// Returns the arity cap this handle was created with.
    pub fn arity_cap(&self) -> usize {
        self.inner.arity_cap
    }

    /// Returns `true` if the handle was created standalone.
    pub fn is_standalone(&self) -> bool {
        self.inner.standalone
    }

    /// Returns where the handle was created.
    pub fn origin(&self) -> &'static Location<'static> {
        self.inner.origin
    }

    /// Returns the current owner, if it is still alive.
    pub fn owner(&self) -> Option<WeakOwner> {
        self.inner
            .owner
            .borrow()
            .as_ref()
            .filter(|owner| owner.is_alive())
            .cloned()
    }

    /// Returns the identity of the current owner, if it is still alive.
    pub fn owner_id(&self) -> Option<OwnerId> {
        self.owner().map(|owner| owner.id())
    }

    /// Returns `true` if the handle is attached to a live owner.
    pub fn is_attached(&self) -> bool {
        self.owner().is_some()
    }

    /// Returns the handle's position in the attachment state machine.
    pub fn state(&self) -> AttachmentState {
        if self.is_attached() {
            AttachmentState::Attached
        } else if self.inner.standalone {
            AttachmentState::UnattachedStandalone
        } else {
            AttachmentState::UnattachedNonStandalone
        }
    }

    /// Binds this handle to `owner`'s lifetime.
    ///
    /// Attaching to the current owner is a no-op. Otherwise the handle leaves
    /// its previous owner's registry (if that owner is still alive) and joins
    /// the new one. The new owner is validated before anything changes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DeadOwner`] if `owner` has been
    /// destroyed; the handle keeps its previous attachment.
    pub fn attach(&self, owner: impl Into<WeakOwner>) -> Result<&Self, ConfigurationError> {
        let owner = owner.into();
        if self.owner_id() == Some(owner.id()) {
            return Ok(self);
        }
        let Some(state) = owner.upgrade() else {
            return Err(ConfigurationError::DeadOwner { owner: owner.id() });
        };

        let previous = self.release_owner();
        *self.inner.owner.borrow_mut() = Some(owner);
        state.registry.borrow_mut().register(self.clone());
        drop(previous);

        log::trace!("{} attached to {}", self.inner.id, state.id);
        Ok(self)
    }

    /// Unbinds this handle from its owner, if any.
    ///
    /// A handle whose owner already died simply forgets the stale link.
    pub fn detach(&self) -> &Self {
        if let Some(released) = self.release_owner() {
            log::trace!("{} detached", released.id());
        }
        self
    }

    /// Calls the target with the bound arguments followed by `args`.
    ///
    /// Forwarded arguments that do not fit under the arity cap are dropped.
    pub fn invoke(&self, args: &[Variant]) {
        let binds = &self.inner.binds;
        let room = self.inner.arity_cap.saturating_sub(binds.len());
        if args.len() > room {
            log::warn!(
                "{}: dropping {} forwarded argument(s) beyond the arity cap of {}",
                self.inner.id,
                args.len() - room,
                self.inner.arity_cap
            );
        }

        let mut argv = Vec::with_capacity(binds.len() + args.len().min(room));
        argv.extend_from_slice(binds);
        argv.extend(args.iter().take(room).cloned());
        (self.inner.target)(&argv);
    }

    /// Returns a non-owning reference to this handle.
    pub fn downgrade(&self) -> WeakCallbackHandle {
        WeakCallbackHandle {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if both values refer to the same handle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Clears the owner link if it still names `owner`. Used by owner teardown.
    pub(crate) fn clear_owner_link(&self, owner: OwnerId) {
        let mut link = self.inner.owner.borrow_mut();
        if link.as_ref().map(WeakOwner::id) == Some(owner) {
            *link = None;
        }
    }

    /// Takes the owner link and removes this handle from that owner's registry
    /// when the owner is still alive. Returns the registry's reference, which
    /// the caller drops once no borrow is held.
    fn release_owner(&self) -> Option<CallbackHandle> {
        let link = self.inner.owner.borrow_mut().take()?;
        let state = link.upgrade()?;
        let released = state.registry.borrow_mut().unregister(self.inner.id);
        released
    }
}

impl PartialEq for CallbackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for CallbackHandle {}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.inner.id)
            .field("binds", &self.inner.binds)
            .field("standalone", &self.inner.standalone)
            .field("owner", &self.owner_id())
            .field("origin", &self.inner.origin)
            .finish()
    }
}

/// A non-owning reference to a [`CallbackHandle`].
///
/// Event sources store their subscribers this way, so a subscription never
/// keeps a handle alive.
#[derive(Clone)]
pub struct WeakCallbackHandle {
    id: HandleId,
    inner: Weak<HandleInner>,
}

impl WeakCallbackHandle {
    /// Returns the identity of the referenced handle.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Attempts to obtain a strong reference.
    pub fn upgrade(&self) -> Option<CallbackHandle> {
        self.inner.upgrade().map(|inner| CallbackHandle { inner })
    }

    /// Returns `true` while the referenced handle has not been destroyed.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakCallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCallbackHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DefectBus;
    use crate::owner::Owner;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<Vec<Variant>>>>, impl Fn(&[Variant]) + 'static) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        (calls, move |args: &[Variant]| sink.borrow_mut().push(args.to_vec()))
    }

    #[test]
    fn create_rejects_too_many_binds() {
        let binds = (0..11).map(Variant::from).collect();
        let err = CallbackHandle::create(|_| {}, binds, true).unwrap_err();
        assert_eq!(err, ConfigurationError::ArityExceeded { count: 11, cap: 10 });
    }

    #[test]
    fn create_accepts_binds_at_the_cap() {
        let binds: Vec<Variant> = (0..10).map(Variant::from).collect();
        let handle = CallbackHandle::create(|_| {}, binds, true).unwrap();
        assert_eq!(handle.binds().len(), 10);
    }

    #[test]
    fn custom_cap_applies() {
        let config = CallbackConfig { arity_cap: 1 };
        let result = CallbackHandle::create_with(&config, |_| {}, vec![1.into(), 2.into()], true);
        assert!(matches!(
            result,
            Err(ConfigurationError::ArityExceeded { count: 2, cap: 1 })
        ));
    }

    #[test]
    fn invoke_puts_binds_first() {
        let (calls, target) = recorder();
        let handle = CallbackHandle::create(target, vec!["bound".into()], true).unwrap();

        handle.invoke(&["extra".into()]);

        assert_eq!(
            *calls.borrow(),
            vec![vec![Variant::from("bound"), Variant::from("extra")]]
        );
    }

    #[test]
    fn invoke_drops_arguments_past_the_cap() {
        let (calls, target) = recorder();
        let config = CallbackConfig { arity_cap: 3 };
        let handle = CallbackHandle::create_with(&config, target, vec![0.into()], true).unwrap();

        handle.invoke(&[1.into(), 2.into(), 3.into(), 4.into()]);

        let expected: Vec<Variant> = (0..3).map(Variant::from).collect();
        assert_eq!(*calls.borrow(), vec![expected]);
    }

    #[test]
    fn initial_state_follows_standalone_flag() {
        let bus = DefectBus::new();
        let standalone = CallbackHandle::new_standalone(|_| {});
        let owned = CallbackHandle::new(|_| {});
        assert_eq!(standalone.state(), AttachmentState::UnattachedStandalone);
        assert_eq!(owned.state(), AttachmentState::UnattachedNonStandalone);

        drop(owned);
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn attach_moves_between_owners() {
        let a = Owner::new("a");
        let b = Owner::new("b");
        let handle = CallbackHandle::new_standalone(|_| {});

        handle.attach(&a).unwrap();
        assert!(a.contains(&handle));

        handle.attach(&b).unwrap();
        assert!(!a.contains(&handle));
        assert!(b.contains(&handle));
        assert_eq!(handle.owner_id(), Some(b.id()));
    }

    #[test]
    fn attach_same_owner_is_noop() {
        let owner = Owner::new("a");
        let handle = CallbackHandle::new_standalone(|_| {});

        handle.attach(&owner).unwrap();
        handle.attach(&owner).unwrap();
        assert_eq!(owner.handle_count(), 1);
        assert_eq!(handle.state(), AttachmentState::Attached);
    }

    #[test]
    fn attach_to_dead_owner_fails_and_keeps_previous() {
        let live = Owner::new("live");
        let dead = Owner::new("dead");
        let dead_ref = dead.downgrade();
        drop(dead);

        let handle = CallbackHandle::new_standalone(|_| {});
        handle.attach(&live).unwrap();

        let err = handle.attach(&dead_ref).unwrap_err();
        assert_eq!(err, ConfigurationError::DeadOwner { owner: dead_ref.id() });
        assert!(live.contains(&handle));
    }

    #[test]
    fn detach_restores_original_flag_state() {
        let owner = Owner::new("a");
        let handle = CallbackHandle::new_standalone(|_| {});
        handle.attach(&owner).unwrap();

        handle.detach();
        assert_eq!(handle.state(), AttachmentState::UnattachedStandalone);
        assert_eq!(owner.handle_count(), 0);

        // Detaching twice is harmless.
        handle.detach();
        assert_eq!(handle.state(), AttachmentState::UnattachedStandalone);
    }

    #[test]
    fn detach_after_owner_death_forgets_stale_link() {
        let owner = Owner::new("a");
        let handle = CallbackHandle::new_standalone(|_| {});
        handle.attach(&owner).unwrap();
        drop(owner);

        handle.detach();
        assert!(!handle.is_attached());
    }

    #[test]
    fn target_can_detach_its_own_handle() {
        let owner = Owner::new("a");
        let slot: Rc<RefCell<Option<WeakCallbackHandle>>> = Rc::new(RefCell::new(None));
        let handle = CallbackHandle::new_standalone({
            let slot = slot.clone();
            move |_| {
                if let Some(me) = slot.borrow().as_ref().and_then(WeakCallbackHandle::upgrade) {
                    me.detach();
                }
            }
        });
        *slot.borrow_mut() = Some(handle.downgrade());
        handle.attach(&owner).unwrap();

        handle.invoke(&[]);
        assert!(!handle.is_attached());
        assert_eq!(owner.handle_count(), 0);
    }

    #[test]
    fn weak_handle_tracks_liveness() {
        let handle = CallbackHandle::new_standalone(|_| {});
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some_and(|h| h.ptr_eq(&handle)));

        drop(handle);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }
}
