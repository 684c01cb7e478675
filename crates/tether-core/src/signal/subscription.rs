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

//! Connect/disconnect operations on callback handles.

use super::EventSource;
use crate::error::ConfigurationError;
use crate::handle::CallbackHandle;

impl CallbackHandle {
    /// Subscribes this handle to `event` on `source`.
    ///
    /// Connecting an already connected triple leaves exactly one
    /// subscription. Returns `true` if a new subscription was created.
    pub fn connect<S>(&self, source: &S, event: &str) -> bool
    where
        S: EventSource + ?Sized,
    {
        let signals = source.signals();
        let added = signals.subscribe(event, self);
        if added {
            log::trace!(
                "{} connected to '{event}' on {} ('{}')",
                self.id(),
                signals.id(),
                signals.label()
            );
        }
        added
    }

    /// Subscribes this handle to `event` on `source` and attaches it to
    /// `source` as its owner.
    ///
    /// The source is validated before any state changes, so a failed call
    /// leaves no subscription behind. Returns `true` if a new subscription was
    /// created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NotAnOwner`] if `source` cannot own
    /// handles, or [`ConfigurationError::DeadOwner`] if its owner identity no
    /// longer refers to a live owner.
    pub fn connect_and_attach<S>(&self, source: &S, event: &str) -> Result<bool, ConfigurationError>
    where
        S: EventSource + ?Sized,
    {
        let signals = source.signals();
        let owner = source
            .owner_link()
            .ok_or_else(|| ConfigurationError::NotAnOwner {
                source_id: signals.id(),
                label: signals.label().to_owned(),
            })?;
        if !owner.is_alive() {
            return Err(ConfigurationError::DeadOwner { owner: owner.id() });
        }

        let added = self.connect(source, event);
        self.attach(owner)?;
        Ok(added)
    }

    /// Removes this handle's subscription to `event` on `source`.
    ///
    /// Disconnecting a triple that is not connected is a no-op. Returns
    /// `true` if a subscription was removed.
    pub fn disconnect<S>(&self, source: &S, event: &str) -> bool
    where
        S: EventSource + ?Sized,
    {
        let signals = source.signals();
        let removed = signals.unsubscribe(event, self.id());
        if removed {
            log::trace!(
                "{} disconnected from '{event}' on {} ('{}')",
                self.id(),
                signals.id(),
                signals.label()
            );
        }
        removed
    }

    /// Returns `true` if this handle is subscribed to `event` on `source`.
    pub fn is_connected<S>(&self, source: &S, event: &str) -> bool
    where
        S: EventSource + ?Sized,
    {
        source.signals().is_subscribed(event, self.id())
    }
}
