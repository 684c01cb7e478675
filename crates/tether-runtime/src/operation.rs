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

//! In-flight deferred operations.

use std::cell::Cell;
use std::fmt;
use tether_core::{EventSource, Signals, SourceId};

/// The event an [`Operation`] emits when it finishes.
pub const COMPLETED: &str = "completed";

/// A unit of deferred work that announces its completion as an event.
///
/// Anything that finishes later (a spawned task, an animation, a network
/// round-trip) can be represented by an `Operation`; whoever drives the work
/// calls [`complete`](Self::complete) when it is done, and listeners
/// subscribed to [`COMPLETED`] are invoked.
pub struct Operation {
    signals: Signals,
    completed: Cell<bool>,
}

impl Operation {
    /// Creates a pending operation labelled `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            signals: Signals::new(label),
            completed: Cell::new(false),
        }
    }

    /// Returns the identity of this operation.
    pub fn id(&self) -> SourceId {
        self.signals.id()
    }

    /// Returns the diagnostic label.
    pub fn label(&self) -> &str {
        self.signals.label()
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    /// Marks the operation as finished and emits [`COMPLETED`].
    ///
    /// Only the first call emits. Returns `false` if the operation had
    /// already completed.
    pub fn complete(&self) -> bool {
        if self.completed.replace(true) {
            return false;
        }
        let notified = self.signals.emit(COMPLETED, &[]);
        log::debug!(
            "Operation '{}' ({}) completed, {notified} listener(s) notified",
            self.label(),
            self.id()
        );
        true
    }
}

impl EventSource for Operation {
    fn signals(&self) -> &Signals {
        &self.signals
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("completed", &self.is_completed())
            .finish()
    }
}
