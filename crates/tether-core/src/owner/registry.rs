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

use crate::handle::CallbackHandle;
use crate::id::HandleId;
use std::collections::btree_map::{BTreeMap, Entry};

/// The set of handles currently attached to one owner.
///
/// The registry holds the only owner-side strong references to its handles.
/// It is mutated exclusively through `attach`/`detach` and the owner's
/// teardown, and it is never borrowed while a target runs or a handle drops:
/// callers take a snapshot or move the removed handles out first.
#[derive(Default)]
pub(crate) struct OwnerRegistry {
    handles: BTreeMap<HandleId, CallbackHandle>,
}

impl OwnerRegistry {
    /// Inserts `handle`. Returns `false` if it was already registered.
    pub(crate) fn register(&mut self, handle: CallbackHandle) -> bool {
        match self.handles.entry(handle.id()) {
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Removes the handle with the given id and hands back the registry's
    /// reference so the caller can release it outside the borrow.
    pub(crate) fn unregister(&mut self, id: HandleId) -> Option<CallbackHandle> {
        self.handles.remove(&id)
    }

    pub(crate) fn contains(&self, id: HandleId) -> bool {
        self.handles.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Clones the current membership, ordered by handle creation.
    pub(crate) fn snapshot(&self) -> Vec<CallbackHandle> {
        self.handles.values().cloned().collect()
    }

    /// Empties the registry, returning every reference it held.
    pub(crate) fn drain(&mut self) -> Vec<CallbackHandle> {
        std::mem::take(&mut self.handles).into_values().collect()
    }
}
