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

//! Destruction-time leak detection for callback handles.
//!
//! When a handle is dropped, the guard inspects its resting state. A handle
//! that is not standalone and has no live owner at that moment is reported as
//! a [`LifecycleDefect`]. Only the final state matters: a handle that was
//! attached earlier and later detached reports the same defect as one that
//! was never attached at all.
//!
//! Defects are always written to the `log` facade at error level. Every
//! [`DefectBus`] alive on the current thread also receives a copy, which is how
//! tests and tooling observe them.

mod bus;

pub use self::bus::DefectBus;

use crate::id::{HandleId, OwnerId};
use std::fmt;
use std::panic::Location;

/// A diagnostic describing a handle destroyed in an invalid resting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleDefect {
    /// The handle that was destroyed.
    pub handle: HandleId,
    /// Where the handle was created.
    pub origin: &'static Location<'static>,
    /// The owner the handle was last linked to, if its link went stale
    /// rather than being cleared.
    pub last_owner: Option<OwnerId>,
}

impl fmt::Display for LifecycleDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created at {} was destroyed without a live owner and is not standalone",
            self.handle, self.origin
        )?;
        if let Some(owner) = self.last_owner {
            write!(f, " (last owner: {owner})")?;
        }
        Ok(())
    }
}

/// Runs the destruction check for a handle and reports a defect if needed.
///
/// `owner_alive` must reflect the owner link at the moment of destruction.
pub(crate) fn check_on_drop(
    handle: HandleId,
    origin: &'static Location<'static>,
    standalone: bool,
    owner_alive: bool,
    last_owner: Option<OwnerId>,
) {
    if standalone || owner_alive {
        return;
    }
    report(LifecycleDefect {
        handle,
        origin,
        last_owner,
    });
}

fn report(defect: LifecycleDefect) {
    log::error!("Likely leaked callback: {defect}");
    bus::publish(&defect);
}
