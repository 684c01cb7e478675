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

use super::LifecycleDefect;
use std::cell::RefCell;

thread_local! {
    static SINKS: RefCell<Vec<flume::Sender<LifecycleDefect>>> = const { RefCell::new(Vec::new()) };
}

/// Receives the lifecycle defects reported on the current thread.
///
/// Creating a bus registers its sending end with the thread's reporting sink.
/// The registration lives exactly as long as the bus: once the bus is dropped
/// its receiver disconnects and the sink forgets it on the next report.
#[derive(Debug)]
pub struct DefectBus {
    receiver: flume::Receiver<LifecycleDefect>,
}

impl DefectBus {
    /// Creates a bus subscribed to this thread's defect reports.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        SINKS.with(|sinks| sinks.borrow_mut().push(sender));
        log::trace!("DefectBus subscribed to lifecycle reports.");
        Self { receiver }
    }

    /// Returns every defect received so far, in report order.
    pub fn drain(&self) -> Vec<LifecycleDefect> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of defects waiting to be drained.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no defect is waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Returns a reference to the receiving end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<LifecycleDefect> {
        &self.receiver
    }
}

impl Default for DefectBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends a copy of `defect` to every live bus on this thread.
///
/// Handles can be dropped while thread-locals are being torn down, so a sink
/// that is already gone is skipped silently.
pub(super) fn publish(defect: &LifecycleDefect) {
    let _ = SINKS.try_with(|sinks| {
        let Ok(mut sinks) = sinks.try_borrow_mut() else {
            return;
        };
        sinks.retain(|sender| sender.send(defect.clone()).is_ok());
    });
}
