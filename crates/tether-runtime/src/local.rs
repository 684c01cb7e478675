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

//! Single-threaded cooperative scheduling on a tokio `LocalSet`.
//!
//! Handles, owners, and operations are `!Send`, so everything here runs on
//! one thread. Tasks only yield at `.await` points; between them every
//! operation runs to completion.

use crate::operation::Operation;
use anyhow::Context;
use std::future::Future;
use std::rc::Rc;

/// Runs `future` to completion on a fresh current-thread runtime.
///
/// The future may use [`spawn_operation`] and `tokio::task::spawn_local`.
pub fn run_local<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build the cooperative runtime")?;
    let local = tokio::task::LocalSet::new();
    log::trace!("Cooperative runtime started.");
    Ok(local.block_on(&runtime, future))
}

/// Spawns `future` as a local task and returns an [`Operation`] that
/// completes when the task finishes.
///
/// # Panics
///
/// Panics if called outside a `LocalSet` context, as
/// `tokio::task::spawn_local` does.
pub fn spawn_operation<F>(label: impl Into<String>, future: F) -> Rc<Operation>
where
    F: Future<Output = ()> + 'static,
{
    let operation = Rc::new(Operation::new(label));
    let tracked = operation.clone();
    tokio::task::spawn_local(async move {
        future.await;
        tracked.complete();
    });
    operation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_local_returns_the_output() {
        let value = run_local(async { 7 }).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn spawned_operation_completes_with_its_task() {
        run_local(async {
            let op = spawn_operation("tick", async {
                tokio::task::yield_now().await;
            });
            assert!(!op.is_completed());

            while !op.is_completed() {
                tokio::task::yield_now().await;
            }
        })
        .unwrap();
    }
}
