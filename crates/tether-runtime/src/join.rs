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

//! Waiting for a set of operations to finish.

use crate::operation::{Operation, COMPLETED};
use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;
use std::rc::Rc;
use tether_core::{CallbackHandle, SourceId};

/// Suspends a cooperative task until every operation in a set has completed.
///
/// The barrier subscribes a standalone listener to each operation's
/// [`COMPLETED`] event; each listener removes its operation from the working
/// set, and the last one wakes the waiting task. There is no timeout: an
/// operation that never completes blocks the join forever.
pub struct JoinBarrier;

impl JoinBarrier {
    /// Returns a future that resolves once all `operations` have completed.
    ///
    /// Listeners are registered when `join` is called, not when the future is
    /// first polled, so completions that happen in between are not missed.
    /// Operations that already completed are not waited for; if nothing is
    /// left pending the future resolves on its first poll. Dropping the future
    /// releases the listeners.
    pub fn join<I>(operations: I) -> impl Future<Output = ()>
    where
        I: IntoIterator<Item = Rc<Operation>>,
    {
        let pending: Rc<RefCell<HashSet<SourceId>>> = Rc::default();
        let (done_tx, done_rx) = flume::bounded::<()>(1);
        let mut listeners = Vec::new();

        for operation in operations {
            let id = operation.id();
            if operation.is_completed() || !pending.borrow_mut().insert(id) {
                continue;
            }

            let listener = CallbackHandle::new_standalone({
                let pending = pending.clone();
                let done_tx = done_tx.clone();
                move |_| {
                    let mut pending = pending.borrow_mut();
                    if pending.remove(&id) && pending.is_empty() {
                        let _ = done_tx.try_send(());
                    }
                }
            });
            listener.connect(&*operation, COMPLETED);
            listeners.push(listener);
        }

        let waiting = listeners.len();
        log::debug!("JoinBarrier waiting on {waiting} operation(s)");

        async move {
            let _listeners = listeners;
            if waiting == 0 {
                return;
            }
            if done_rx.recv_async().await.is_err() {
                log::warn!("JoinBarrier lost its completion signal");
                return;
            }
            log::debug!("JoinBarrier released after {waiting} operation(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tether_core::EventSource;
    use tokio::task::{self, LocalSet};

    #[tokio::test]
    async fn empty_join_returns_immediately() {
        JoinBarrier::join(Vec::<Rc<Operation>>::new()).await;
    }

    #[tokio::test]
    async fn completed_operations_are_not_awaited() {
        let op = Rc::new(Operation::new("done"));
        op.complete();
        JoinBarrier::join([op]).await;
    }

    #[tokio::test]
    async fn duplicates_count_once() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let op = Rc::new(Operation::new("dup"));
                let join = JoinBarrier::join([op.clone(), op.clone()]);
                assert_eq!(op.signals().subscriber_count(COMPLETED), 1);

                op.complete();
                join.await;
            })
            .await;
    }

    #[tokio::test]
    async fn listeners_are_released_with_the_future() {
        let op = Rc::new(Operation::new("never"));
        let join = JoinBarrier::join([op.clone()]);
        assert_eq!(op.signals().subscriber_count(COMPLETED), 1);

        drop(join);
        assert_eq!(op.signals().subscriber_count(COMPLETED), 0);
    }

    #[tokio::test]
    async fn waits_for_the_last_completion() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let first = Rc::new(Operation::new("first"));
                let second = Rc::new(Operation::new("second"));
                let resumed = Rc::new(Cell::new(0));

                let join = JoinBarrier::join([first.clone(), second.clone()]);
                let waiter = task::spawn_local({
                    let resumed = resumed.clone();
                    async move {
                        join.await;
                        resumed.set(resumed.get() + 1);
                    }
                });

                first.complete();
                task::yield_now().await;
                assert_eq!(resumed.get(), 0);

                second.complete();
                waiter.await.expect("waiter task panicked");
                assert_eq!(resumed.get(), 1);
            })
            .await;
    }
}
