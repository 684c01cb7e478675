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

//! Defines the error types returned by handle and subscription operations.

use crate::id::{OwnerId, SourceId};
use thiserror::Error;

/// An error raised synchronously when a handle is configured incorrectly.
///
/// These are never swallowed: the operation that detects the problem returns
/// the error and leaves all registry and subscription state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// More bound arguments were supplied than the arity cap allows.
    #[error("{count} bound arguments exceed the arity cap of {cap}")]
    ArityExceeded {
        /// The number of bound arguments supplied.
        count: usize,
        /// The configured arity cap.
        cap: usize,
    },
    /// The owner passed to `attach` has already been destroyed.
    #[error("cannot attach to {owner}: the owner has been destroyed")]
    DeadOwner {
        /// The identity of the destroyed owner.
        owner: OwnerId,
    },
    /// `connect_and_attach` was called on a source that cannot own handles.
    #[error("event source '{label}' ({source_id}) cannot own callback handles")]
    NotAnOwner {
        /// The identity of the offending source.
        source_id: SourceId,
        /// The source's diagnostic label.
        label: String,
    },
}
