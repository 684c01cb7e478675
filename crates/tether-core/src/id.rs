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

//! Identity types for handles, owners, and event sources.
//!
//! Identity is never derived from the value a type carries: every handle,
//! owner, and source draws a fresh number from its own counter at creation,
//! and two objects compare equal only if they are the same object.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident, $counter:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        static $counter: AtomicU64 = AtomicU64::new(1);

        impl $name {
            pub(crate) fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Returns the raw numeric value of this identifier.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

identity!(
    /// Identity of a [`CallbackHandle`](crate::CallbackHandle).
    HandleId,
    NEXT_HANDLE_ID,
    "handle"
);

identity!(
    /// Identity of an [`Owner`](crate::Owner).
    OwnerId,
    NEXT_OWNER_ID,
    "owner"
);

identity!(
    /// Identity of an event source's [`Signals`](crate::Signals) table.
    SourceId,
    NEXT_SOURCE_ID,
    "source"
);
