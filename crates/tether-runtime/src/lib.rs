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

//! # Tether Runtime
//!
//! The cooperative execution layer on top of `tether-core`: deferred
//! [`Operation`]s that announce their completion, the [`JoinBarrier`] that
//! waits for a set of them, and the helpers that run it all on a
//! single-threaded tokio `LocalSet`.

#![warn(missing_docs)]

pub mod join;
pub mod local;
pub mod logging;
pub mod operation;

pub use join::JoinBarrier;
pub use local::{run_local, spawn_operation};
pub use logging::{init_logging, LoggingConfig};
pub use operation::{Operation, COMPLETED};
