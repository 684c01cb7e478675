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

//! # Tether Core
//!
//! Callback handles whose lifetime is bound to an owner they do not own.
//!
//! A [`CallbackHandle`] wraps a target closure and its bound arguments. It can
//! be attached to one [`Owner`] at a time, which keeps it alive through a
//! registry that dies with the owner, and connected to any number of
//! [`EventSource`]s with idempotent connect/disconnect semantics. A handle
//! destroyed while resting without a live owner, and not created standalone,
//! is reported as a [`LifecycleDefect`].
//!
//! ```rust
//! use tether_core::{CallbackHandle, Emitter, EventSource, Owner};
//!
//! let node = Owner::new("node");
//! let button = Emitter::new("button");
//!
//! let handle = CallbackHandle::create(
//!     |args| println!("{}", args[0]),
//!     vec!["hello".into()],
//!     false,
//! )
//! .unwrap();
//! handle.attach(&node).unwrap();
//! handle.connect(&button, "pressed");
//!
//! assert_eq!(button.emit("pressed", &[]), 1);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handle;
pub mod id;
pub mod lifecycle;
pub mod owner;
pub mod signal;
pub mod variant;

pub use config::{CallbackConfig, DEFAULT_ARITY_CAP};
pub use error::ConfigurationError;
pub use handle::{AttachmentState, CallbackHandle, WeakCallbackHandle};
pub use id::{HandleId, OwnerId, SourceId};
pub use lifecycle::{DefectBus, LifecycleDefect};
pub use owner::{Owner, WeakOwner};
pub use signal::{Emitter, EventSource, Signals};
pub use variant::Variant;
