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

//! Configuration for callback handles.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// The default limit on the combined number of bound and forwarded arguments.
pub const DEFAULT_ARITY_CAP: usize = 10;

/// Tunables applied when a [`CallbackHandle`](crate::CallbackHandle) is created.
///
/// Missing fields fall back to their defaults when deserializing, so an empty
/// JSON object is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Maximum number of argument slots a target receives. Bound arguments
    /// beyond this limit are rejected at creation; forwarded arguments beyond
    /// it are dropped at invocation.
    pub arity_cap: usize,
}

impl CallbackConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse callback configuration")?;
        log::debug!("Loaded callback configuration: {config:?}");
        Ok(config)
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            arity_cap: DEFAULT_ARITY_CAP,
        }
    }
}
