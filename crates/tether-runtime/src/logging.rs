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

//! Logger bootstrap.
//!
//! Everything in the workspace logs through the `log` facade. This module
//! installs `env_logger` as the backend once per process.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::sync::Once;

/// Logger configuration.
///
/// `default_filter` follows the `env_logger` filter syntax and applies when
/// `RUST_LOG` is not set.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is absent (e.g. `"info"`).
    pub default_filter: String,
    /// Per-module overrides applied on top of the filter.
    pub module_filters: Vec<(String, LevelFilter)>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            module_filters: Vec::new(),
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Later calls are ignored, as is a logger installed by someone else first.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder =
            Builder::from_env(Env::default().default_filter_or(config.default_filter.as_str()));
        for (module, level) in &config.module_filters {
            builder.filter_module(module, *level);
        }
        if builder.try_init().is_err() {
            log::debug!("A global logger was already installed.");
            return;
        }
        log::debug!("Logging initialized.");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig {
            default_filter: "warn".into(),
            module_filters: vec![("tether_core".into(), LevelFilter::Trace)],
        };
        init_logging(&config);
        init_logging(&LoggingConfig::default());
        log::trace!("still alive");
    }
}
