/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::handler::ConflictPolicy;

/// Configuration for Acton CDI
///
/// This struct contains all configurable values for the registry, the dispatcher,
/// the binder and the mailbox adapter, loaded from a TOML file in an XDG-compliant
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdiConfig {
    /// Handler registry configuration
    pub registry: RegistryConfig,
    /// Dispatch configuration
    pub dispatch: DispatchConfig,
    /// Assisted binder configuration
    pub binder: BinderConfig,
    /// Mailbox adapter configuration
    pub mailbox: MailboxConfig,
}

/// Handler registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// What to do when one type declares two handlers for the same message type
    pub conflict_policy: ConflictPolicy,
}

/// Dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run the validator before handlers whose message parameter is flagged validated
    pub validate_messages: bool,
}

/// Assisted binder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Run the validator over constructor and field values flagged validated
    pub validate_parameters: bool,
}

/// Mailbox adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Default MPSC channel size for a spawned receive loop
    pub capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            validate_messages: true,
        }
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            validate_parameters: true,
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self { capacity: 255 }
    }
}

impl CdiConfig {
    /// Parses a configuration from TOML text. Missing sections and keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed or a value has the wrong type.
    pub fn from_toml_str(config_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(config_str)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `acton/cdi.toml` under `$XDG_CONFIG_HOME` (falling back to
    /// `~/.config`) and the XDG config directories.
    ///
    /// If no configuration file is found, returns the default configuration.
    /// If a configuration file exists but is malformed, logs an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("acton") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("cdi.toml") else {
            info!("No CDI configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading CDI configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded CDI configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: CdiConfig = CdiConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_validation_and_keep_last_handler() {
        let config = CdiConfig::default();
        assert_eq!(config.registry.conflict_policy, ConflictPolicy::LastWins);
        assert!(config.dispatch.validate_messages);
        assert!(config.binder.validate_parameters);
        assert_eq!(config.mailbox.capacity, 255);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let config = CdiConfig::from_toml_str(
            r#"
            [registry]
            conflict_policy = "reject"

            [mailbox]
            capacity = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.conflict_policy, ConflictPolicy::Reject);
        assert_eq!(config.mailbox.capacity, 16);
        assert!(config.dispatch.validate_messages);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = CdiConfig::from_toml_str("[registry]\nconflict_policy = \"first_wins\"\n");
        assert!(result.is_err());
    }
}
