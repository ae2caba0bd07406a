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

use std::fmt;

use super::{HandlerConflict, HandlerIdentity};
use crate::common::BoxError;
use crate::validation::Violations;

/// Failure to build or fetch a class's handler table.
#[derive(Debug)]
pub enum RegistryError {
    /// A class declares two handlers for one message type under [`ConflictPolicy::Reject`](super::ConflictPolicy::Reject).
    ConflictingHandlers(HandlerConflict),

    /// The class appears among its own ancestors.
    CyclicLineage {
        /// Type names from the registered class down to the repeated ancestor.
        path: Vec<&'static str>,
    },

    /// The cached entry for the class is not a table for that class.
    EntryTypeMismatch {
        /// Type name of the requested class.
        class: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingHandlers(conflict) => {
                write!(f, "Conflicting handlers: {conflict}")
            }
            Self::CyclicLineage { path } => {
                write!(f, "Cyclic handler lineage: {}", path.join(" -> "))
            }
            Self::EntryTypeMismatch { class } => {
                write!(f, "Registry entry for {class} holds a table of another class")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// A handled message could not be processed. Never retried.
#[derive(Debug)]
pub enum DispatchError {
    /// The message violated its constraints; the handler was not invoked.
    Validation {
        /// Type name of the receiving instance.
        class: &'static str,
        /// The handler that would have run.
        handler: HandlerIdentity,
        /// Type name of the message.
        message_type: &'static str,
        /// The violated constraints.
        violations: Violations,
    },

    /// The handler ran and returned an error.
    Invocation {
        /// Type name of the receiving instance.
        class: &'static str,
        /// The handler that failed.
        handler: HandlerIdentity,
        /// Type name of the message.
        message_type: &'static str,
        /// The handler's error.
        source: BoxError,
    },
}

impl DispatchError {
    /// Type name of the receiving instance.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Validation { class, .. } | Self::Invocation { class, .. } => *class,
        }
    }

    /// The handler selected for the message.
    #[must_use]
    pub const fn handler(&self) -> HandlerIdentity {
        match self {
            Self::Validation { handler, .. } | Self::Invocation { handler, .. } => *handler,
        }
    }

    /// Type name of the message.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Validation { message_type, .. } | Self::Invocation { message_type, .. } => {
                *message_type
            }
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation {
                class,
                handler,
                message_type,
                violations,
            } => write!(
                f,
                "{message_type} rejected before {handler} on {class}: {violations}"
            ),
            Self::Invocation {
                class,
                handler,
                message_type,
                source,
            } => write!(
                f,
                "{handler} failed on {class} handling {message_type}: {source}"
            ),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invocation { source, .. } => Some(source.as_ref()),
            Self::Validation { .. } => None,
        }
    }
}
