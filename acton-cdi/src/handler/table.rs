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

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::declarations::Layer;
use super::{ClassId, MessageHandlerMethod, RegistryError};
use crate::traits::Message;

/// What to do when one class declares two handlers for the same message type.
///
/// Overrides across the lineage are never conflicts; the more derived class simply wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the later declaration, record the conflict and log it at `warn`.
    #[default]
    LastWins,
    /// Fail registration with [`RegistryError::ConflictingHandlers`].
    Reject,
}

/// Two handlers declared by the same class for the same message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConflict {
    /// The class carrying both declarations.
    pub class: ClassId,
    /// The contested message type.
    pub message_type: &'static str,
    /// The handler declared first, which was dropped under [`ConflictPolicy::LastWins`].
    pub discarded: &'static str,
    /// The handler declared later.
    pub kept: &'static str,
}

impl fmt::Display for HandlerConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} declares both `{}` and `{}` for {}",
            self.class, self.discarded, self.kept, self.message_type
        )
    }
}

/// The resolved handlers of one class: at most one per concrete message type.
///
/// Built once per class by the [`MessageHandlerRegistry`](super::MessageHandlerRegistry)
/// and never mutated afterwards.
pub struct HandlerTable<A> {
    class: ClassId,
    handlers: HashMap<TypeId, Arc<MessageHandlerMethod<A>>>,
    conflicts: Vec<HandlerConflict>,
}

impl<A: 'static> HandlerTable<A> {
    /// Folds `layers` root to leaf; a later layer's handler replaces an earlier one.
    pub(crate) fn resolve(
        class: ClassId,
        layers: Vec<Layer<A>>,
        policy: ConflictPolicy,
    ) -> Result<Self, RegistryError> {
        let mut handlers = HashMap::new();
        let mut conflicts = Vec::new();

        for layer in layers {
            let mut declared_here: HashMap<TypeId, &'static str> = HashMap::new();
            for method in layer.methods {
                if let Some(discarded) =
                    declared_here.insert(method.message_type(), method.handler_name())
                {
                    let conflict = HandlerConflict {
                        class: layer.class,
                        message_type: method.message_type_name(),
                        discarded,
                        kept: method.handler_name(),
                    };
                    match policy {
                        ConflictPolicy::Reject => {
                            return Err(RegistryError::ConflictingHandlers(conflict));
                        }
                        ConflictPolicy::LastWins => {
                            warn!(%conflict, "conflicting handlers; keeping the later one");
                            conflicts.push(conflict);
                        }
                    }
                }
                trace!(
                    class = class.name(),
                    handler = %method.identity(),
                    message_type = method.message_type_name(),
                    "resolved"
                );
                handlers.insert(method.message_type(), Arc::new(method));
            }
        }

        Ok(Self {
            class,
            handlers,
            conflicts,
        })
    }
}

impl<A> HandlerTable<A> {
    /// The class this table belongs to.
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    /// The handler for exactly `message_type`, if any.
    #[must_use]
    pub fn get(&self, message_type: TypeId) -> Option<&Arc<MessageHandlerMethod<A>>> {
        self.handlers.get(&message_type)
    }

    /// The handler for exactly `M`, if any.
    #[must_use]
    pub fn get_for<M: Message>(&self) -> Option<&Arc<MessageHandlerMethod<A>>> {
        self.get(TypeId::of::<M>())
    }

    /// Returns `true` if a handler exists for exactly `message_type`.
    #[must_use]
    pub fn contains(&self, message_type: TypeId) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Number of handled message types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the class handles nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterates over the resolved handlers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MessageHandlerMethod<A>>> {
        self.handlers.values()
    }

    /// Same-class conflicts detected while resolving.
    #[must_use]
    pub fn conflicts(&self) -> &[HandlerConflict] {
        &self.conflicts
    }

    /// Returns `true` if any conflict was detected.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

impl<A> fmt::Debug for HandlerTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("class", &self.class.name())
            .field("handlers", &self.handlers.values().collect::<Vec<_>>())
            .field("conflicts", &self.conflicts)
            .finish()
    }
}
