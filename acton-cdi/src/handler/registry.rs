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

//! Process-wide cache of resolved handler tables.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use static_assertions::assert_impl_all;
use tracing::{debug, instrument, trace};

use super::declarations::collect_layers;
use super::{ClassId, ConflictPolicy, HandlerTable, MessageHandlerMethod, RegistryError};
use crate::common::config::CONFIG;
use crate::traits::{HandlerSource, Message};

type ErasedTable = Arc<dyn Any + Send + Sync>;

lazy_static! {
    static ref GLOBAL: MessageHandlerRegistry =
        MessageHandlerRegistry::with_policy(CONFIG.registry.conflict_policy);
}

/// Maps each handler-declaring class to its resolved [`HandlerTable`].
///
/// Tables are built lazily on the first request for a class, then served from the cache
/// for the rest of the process. Every request for a class returns the same `Arc`.
///
/// # Thread Safety
///
/// Backed by [`DashMap`]. Tables are resolved outside of any lock and stored with
/// `entry().or_insert()`, so when two threads race on a new class the first stored table
/// wins and both callers receive it. Resolution is a pure function of the class, so the
/// losing thread's work is simply discarded.
///
/// # Example
///
/// ```rust,ignore
/// let registry = MessageHandlerRegistry::new();
/// let table = registry.handlers_for::<Counter>()?;
/// assert!(table.get_for::<Ping>().is_some());
/// ```
pub struct MessageHandlerRegistry {
    tables: DashMap<TypeId, ErasedTable>,
    policy: ConflictPolicy,
}

assert_impl_all!(MessageHandlerRegistry: Send, Sync);

impl Default for MessageHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandlerRegistry")
            .field("registered_classes", &self.tables.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl MessageHandlerRegistry {
    /// Creates an empty registry with the default [`ConflictPolicy::LastWins`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ConflictPolicy::default())
    }

    /// Creates an empty registry applying `policy` to same-class conflicts.
    #[must_use]
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            tables: DashMap::new(),
            policy,
        }
    }

    /// The process-wide registry, configured from `registry.conflict_policy`.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// The conflict policy this registry applies.
    #[must_use]
    pub const fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Resolves and caches the handler table of `A`. Idempotent.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ConflictingHandlers`] under [`ConflictPolicy::Reject`], or
    /// [`RegistryError::CyclicLineage`] if `A` is its own ancestor; nothing is cached in
    /// either case.
    #[instrument(skip(self), fields(class = std::any::type_name::<A>()), level = "debug")]
    pub fn register<A: HandlerSource>(&self) -> Result<Arc<HandlerTable<A>>, RegistryError> {
        let class = TypeId::of::<A>();
        let cached = self.tables.get(&class).map(|entry| Arc::clone(entry.value()));
        if let Some(cached) = cached {
            trace!("table cache hit");
            return downcast::<A>(cached);
        }

        let layers = collect_layers::<A>()?;
        let table = HandlerTable::resolve(ClassId::of::<A>(), layers, self.policy)?;
        debug!(
            handlers = table.len(),
            conflicts = table.conflicts().len(),
            "resolved handler table"
        );
        let fresh: ErasedTable = Arc::new(table);
        let stored = Arc::clone(self.tables.entry(class).or_insert(fresh).value());
        downcast::<A>(stored)
    }

    /// The full resolved table of `A`, building it on first use.
    ///
    /// # Errors
    ///
    /// See [`MessageHandlerRegistry::register`].
    pub fn handlers_for<A: HandlerSource>(&self) -> Result<Arc<HandlerTable<A>>, RegistryError> {
        self.register::<A>()
    }

    /// The handler `A` uses for exactly `message_type`, if any.
    ///
    /// # Errors
    ///
    /// See [`MessageHandlerRegistry::register`].
    pub fn handler_for<A: HandlerSource>(
        &self,
        message_type: TypeId,
    ) -> Result<Option<Arc<MessageHandlerMethod<A>>>, RegistryError> {
        Ok(self.register::<A>()?.get(message_type).cloned())
    }

    /// The handler `A` uses for exactly `M`, if any.
    ///
    /// # Errors
    ///
    /// See [`MessageHandlerRegistry::register`].
    pub fn handler_for_message<A: HandlerSource, M: Message>(
        &self,
    ) -> Result<Option<Arc<MessageHandlerMethod<A>>>, RegistryError> {
        self.handler_for::<A>(TypeId::of::<M>())
    }

    /// Returns `true` if the table of `A` is already cached.
    #[must_use]
    pub fn contains<A: Any>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<A>())
    }

    /// Number of cached tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if nothing is cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn downcast<A: HandlerSource>(erased: ErasedTable) -> Result<Arc<HandlerTable<A>>, RegistryError> {
    erased
        .downcast::<HandlerTable<A>>()
        .map_err(|_| RegistryError::EntryTypeMismatch {
            class: std::any::type_name::<A>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Declarations;

    #[derive(Debug)]
    struct Ping;

    #[derive(Default)]
    struct Echo;

    impl HandlerSource for Echo {
        fn declare(declarations: &mut Declarations<Self>) {
            declarations.on("on_ping", |_: &mut Self, _: &Ping| {});
        }
    }

    #[test]
    fn second_request_returns_the_cached_table() {
        let registry = MessageHandlerRegistry::new();
        assert!(registry.is_empty());

        let first = registry.handlers_for::<Echo>().unwrap();
        let second = registry.handlers_for::<Echo>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains::<Echo>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn handler_lookup_is_exact() {
        let registry = MessageHandlerRegistry::new();
        assert!(registry.handler_for_message::<Echo, Ping>().unwrap().is_some());
        assert!(registry.handler_for_message::<Echo, u8>().unwrap().is_none());
    }
}
