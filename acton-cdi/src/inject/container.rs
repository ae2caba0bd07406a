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

//! A small, thread-safe dependency container.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{instrument, trace};

use super::{DependencyKey, Qualifier, ResolutionError};
use crate::common::{BoxError, Shared};
use crate::traits::Resolver;

/// Type alias for a provider producing a fresh value per resolution.
type ProviderFn = Arc<dyn Fn(&Container) -> Result<Shared, BoxError> + Send + Sync>;

#[derive(Clone)]
enum Binding {
    Instance(Shared),
    Provider(ProviderFn),
}

struct Registration {
    qualifiers: Vec<Qualifier>,
    binding: Binding,
}

/// Container mapping types (and qualifiers) to shared instances or providers.
///
/// # Resolution rules
///
/// * With qualifiers: candidates are the registrations carrying every requested qualifier.
/// * Without qualifiers: the unqualified registration wins; otherwise a single
///   qualified registration is used.
///
/// No candidate yields [`ResolutionError::NotFound`]; several yield
/// [`ResolutionError::Ambiguous`]. Registering the same type with the same qualifier set
/// again replaces the earlier registration.
///
/// # Thread Safety
///
/// Backed by [`DashMap`]; registration and resolution may happen concurrently. Providers
/// are invoked outside of any internal lock, so they may resolve further dependencies.
#[derive(Default)]
pub struct Container {
    bindings: DashMap<TypeId, Vec<Registration>>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registered_types", &self.bindings.len())
            .finish()
    }
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shared instance of `T` under the default (unqualified) key.
    pub fn register<T>(&self, value: T) -> &Self
    where
        T: Any + Send + Sync,
    {
        self.insert::<T>(Vec::new(), Binding::Instance(Arc::new(value)))
    }

    /// Registers a shared instance of `T` carrying `qualifiers`.
    pub fn register_qualified<T>(
        &self,
        value: T,
        qualifiers: impl IntoIterator<Item = Qualifier>,
    ) -> &Self
    where
        T: Any + Send + Sync,
    {
        self.insert::<T>(
            qualifiers.into_iter().collect(),
            Binding::Instance(Arc::new(value)),
        )
    }

    /// Registers a shared instance of `T` with a single name qualifier.
    pub fn register_named<T>(&self, name: &'static str, value: T) -> &Self
    where
        T: Any + Send + Sync,
    {
        self.register_qualified(value, [Qualifier::named(name)])
    }

    /// Registers an existing `Arc<T>` under the default key.
    pub fn register_arc<T>(&self, value: Arc<T>) -> &Self
    where
        T: Any + Send + Sync,
    {
        let shared: Shared = value;
        self.insert::<T>(Vec::new(), Binding::Instance(shared))
    }

    /// Registers a provider called on every resolution of `T` (dependent scope).
    ///
    /// The provider receives the container and may resolve its own dependencies.
    pub fn register_provider<T, E, F>(&self, provider: F) -> &Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
    {
        let provider: ProviderFn = Arc::new(move |container: &Container| {
            provider(container)
                .map(|value| Arc::new(value) as Shared)
                .map_err(Into::into)
        });
        self.insert::<T>(Vec::new(), Binding::Provider(provider))
    }

    /// Resolves an unqualified `T`.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve<T>(&self) -> Result<Arc<T>, ResolutionError>
    where
        T: Any + Send + Sync,
    {
        resolve_typed::<T>(self, &DependencyKey::of::<T>())
    }

    /// Resolves a `T` carrying every qualifier in `qualifiers`.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve_qualified<T>(&self, qualifiers: &[Qualifier]) -> Result<Arc<T>, ResolutionError>
    where
        T: Any + Send + Sync,
    {
        let key = DependencyKey::of::<T>().qualified(qualifiers.iter().cloned());
        resolve_typed::<T>(self, &key)
    }

    /// Returns `true` if anything is registered for `T`.
    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.bindings
            .get(&TypeId::of::<T>())
            .is_some_and(|registrations| !registrations.is_empty())
    }

    fn insert<T: Any>(&self, mut qualifiers: Vec<Qualifier>, binding: Binding) -> &Self {
        qualifiers.sort();
        qualifiers.dedup();
        trace!(
            type_name = std::any::type_name::<T>(),
            qualifiers = ?qualifiers,
            "registering bean"
        );
        let mut registrations = self.bindings.entry(TypeId::of::<T>()).or_default();
        registrations.retain(|existing| existing.qualifiers != qualifiers);
        registrations.push(Registration {
            qualifiers,
            binding,
        });
        self
    }

    fn select(&self, key: &DependencyKey) -> Result<Binding, ResolutionError> {
        let not_found = || ResolutionError::NotFound(key.clone());
        let registrations = self.bindings.get(&key.type_id()).ok_or_else(not_found)?;

        if key.qualifiers().is_empty() {
            if let Some(default) = registrations.iter().find(|r| r.qualifiers.is_empty()) {
                return Ok(default.binding.clone());
            }
            return match registrations.as_slice() {
                [] => Err(not_found()),
                [only] => Ok(only.binding.clone()),
                many => Err(ResolutionError::Ambiguous {
                    key: key.clone(),
                    candidates: many.len(),
                }),
            };
        }

        let candidates: Vec<&Registration> = registrations
            .iter()
            .filter(|r| key.qualifiers().iter().all(|q| r.qualifiers.contains(q)))
            .collect();
        match candidates.as_slice() {
            [] => Err(not_found()),
            [only] => Ok(only.binding.clone()),
            many => Err(ResolutionError::Ambiguous {
                key: key.clone(),
                candidates: many.len(),
            }),
        }
    }
}

impl Resolver for Container {
    #[instrument(skip(self, key), fields(key = %key), level = "trace")]
    fn resolve(&self, key: &DependencyKey) -> Result<Shared, ResolutionError> {
        // `select` clones the binding out, so the shard guard is gone before a provider runs.
        match self.select(key)? {
            Binding::Instance(shared) => Ok(shared),
            Binding::Provider(provider) => {
                provider(self).map_err(|source| ResolutionError::Provider {
                    key: key.clone(),
                    source,
                })
            }
        }
    }
}

/// Resolves `key` through `resolver` and downcasts the result to `T`.
pub(crate) fn resolve_typed<T>(
    resolver: &dyn Resolver,
    key: &DependencyKey,
) -> Result<Arc<T>, ResolutionError>
where
    T: Any + Send + Sync,
{
    resolver
        .resolve(key)?
        .downcast::<T>()
        .map_err(|_| ResolutionError::Provider {
            key: key.clone(),
            source: format!("resolver returned a value that is not {}", key.type_name()).into(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Datasource(&'static str);

    #[test]
    fn unqualified_registration_wins_without_qualifiers() {
        let container = Container::new();
        container
            .register(Datasource("default"))
            .register_named("replica", Datasource("replica"));

        assert_eq!(container.resolve::<Datasource>().unwrap().0, "default");
        assert_eq!(
            container
                .resolve_qualified::<Datasource>(&[Qualifier::named("replica")])
                .unwrap()
                .0,
            "replica"
        );
    }

    #[test]
    fn several_qualified_candidates_are_ambiguous() {
        let container = Container::new();
        container
            .register_named("a", Datasource("a"))
            .register_named("b", Datasource("b"));

        let err = container.resolve::<Datasource>().unwrap_err();
        assert!(matches!(err, ResolutionError::Ambiguous { candidates: 2, .. }));
    }

    #[test]
    fn single_qualified_candidate_serves_unqualified_request() {
        let container = Container::new();
        container.register_named("only", Datasource("only"));
        assert_eq!(container.resolve::<Datasource>().unwrap().0, "only");
    }

    #[test]
    fn missing_type_is_not_found() {
        let container = Container::new();
        let err = container.resolve::<Datasource>().unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound(_)));
        assert!(err.to_string().contains("Datasource"));
    }

    #[test]
    fn provider_runs_per_resolution_and_can_resolve_dependencies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let container = Container::new();
        container.register(Datasource("db"));
        container.register_provider::<String, ResolutionError, _>(move |c| {
            counted.fetch_add(1, Ordering::SeqCst);
            let ds = c.resolve::<Datasource>()?;
            Ok(format!("repo@{}", ds.0))
        });

        assert_eq!(*container.resolve::<String>().unwrap(), "repo@db");
        assert_eq!(*container.resolve::<String>().unwrap(), "repo@db");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn re_registering_replaces_same_qualifier_set() {
        let container = Container::new();
        container.register(Datasource("old")).register(Datasource("new"));
        assert_eq!(container.resolve::<Datasource>().unwrap().0, "new");
    }
}
