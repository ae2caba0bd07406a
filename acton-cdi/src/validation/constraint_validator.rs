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

//! Type-keyed constraint validation.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use super::Violations;
use crate::traits::{Validate, Validator};

/// Type alias for the constraint function stored per type.
type ConstraintFn = Arc<dyn Fn(&dyn Any) -> Violations + Send + Sync>;

/// A validator that accepts every value. Used when the host supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _value: &dyn Any) -> Violations {
        Violations::none()
    }
}

/// Validator that runs the [`Validate`] implementation registered for the value's
/// concrete type.
///
/// Values of unregistered types pass. Registration and validation may happen
/// concurrently.
///
/// # Example
///
/// ```rust,ignore
/// let validator = ConstraintValidator::new()
///     .with::<PlaceOrder>()
///     .with::<CancelOrder>();
/// assert!(validator.validate(&PlaceOrder { quantity: 0 }).len() == 1);
/// ```
#[derive(Default)]
pub struct ConstraintValidator {
    constraints: DashMap<TypeId, ConstraintFn>,
}

impl std::fmt::Debug for ConstraintValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintValidator")
            .field("registered_types", &self.constraints.len())
            .finish()
    }
}

impl ConstraintValidator {
    /// Creates a validator with no registered types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constraints of `T`. Re-registering replaces nothing of substance.
    pub fn register<T>(&self)
    where
        T: Validate + Any,
    {
        let constraint: ConstraintFn = Arc::new(|value: &dyn Any| {
            value
                .downcast_ref::<T>()
                .map_or_else(Violations::none, Validate::validate)
        });
        trace!(type_name = std::any::type_name::<T>(), "registering constraints");
        self.constraints.insert(TypeId::of::<T>(), constraint);
    }

    /// Registers the constraints of `T`, returning `self` for chaining.
    #[must_use]
    pub fn with<T>(self) -> Self
    where
        T: Validate + Any,
    {
        self.register::<T>();
        self
    }

    /// Returns `true` if constraints are registered for `T`.
    #[must_use]
    pub fn is_registered<T: Any>(&self) -> bool {
        self.constraints.contains_key(&TypeId::of::<T>())
    }
}

impl Validator for ConstraintValidator {
    fn validate(&self, value: &dyn Any) -> Violations {
        // Clone the function out so user constraints never run under a shard lock.
        let constraint = self
            .constraints
            .get(&value.type_id())
            .map(|entry| Arc::clone(entry.value()));
        constraint.map_or_else(Violations::none, |constraint| constraint(value))
    }
}
