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
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use super::plan::BindContext;
use super::{Arguments, AssistedArgs, BeanConstructionError, BindingScope, ConstructionFailure};
use crate::common::config::CONFIG;
use crate::traits::{Injectable, Resolver, Validator};
use crate::validation::AcceptAll;

/// Builds [`Injectable`] beans, mixing container-resolved and caller-supplied values.
///
/// Each constructor parameter and each field is bound from exactly one source, decided
/// when the blueprint was declared: assisted slots read the caller's list through a
/// cursor, everything else comes from the [`Resolver`]. Constructor and field lists have
/// independent cursors.
///
/// ```rust,ignore
/// let container = Container::new();
/// container.register(Clock::default());
///
/// let session: Session = ConstructorBinder::new(&container)
///     .create_with(assisted![String::from("alice")])?;
/// ```
pub struct ConstructorBinder<'r> {
    resolver: &'r dyn Resolver,
    validator: Arc<dyn Validator>,
    validate_parameters: bool,
}

impl<'r> ConstructorBinder<'r> {
    /// A binder over `resolver`, accepting every value until a validator is supplied.
    ///
    /// Parameter validation follows `binder.validate_parameters` from [`CONFIG`].
    #[must_use]
    pub fn new(resolver: &'r dyn Resolver) -> Self {
        Self {
            resolver,
            validator: Arc::new(AcceptAll),
            validate_parameters: CONFIG.binder.validate_parameters,
        }
    }

    /// Uses `validator` for parameters flagged as validated.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Uses a shared validator for parameters flagged as validated.
    #[must_use]
    pub fn shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Overrides the configured `binder.validate_parameters` switch.
    #[must_use]
    pub fn validate_parameters(mut self, enabled: bool) -> Self {
        self.validate_parameters = enabled;
        self
    }

    /// Builds a `T` with no field-level assisted values.
    ///
    /// # Errors
    ///
    /// See [`ConstructorBinder::create`].
    pub fn create_with<T: Injectable>(
        &self,
        constructor_args: AssistedArgs,
    ) -> Result<T, BeanConstructionError> {
        self.create(constructor_args, AssistedArgs::new())
    }

    /// Builds a `T` from its [`Blueprint`](super::Blueprint).
    ///
    /// Runs, in order: constructor selection, constructor argument binding, the
    /// constructor body, field binding and assignment, post-construct hooks. Both
    /// assisted lists are checked for arity before the container is touched.
    ///
    /// # Errors
    ///
    /// [`BeanConstructionError`] naming the bean and the failing step. No partially built
    /// instance escapes.
    #[instrument(
        skip(self, constructor_args, field_args),
        fields(bean = std::any::type_name::<T>()),
        level = "debug"
    )]
    pub fn create<T: Injectable>(
        &self,
        constructor_args: AssistedArgs,
        field_args: AssistedArgs,
    ) -> Result<T, BeanConstructionError> {
        self.build::<T>(constructor_args, field_args)
            .map_err(|cause| {
                debug!(error = %cause, "bean construction failed");
                BeanConstructionError {
                    bean: std::any::type_name::<T>(),
                    cause,
                }
            })
    }

    fn build<T: Injectable>(
        &self,
        constructor_args: AssistedArgs,
        field_args: AssistedArgs,
    ) -> Result<T, ConstructionFailure> {
        let blueprint = T::blueprint();
        let constructor = blueprint.select_constructor()?;
        let fields = blueprint.field_plan();

        constructor
            .parameters()
            .check_assisted_arity(BindingScope::Constructor, constructor_args.len())?;
        fields
            .parameters()
            .check_assisted_arity(BindingScope::Fields, field_args.len())?;

        let context = BindContext {
            resolver: self.resolver,
            validator: self.validator.as_ref(),
            validate_parameters: self.validate_parameters,
        };

        let bound = constructor
            .plan()
            .bind(&context, BindingScope::Constructor, constructor_args)?;
        let mut arguments = Arguments::new(bound);
        let mut bean = constructor
            .call(&mut arguments)
            .map_err(ConstructionFailure::Constructor)?;
        trace!(unread = arguments.remaining(), "constructor returned");

        let bound = fields
            .plan()
            .bind(&context, BindingScope::Fields, field_args)?;
        fields.apply(&mut bean, bound)?;

        blueprint.run_hooks(&mut bean)?;
        Ok(bean)
    }
}

impl std::fmt::Debug for ConstructorBinder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorBinder")
            .field("validate_parameters", &self.validate_parameters)
            .finish_non_exhaustive()
    }
}
