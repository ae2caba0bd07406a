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
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::arguments::BoundValue;
use super::container::resolve_typed;
use super::{
    AssistedArgs, BindingScope, ConstructionFailure, DependencyKey, ParameterDescriptor,
    ParameterList, Qualifier, ResolutionError,
};
use crate::traits::{Resolver, Validator};

type ResolveFn =
    fn(&dyn Resolver, &DependencyKey) -> Result<Box<dyn Any + Send>, ResolutionError>;
type ViewFn = fn(&(dyn Any + Send)) -> Option<&dyn Any>;

#[derive(Clone, Copy)]
enum Source {
    Assisted,
    Container(ResolveFn),
}

/// How one parameter gets its value and how that value is seen by a validator.
#[derive(Clone, Copy)]
struct Slot {
    source: Source,
    view: ViewFn,
    bound_as: &'static str,
}

fn resolve_shared<P>(
    resolver: &dyn Resolver,
    key: &DependencyKey,
) -> Result<Box<dyn Any + Send>, ResolutionError>
where
    P: Any + Send + Sync,
{
    resolve_typed::<P>(resolver, key).map(|shared| Box::new(shared) as Box<dyn Any + Send>)
}

fn view_shared<P: Any + Send + Sync>(value: &(dyn Any + Send)) -> Option<&dyn Any> {
    value
        .downcast_ref::<Arc<P>>()
        .map(|shared| &**shared as &dyn Any)
}

fn view_owned<V: Any + Send>(value: &(dyn Any + Send)) -> Option<&dyn Any> {
    value.downcast_ref::<V>().map(|owned| owned as &dyn Any)
}

/// What a binding pass needs from its caller.
pub(crate) struct BindContext<'a> {
    pub(crate) resolver: &'a dyn Resolver,
    pub(crate) validator: &'a dyn Validator,
    pub(crate) validate_parameters: bool,
}

/// A [`ParameterList`] paired with the per-parameter binding strategy fixed at declaration.
#[derive(Clone, Default)]
pub(crate) struct ParameterPlan {
    parameters: ParameterList,
    slots: Vec<Slot>,
}

impl ParameterPlan {
    pub(crate) fn push_container<P>(&mut self, name: &'static str, qualifiers: Vec<Qualifier>)
    where
        P: Any + Send + Sync,
    {
        let descriptor =
            ParameterDescriptor::of::<P>(self.slots.len(), name).with_qualifiers(qualifiers);
        self.parameters.push(descriptor, false);
        self.slots.push(Slot {
            source: Source::Container(resolve_shared::<P>),
            view: view_shared::<P>,
            bound_as: std::any::type_name::<Arc<P>>(),
        });
    }

    pub(crate) fn push_assisted<V: Any + Send>(&mut self, name: &'static str) {
        let descriptor = ParameterDescriptor::of::<V>(self.slots.len(), name);
        self.parameters.push(descriptor, true);
        self.slots.push(Slot {
            source: Source::Assisted,
            view: view_owned::<V>,
            bound_as: std::any::type_name::<V>(),
        });
    }

    pub(crate) fn mark_last_validated(&mut self) {
        if let Some(last) = self.slots.len().checked_sub(1) {
            self.parameters.mark_validated(last);
        }
    }

    pub(crate) const fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    /// Walks the parameters in order and produces the argument vector.
    ///
    /// Assisted slots consume `supplied` through a single cursor; container slots go to the
    /// resolver. The arity check runs before anything is resolved.
    pub(crate) fn bind(
        &self,
        context: &BindContext<'_>,
        scope: BindingScope,
        supplied: AssistedArgs,
    ) -> Result<Vec<BoundValue>, ConstructionFailure> {
        let supplied_count = supplied.len();
        self.parameters.check_assisted_arity(scope, supplied_count)?;

        let mut cursor = supplied.into_iter();
        let mut bound = Vec::with_capacity(self.slots.len());
        for (descriptor, slot) in self.parameters.iter().zip(&self.slots) {
            let value = match slot.source {
                Source::Assisted => {
                    let argument =
                        cursor
                            .next()
                            .ok_or(ConstructionFailure::ArgumentCountMismatch {
                                scope,
                                expected: self.parameters.assisted_count(),
                                supplied: supplied_count,
                            })?;
                    if argument.type_id() != descriptor.type_id() {
                        return Err(ConstructionFailure::ArgumentTypeMismatch {
                            scope,
                            position: descriptor.position(),
                            expected: descriptor.type_name(),
                            found: argument.type_name(),
                        });
                    }
                    argument.into_value()
                }
                Source::Container(resolve) => {
                    let key = DependencyKey::for_parameter(descriptor);
                    resolve(context.resolver, &key).map_err(|source| {
                        ConstructionFailure::Resolution {
                            scope,
                            parameter: descriptor.name(),
                            source,
                        }
                    })?
                }
            };

            if context.validate_parameters && self.parameters.is_validated(descriptor.position())
            {
                if let Some(view) = (slot.view)(&*value) {
                    let violations = context.validator.validate(view);
                    if !violations.is_empty() {
                        return Err(ConstructionFailure::ParameterValidation {
                            scope,
                            parameter: descriptor.name(),
                            violations,
                        });
                    }
                }
            }

            trace!(%scope, parameter = descriptor.name(), bound_as = slot.bound_as, "bound");
            bound.push(BoundValue {
                type_name: slot.bound_as,
                value,
            });
        }
        Ok(bound)
    }
}

impl fmt::Debug for ParameterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterPlan")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
