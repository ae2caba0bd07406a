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

//! Declarative construction recipes for [`Injectable`](crate::traits::Injectable) types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::arguments::BoundValue;
use super::plan::ParameterPlan;
use super::{ArgumentError, Arguments, ConstructionFailure, ParameterList, Qualifier};
use crate::common::BoxError;

type ConstructorBody<T> = Box<dyn Fn(&mut Arguments) -> Result<T, BoxError> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, BoundValue) -> Result<(), ArgumentError> + Send + Sync>;
type Hook<T> = Box<dyn Fn(&mut T) -> Result<(), BoxError> + Send + Sync>;

/// One way to build a `T`: an ordered parameter list and a body that reads the bound
/// arguments back in the same order.
///
/// ```rust,ignore
/// Constructor::new(|args: &mut Arguments| {
///     Ok::<_, ArgumentError>(Session {
///         clock: args.take()?,
///         user: args.take()?,
///     })
/// })
/// .inject::<Clock>("clock")
/// .assisted::<String>("user")
/// ```
pub struct Constructor<T> {
    plan: ParameterPlan,
    eligible: bool,
    body: ConstructorBody<T>,
}

impl<T: 'static> Constructor<T> {
    /// Wraps a constructor body. Declare its parameters with the builder methods.
    pub fn new<E, F>(body: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn(&mut Arguments) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            plan: ParameterPlan::default(),
            eligible: false,
            body: Box::new(move |arguments| body(arguments).map_err(Into::into)),
        }
    }

    /// Declares the next parameter as a container-resolved `Arc<P>`.
    #[must_use]
    pub fn inject<P: Any + Send + Sync>(mut self, name: &'static str) -> Self {
        self.plan.push_container::<P>(name, Vec::new());
        self
    }

    /// Declares the next parameter as a container-resolved `Arc<P>` with qualifiers.
    #[must_use]
    pub fn inject_qualified<P: Any + Send + Sync>(
        mut self,
        name: &'static str,
        qualifiers: impl IntoIterator<Item = Qualifier>,
    ) -> Self {
        self.plan
            .push_container::<P>(name, qualifiers.into_iter().collect());
        self
    }

    /// Shorthand for [`Constructor::inject_qualified`] with one name qualifier.
    #[must_use]
    pub fn inject_named<P: Any + Send + Sync>(
        self,
        name: &'static str,
        qualifier: &'static str,
    ) -> Self {
        self.inject_qualified::<P>(name, [Qualifier::named(qualifier)])
    }

    /// Declares the next parameter as assisted: the caller supplies a `V`.
    #[must_use]
    pub fn assisted<V: Any + Send>(mut self, name: &'static str) -> Self {
        self.plan.push_assisted::<V>(name);
        self
    }

    /// Flags the most recently declared parameter for validation.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.plan.mark_last_validated();
        self
    }

    /// Marks this constructor as the one to use when several are declared.
    #[must_use]
    pub fn eligible(mut self) -> Self {
        self.eligible = true;
        self
    }

    /// Returns `true` if marked with [`Constructor::eligible`].
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// The declared parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterList {
        self.plan.parameters()
    }

    pub(crate) const fn plan(&self) -> &ParameterPlan {
        &self.plan
    }

    pub(crate) fn call(&self, arguments: &mut Arguments) -> Result<T, BoxError> {
        (self.body)(arguments)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("plan", &self.plan)
            .field("eligible", &self.eligible)
            .finish_non_exhaustive()
    }
}

/// Fields injected after construction, each with its own setter.
///
/// Field assisted values come from their own list, independent of the constructor's.
pub struct FieldPlan<T> {
    plan: ParameterPlan,
    setters: Vec<Setter<T>>,
}

impl<T: 'static> Default for FieldPlan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FieldPlan<T> {
    /// An empty field plan.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plan: ParameterPlan::default(),
            setters: Vec::new(),
        }
    }

    /// Declares a container-resolved field.
    #[must_use]
    pub fn inject<P, F>(self, name: &'static str, assign: F) -> Self
    where
        P: Any + Send + Sync,
        F: Fn(&mut T, Arc<P>) + Send + Sync + 'static,
    {
        self.inject_qualified::<P, F>(name, [], assign)
    }

    /// Declares a container-resolved field with qualifiers.
    #[must_use]
    pub fn inject_qualified<P, F>(
        mut self,
        name: &'static str,
        qualifiers: impl IntoIterator<Item = Qualifier>,
        assign: F,
    ) -> Self
    where
        P: Any + Send + Sync,
        F: Fn(&mut T, Arc<P>) + Send + Sync + 'static,
    {
        self.plan
            .push_container::<P>(name, qualifiers.into_iter().collect());
        self.setters.push(setter::<T, Arc<P>, F>(self.setters.len(), assign));
        self
    }

    /// Declares an assisted field, filled from the field-level assisted list.
    #[must_use]
    pub fn assisted<V, F>(mut self, name: &'static str, assign: F) -> Self
    where
        V: Any + Send,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.plan.push_assisted::<V>(name);
        self.setters.push(setter::<T, V, F>(self.setters.len(), assign));
        self
    }

    /// Flags the most recently declared field for validation.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.plan.mark_last_validated();
        self
    }

    /// The declared fields.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterList {
        self.plan.parameters()
    }

    pub(crate) const fn plan(&self) -> &ParameterPlan {
        &self.plan
    }

    pub(crate) fn apply(
        &self,
        target: &mut T,
        bound: Vec<BoundValue>,
    ) -> Result<(), ConstructionFailure> {
        for ((value, setter), descriptor) in bound
            .into_iter()
            .zip(&self.setters)
            .zip(self.plan.parameters())
        {
            setter(target, value).map_err(|source| ConstructionFailure::FieldAssignment {
                field: descriptor.name(),
                source,
            })?;
        }
        Ok(())
    }
}

fn setter<T, V, F>(position: usize, assign: F) -> Setter<T>
where
    T: 'static,
    V: Any,
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    Box::new(move |target: &mut T, bound: BoundValue| {
        let found = bound.type_name;
        let value = bound.value.downcast::<V>().map_err(|_| ArgumentError {
            position,
            expected: std::any::type_name::<V>(),
            found: Some(found),
        })?;
        assign(target, *value);
        Ok(())
    })
}

impl<T> fmt::Debug for FieldPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPlan")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Everything the binder needs to build a `T`: constructors, fields and post-construct
/// hooks.
///
/// # Constructor selection
///
/// A single declared constructor is always used. With several, exactly one must be
/// marked [`Constructor::eligible`].
pub struct Blueprint<T> {
    constructors: Vec<Constructor<T>>,
    fields: FieldPlan<T>,
    hooks: Vec<(&'static str, Hook<T>)>,
}

impl<T: 'static> Default for Blueprint<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Blueprint<T> {
    /// An empty blueprint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            fields: FieldPlan::new(),
            hooks: Vec::new(),
        }
    }

    /// Adds a constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Sets the field plan.
    #[must_use]
    pub fn fields(mut self, fields: FieldPlan<T>) -> Self {
        self.fields = fields;
        self
    }

    /// Adds a hook run after field injection, in declaration order.
    #[must_use]
    pub fn post_construct<E, F>(mut self, name: &'static str, hook: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn(&mut T) -> Result<(), E> + Send + Sync + 'static,
    {
        self.hooks
            .push((name, Box::new(move |target| hook(target).map_err(Into::into))));
        self
    }

    /// Number of declared constructors.
    #[must_use]
    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    pub(crate) fn select_constructor(&self) -> Result<&Constructor<T>, ConstructionFailure> {
        if let [only] = self.constructors.as_slice() {
            return Ok(only);
        }
        let mut eligible = self.constructors.iter().filter(|c| c.is_eligible());
        match (eligible.next(), eligible.count()) {
            (Some(chosen), 0) => Ok(chosen),
            (Some(_), others) => Err(ConstructionFailure::AmbiguousConstructors(others + 1)),
            (None, _) => Err(ConstructionFailure::NoEligibleConstructor),
        }
    }

    pub(crate) const fn field_plan(&self) -> &FieldPlan<T> {
        &self.fields
    }

    pub(crate) fn run_hooks(&self, target: &mut T) -> Result<(), ConstructionFailure> {
        for (hook, run) in &self.hooks {
            run(target).map_err(|source| ConstructionFailure::PostConstruct {
                hook: *hook,
                source,
            })?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Blueprint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("constructors", &self.constructors)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    fn ctor() -> Constructor<Widget> {
        Constructor::new(|_: &mut Arguments| Ok::<_, BoxError>(Widget))
    }

    #[test]
    fn single_constructor_needs_no_marker() {
        let blueprint = Blueprint::new().constructor(ctor());
        assert!(blueprint.select_constructor().is_ok());
    }

    #[test]
    fn several_constructors_need_exactly_one_eligible() {
        let none = Blueprint::new().constructor(ctor()).constructor(ctor());
        assert!(matches!(
            none.select_constructor(),
            Err(ConstructionFailure::NoEligibleConstructor)
        ));

        let one = Blueprint::new()
            .constructor(ctor())
            .constructor(ctor().assisted::<u8>("tag").eligible());
        let chosen = one.select_constructor().unwrap();
        assert_eq!(chosen.parameters().len(), 1);

        let two = Blueprint::new()
            .constructor(ctor().eligible())
            .constructor(ctor().eligible());
        assert!(matches!(
            two.select_constructor(),
            Err(ConstructionFailure::AmbiguousConstructors(2))
        ));
    }

    #[test]
    fn empty_blueprint_has_no_eligible_constructor() {
        let blueprint: Blueprint<Widget> = Blueprint::new();
        assert!(matches!(
            blueprint.select_constructor(),
            Err(ConstructionFailure::NoEligibleConstructor)
        ));
    }
}
