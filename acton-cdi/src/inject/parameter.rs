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

//! Parameter descriptors shared by constructors, field plans and handler declarations.

use std::any::{Any, TypeId};
use std::collections::HashSet;

use super::{BindingScope, ConstructionFailure, Qualifier};

/// Describes one parameter of a callable: its position, name, declared type and qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    position: usize,
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    qualifiers: Vec<Qualifier>,
}

impl ParameterDescriptor {
    /// Describes a parameter of declared type `T` at `position`.
    #[must_use]
    pub fn of<T: Any>(position: usize, name: &'static str) -> Self {
        Self {
            position,
            name,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifiers: Vec::new(),
        }
    }

    /// Attaches qualifier metadata used when the value is resolved from a container.
    #[must_use]
    pub fn with_qualifiers(mut self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.qualifiers = qualifiers.into_iter().collect();
        self
    }

    /// Zero-based position in the parameter list.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Declared parameter (or field) name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the declared type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the declared type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Qualifiers attached to the parameter.
    #[must_use]
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }
}

/// An ordered parameter list plus the indices that are assisted (caller-supplied)
/// and the indices that must pass validation before use.
///
/// Pure data: [`ParameterList::is_assisted`] and [`ParameterList::is_validated`] are
/// constant-time set lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    parameters: Vec<ParameterDescriptor>,
    assisted: HashSet<usize>,
    validated: HashSet<usize>,
}

impl ParameterList {
    /// Builds a list from descriptors and the assisted/validated index sets.
    ///
    /// Indices outside `0..parameters.len()` are ignored.
    #[must_use]
    pub fn new(
        parameters: Vec<ParameterDescriptor>,
        assisted: impl IntoIterator<Item = usize>,
        validated: impl IntoIterator<Item = usize>,
    ) -> Self {
        let len = parameters.len();
        Self {
            parameters,
            assisted: assisted.into_iter().filter(|index| *index < len).collect(),
            validated: validated.into_iter().filter(|index| *index < len).collect(),
        }
    }

    /// Appends a parameter and returns its position.
    pub(crate) fn push(&mut self, descriptor: ParameterDescriptor, assisted: bool) -> usize {
        let position = self.parameters.len();
        self.parameters.push(descriptor);
        if assisted {
            self.assisted.insert(position);
        }
        position
    }

    /// Flags the parameter at `position` for validation.
    pub(crate) fn mark_validated(&mut self, position: usize) {
        if position < self.parameters.len() {
            self.validated.insert(position);
        }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` for a parameterless callable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The descriptor at `position`, if any.
    #[must_use]
    pub fn parameter(&self, position: usize) -> Option<&ParameterDescriptor> {
        self.parameters.get(position)
    }

    /// Iterates over the descriptors in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterDescriptor> {
        self.parameters.iter()
    }

    /// Returns `true` if the parameter at `position` is supplied by the caller.
    #[must_use]
    pub fn is_assisted(&self, position: usize) -> bool {
        self.assisted.contains(&position)
    }

    /// Returns `true` if the parameter at `position` must pass validation before use.
    #[must_use]
    pub fn is_validated(&self, position: usize) -> bool {
        self.validated.contains(&position)
    }

    /// Number of assisted parameters.
    #[must_use]
    pub fn assisted_count(&self) -> usize {
        self.assisted.len()
    }

    /// Number of parameters resolved from the container.
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.parameters.len() - self.assisted.len()
    }

    /// Checks that `supplied` assisted arguments match the assisted slots one for one.
    ///
    /// # Errors
    ///
    /// [`ConstructionFailure::ArgumentCountMismatch`] when the counts differ.
    pub fn check_assisted_arity(
        &self,
        scope: BindingScope,
        supplied: usize,
    ) -> Result<(), ConstructionFailure> {
        let expected = self.assisted_count();
        if expected == supplied {
            Ok(())
        } else {
            Err(ConstructionFailure::ArgumentCountMismatch {
                scope,
                expected,
                supplied,
            })
        }
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a ParameterDescriptor;
    type IntoIter = std::slice::Iter<'a, ParameterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterList {
        ParameterList::new(
            vec![
                ParameterDescriptor::of::<String>(0, "name"),
                ParameterDescriptor::of::<u32>(1, "age"),
                ParameterDescriptor::of::<u64>(2, "id"),
            ],
            [1, 2],
            [0, 7],
        )
    }

    #[test]
    fn membership_queries() {
        let params = sample();
        assert_eq!(params.len(), 3);
        assert!(!params.is_assisted(0));
        assert!(params.is_assisted(1));
        assert!(params.is_validated(0));
        assert!(!params.is_validated(7), "out-of-range indices are dropped");
        assert_eq!(params.assisted_count(), 2);
        assert_eq!(params.container_count(), 1);
    }

    #[test]
    fn arity_check_reports_both_counts() {
        let params = sample();
        assert!(params.check_assisted_arity(BindingScope::Constructor, 2).is_ok());
        match params.check_assisted_arity(BindingScope::Constructor, 1) {
            Err(ConstructionFailure::ArgumentCountMismatch {
                expected, supplied, ..
            }) => {
                assert_eq!((expected, supplied), (2, 1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
