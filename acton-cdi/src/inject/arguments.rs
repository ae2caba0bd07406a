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

//! The two argument streams of a binding: caller-supplied assisted values in, the
//! assembled positional argument vector out.

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt;

use super::ArgumentError;

/// One caller-supplied value, tagged with its exact type.
pub struct AssistedArg {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl AssistedArg {
    /// Wraps `value`.
    pub fn new<V: Any + Send>(value: V) -> Self {
        Self {
            type_id: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
            value: Box::new(value),
        }
    }

    /// `TypeId` of the wrapped value.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn into_value(self) -> Box<dyn Any + Send> {
        self.value
    }
}

impl fmt::Debug for AssistedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssistedArg").field(&self.type_name).finish()
    }
}

/// The positional list of caller-supplied values for one parameter space.
///
/// Values are matched to assisted slots in declaration order and must have exactly
/// the declared type: a `5_i32` does not fill an `i64` slot.
///
/// Build with [`assisted!`](crate::assisted) or [`AssistedArgs::with`].
#[derive(Debug, Default)]
pub struct AssistedArgs(Vec<AssistedArg>);

impl AssistedArgs {
    /// An empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `value`, returning `self` for chaining.
    #[must_use]
    pub fn with<V: Any + Send>(mut self, value: V) -> Self {
        self.push(value);
        self
    }

    /// Appends `value`.
    pub fn push<V: Any + Send>(&mut self, value: V) {
        self.0.push(AssistedArg::new(value));
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no values were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Type names of the supplied values, in order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.0.iter().map(AssistedArg::type_name).collect()
    }
}

impl IntoIterator for AssistedArgs {
    type Item = AssistedArg;
    type IntoIter = std::vec::IntoIter<AssistedArg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<AssistedArg> for AssistedArgs {
    fn from_iter<I: IntoIterator<Item = AssistedArg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds an [`AssistedArgs`] list from values, in order.
///
/// ```rust,ignore
/// let args = assisted![5_i32, String::from("tenant-a")];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! assisted {
    () => {
        $crate::prelude::AssistedArgs::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::prelude::AssistedArgs::new()$(.with($value))+
    };
}

/// A value placed in the argument vector, remembering the type it was bound as.
pub(crate) struct BoundValue {
    pub(crate) type_name: &'static str,
    pub(crate) value: Box<dyn Any + Send>,
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundValue").field(&self.type_name).finish()
    }
}

/// The assembled argument vector handed to a constructor body.
///
/// Container-resolved parameters arrive as `Arc<P>`; assisted parameters arrive as the
/// declared value type. Read them with [`Arguments::take`] in declaration order.
pub struct Arguments {
    values: VecDeque<BoundValue>,
    taken: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<BoundValue>) -> Self {
        Self {
            values: values.into(),
            taken: 0,
        }
    }

    /// Takes the next argument as a `V`.
    ///
    /// # Errors
    ///
    /// [`ArgumentError`] if the arguments are exhausted or the next one was bound as a
    /// different type. The argument is consumed either way.
    pub fn take<V: Any>(&mut self) -> Result<V, ArgumentError> {
        let position = self.taken;
        let expected = std::any::type_name::<V>();
        let bound = self.values.pop_front().ok_or(ArgumentError {
            position,
            expected,
            found: None,
        })?;
        self.taken += 1;
        let found = bound.type_name;
        bound
            .value
            .downcast::<V>()
            .map(|value| *value)
            .map_err(|_| ArgumentError {
                position,
                expected,
                found: Some(found),
            })
    }

    /// Number of arguments not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|bound| bound.type_name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound<V: Any + Send>(value: V) -> BoundValue {
        BoundValue {
            type_name: std::any::type_name::<V>(),
            value: Box::new(value),
        }
    }

    #[test]
    fn macro_preserves_order_and_types() {
        let args = crate::assisted![5_i32, "tenant", 6_u8];
        assert_eq!(args.type_names(), vec!["i32", "&str", "u8"]);
    }

    #[test]
    fn take_reads_in_order() {
        let mut args = Arguments::new(vec![bound(1_u32), bound(String::from("x"))]);
        assert_eq!(args.take::<u32>().unwrap(), 1);
        assert_eq!(args.take::<String>().unwrap(), "x");
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn take_with_wrong_type_reports_position() {
        let mut args = Arguments::new(vec![bound(1_u32)]);
        let err = args.take::<i64>().unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.found, Some("u32"));

        let err = args.take::<u32>().unwrap_err();
        assert_eq!(err.found, None);
    }
}
