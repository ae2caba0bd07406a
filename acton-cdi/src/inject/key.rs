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
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use super::ParameterDescriptor;

/// Disambiguates between several container entries of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier(Cow<'static, str>);

impl Qualifier {
    /// A name tag qualifier.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The qualifier's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@Named(\"{}\")", self.0)
    }
}

/// Identifies one dependency request: a type plus optional qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifiers: Vec<Qualifier>,
}

impl DependencyKey {
    /// An unqualified request for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifiers: Vec::new(),
        }
    }

    /// Adds qualifiers to the request.
    #[must_use]
    pub fn qualified(mut self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.qualifiers.extend(qualifiers);
        self.qualifiers.sort();
        self.qualifiers.dedup();
        self
    }

    /// The request a container-resolved parameter makes.
    #[must_use]
    pub fn for_parameter(parameter: &ParameterDescriptor) -> Self {
        let mut qualifiers = parameter.qualifiers().to_vec();
        qualifiers.sort();
        qualifiers.dedup();
        Self {
            type_id: parameter.type_id(),
            type_name: parameter.type_name(),
            qualifiers,
        }
    }

    /// `TypeId` of the requested type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the requested type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Requested qualifiers, sorted and de-duplicated.
    #[must_use]
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for qualifier in &self.qualifiers {
            write!(f, "{qualifier} ")?;
        }
        f.write_str(self.type_name)
    }
}
