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

use crate::common::Shared;
use crate::inject::{DependencyKey, ResolutionError};

/// The dependency container as seen by the binder: resolve a typed, optionally
/// qualified dependency or fail.
///
/// Implementations must return a value whose concrete type is the one named by
/// `key.type_id()`; the binder downcasts it to that type.
pub trait Resolver: Send + Sync {
    /// Resolves the dependency identified by `key`.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::NotFound`] when no candidate matches, [`ResolutionError::Ambiguous`]
    /// when the qualifiers do not single one out, or [`ResolutionError::Provider`] when the
    /// candidate could not be produced.
    fn resolve(&self, key: &DependencyKey) -> Result<Shared, ResolutionError>;
}
