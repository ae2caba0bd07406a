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

use crate::validation::Violations;

/// The constraint-checking collaborator supplied by the host.
///
/// Called with a message before a validated handler runs, and with a bound value
/// before a validated constructor parameter or field is used. An empty result means valid.
pub trait Validator: Send + Sync {
    /// Checks `value` and returns every violated constraint.
    fn validate(&self, value: &dyn Any) -> Violations;
}

/// Constraints carried by a value type.
///
/// Register implementors with a [`ConstraintValidator`](crate::validation::ConstraintValidator).
pub trait Validate {
    /// Checks `self` and returns every violated constraint.
    fn validate(&self) -> Violations;
}
