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

use crate::inject::Blueprint;

/// A type the [`ConstructorBinder`](crate::inject::ConstructorBinder) can instantiate.
///
/// The blueprint fixes, per parameter, whether the value comes from the container or
/// from the caller's assisted arguments.
pub trait Injectable: Sized + Send + 'static {
    /// Describes how to construct and initialize an instance of this type.
    fn blueprint() -> Blueprint<Self>;
}
