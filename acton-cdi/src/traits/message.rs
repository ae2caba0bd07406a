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
use std::fmt::Debug;

/// Trait for messages routed by a dispatcher, providing methods for type erasure.
///
/// Blanket-implemented for every `'static + Send + Debug` type, so message types
/// need no ceremony beyond `#[derive(Debug)]`.
///
/// Note that `Box<dyn Message>` is itself a `Message`. Pass `&*boxed` (not `&boxed`)
/// to a dispatcher so the concrete message, not the box, is routed.
pub trait Message: Any + Send + Debug {
    /// Returns a reference to the message as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns the Rust type name of the concrete message, for diagnostics.
    fn runtime_type_name(&self) -> &'static str;
}

impl<T> Message for T
where
    T: Any + Send + Debug + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn runtime_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
