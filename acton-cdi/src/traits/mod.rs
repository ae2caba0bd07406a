//! Defines the core traits that establish the contracts between this crate and its host.
//!
//! # Key Traits
//!
//! *   [`Message`]: Implemented for every `'static + Send + Debug` type. Lets the dispatcher
//!     recover the concrete runtime type of a message behind `&dyn Message`.
//! *   [`HandlerSource`]: Implemented by types that declare message handlers, either by hand
//!     or through `#[acton_handlers]`. Names the direct ancestor, if any.
//! *   [`Injectable`]: Implemented by types the [`ConstructorBinder`](crate::inject::ConstructorBinder)
//!     can build. Returns the type's [`Blueprint`](crate::inject::Blueprint).
//! *   [`Resolver`]: The dependency container as seen by the binder.
//! *   [`Validator`] and [`Validate`]: The constraint-checking collaborator and the per-type
//!     constraints it can run.

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

// --- Public Re-exports ---
pub use handler_source::HandlerSource;
pub use injectable::Injectable;
pub use message::Message;
pub use resolver::Resolver;
pub use validator::{Validate, Validator};

// --- Submodules ---

/// Defines the [`HandlerSource`] trait.
mod handler_source;
/// Defines the [`Injectable`] trait.
mod injectable;
/// Defines the [`Message`] trait.
mod message;
/// Defines the [`Resolver`] trait.
mod resolver;
/// Defines the [`Validator`] and [`Validate`] traits.
mod validator;
