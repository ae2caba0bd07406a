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

//! Defines common type aliases shared by the registry, the dispatcher and the binder.
//!
//! Centralizing these signatures keeps the boxed-closure types readable at the
//! places they are stored and invoked.

use std::any::Any;
use std::sync::Arc;

use crate::handler::DispatchError;
use crate::traits::Message;

/// A boxed, thread-safe error used for failures raised by user code
/// (handlers, constructors, providers and post-construct hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A type-erased value shared out of a [`Resolver`](crate::traits::Resolver).
pub type Shared = Arc<dyn Any + Send + Sync>;

/// Callback invoked with the original message when no handler matches its runtime type.
pub type UnhandledCallback = Box<dyn FnMut(&dyn Message) + Send + 'static>;

/// A compiled receive function: one live instance bound to its resolved handler table.
///
/// Produced by [`BoundDispatcher::into_receive`](crate::handler::BoundDispatcher::into_receive)
/// and [`new_receive`](crate::handler::new_receive).
pub type Receive = Box<dyn FnMut(&dyn Message) -> Result<(), DispatchError> + Send + 'static>;

/// Crate-internal: an instance-unbound handler invocation.
///
/// The closure downcasts the message to the declared type and calls the handler on
/// whichever instance it is given at dispatch time.
pub(crate) type Invoker<A> =
    dyn Fn(&mut A, &dyn Message) -> Result<(), BoxError> + Send + Sync + 'static;

/// Crate-internal: projection from a descendant onto the ancestor embedded in it.
pub(crate) type Projection<C, P> = for<'a> fn(&'a mut C) -> &'a mut P;
