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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Acton CDI
//!
//! This crate connects a dependency container to agents hosted by an actor
//! runtime. It provides two mechanisms that the runtime builds on:
//!
//! - **Handler registry (`MessageHandlerRegistry`)**: collects the handlers a type
//!   declares (and the handlers its declared ancestors declare), resolves one handler
//!   per concrete message type with the most-derived declaration winning, and caches
//!   the resulting `HandlerTable` for the lifetime of the process.
//! - **Dispatch (`BoundDispatcher`)**: pairs a cached table with one live instance and
//!   an unhandled-message callback, routing every inbound message by its exact runtime
//!   type, validating it when the handler asks for that, and reporting handler failures
//!   with the class and handler that produced them.
//! - **Assisted binding (`ConstructorBinder`)**: builds an `Injectable` from a
//!   `Blueprint`, taking some constructor parameters and fields from a `Resolver`
//!   (such as the bundled `Container`) and the rest, by position, from caller-supplied
//!   `AssistedArgs`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acton_cdi::prelude::*;
//!
//! #[derive(Debug)]
//! struct Ping;
//!
//! #[derive(Default)]
//! struct Counter {
//!     pings: usize,
//! }
//!
//! #[acton_handlers]
//! impl Counter {
//!     #[handler]
//!     fn on_ping(&mut self, _msg: &Ping) {
//!         self.pings += 1;
//!     }
//! }
//!
//! let mut receive = BoundDispatcher::for_instance(Counter::default())?;
//! receive.dispatch(&Ping)?;
//! assert_eq!(receive.instance().pings, 1);
//! ```

// Lets the attribute macros refer to `::acton_cdi` from inside this crate as well.
extern crate self as acton_cdi;

/// Internal utilities, shared type aliases and configuration.
pub(crate) mod common;

/// Handler declarations, resolution, the process-wide registry and dispatch.
pub(crate) mod handler;

/// Parameter descriptors, the container and the assisted binder.
pub(crate) mod inject;

/// Host adapters that feed a dispatcher from a mailbox.
pub(crate) mod runtime;

/// Defines core traits used throughout the crate.
pub(crate) mod traits;

/// Constraint checking for messages and bound parameters.
pub(crate) mod validation;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `acton-cdi-macro`)
/// *   [`acton_cdi_macro::acton_handlers`]: Generates a [`HandlerSource`](crate::traits::HandlerSource)
///     implementation from `#[handler]` methods.
///
/// ## Handlers
/// *   [`crate::handler::MessageHandlerRegistry`], [`crate::handler::HandlerTable`],
///     [`crate::handler::MessageHandlerMethod`], [`crate::handler::BoundDispatcher`] and friends.
///
/// ## Binding
/// *   [`crate::inject::ConstructorBinder`], [`crate::inject::Blueprint`],
///     [`crate::inject::Constructor`], [`crate::inject::FieldPlan`], [`crate::inject::Container`].
pub mod prelude {
    pub use acton_cdi_macro::*;

    pub use crate::assisted;
    pub use crate::common::config::{
        BinderConfig, CdiConfig, DispatchConfig, MailboxConfig, RegistryConfig, CONFIG,
    };
    pub use crate::common::{BoxError, Receive, Shared, UnhandledCallback};
    pub use crate::handler::{
        new_receive, BoundDispatcher, ClassId, ConflictPolicy, Declarations, DispatchError,
        DispatcherBuilder, HandlerConflict, HandlerIdentity, HandlerOptions, HandlerTable,
        Lineage, MessageHandlerMethod, MessageHandlerRegistry, RegistryError,
    };
    pub use crate::inject::{
        Arguments, ArgumentError, AssistedArg, AssistedArgs, BeanConstructionError,
        BindingScope, Blueprint, Constructor, ConstructionFailure, ConstructorBinder, Container,
        DependencyKey, FieldPlan, ParameterDescriptor, ParameterList, Qualifier,
        ResolutionError,
    };
    pub use crate::runtime::{spawn_receive, MailboxError, ReceiveHandle};
    pub use crate::traits::{HandlerSource, Injectable, Message, Resolver, Validate, Validator};
    pub use crate::validation::{AcceptAll, ConstraintValidator, ConstraintViolation, Violations};
}
