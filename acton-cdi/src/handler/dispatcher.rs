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

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use super::{DispatchError, HandlerTable, MessageHandlerRegistry, RegistryError};
use crate::common::config::CONFIG;
use crate::common::{Receive, UnhandledCallback};
use crate::traits::{HandlerSource, Message, Validator};
use crate::validation::AcceptAll;

fn log_unhandled() -> UnhandledCallback {
    Box::new(|message: &dyn Message| {
        debug!(
            message_type = message.runtime_type_name(),
            "no handler for message; ignoring"
        );
    })
}

/// One live instance paired with its class's handler table.
///
/// Routes each message by its exact runtime type. No supertype or trait matching
/// happens: a message without an entry in the table goes to the unhandled callback.
///
/// # Example
///
/// ```rust,ignore
/// let table = MessageHandlerRegistry::global().handlers_for::<Counter>()?;
/// let mut dispatcher = BoundDispatcher::builder(Counter::default(), table)
///     .on_unhandled(|msg| tracing::warn!(?msg, "dropped"))
///     .validator(ConstraintValidator::new().with::<Ping>())
///     .build();
/// dispatcher.dispatch(&Ping)?;
/// ```
pub struct BoundDispatcher<A> {
    instance: A,
    table: Arc<HandlerTable<A>>,
    unhandled: UnhandledCallback,
    validator: Arc<dyn Validator>,
    validate_messages: bool,
}

impl<A: Send + 'static> BoundDispatcher<A> {
    /// Starts building a dispatcher for `instance` over `table`.
    pub fn builder(instance: A, table: Arc<HandlerTable<A>>) -> DispatcherBuilder<A> {
        DispatcherBuilder {
            instance,
            table,
            unhandled: None,
            validator: None,
            validate_messages: CONFIG.dispatch.validate_messages,
        }
    }

    /// A dispatcher for `instance` using the global registry and default settings.
    ///
    /// # Errors
    ///
    /// See [`MessageHandlerRegistry::register`].
    pub fn for_instance(instance: A) -> Result<Self, RegistryError>
    where
        A: HandlerSource,
    {
        let table = MessageHandlerRegistry::global().handlers_for::<A>()?;
        Ok(Self::builder(instance, table).build())
    }

    /// Routes one message to its handler.
    ///
    /// Unhandled messages go to the unhandled callback and return `Ok(())` without
    /// touching the instance. A handler flagged validated runs only if the validator
    /// reports no violations.
    ///
    /// # Errors
    ///
    /// * [`DispatchError::Validation`] - The message violated its constraints.
    /// * [`DispatchError::Invocation`] - The handler returned an error.
    #[instrument(
        skip(self, message),
        fields(class = self.table.class().name(), message_type = message.runtime_type_name()),
        level = "debug"
    )]
    pub fn dispatch(&mut self, message: &dyn Message) -> Result<(), DispatchError> {
        let message_type = message.as_any().type_id();
        let Some(method) = self.table.get(message_type) else {
            (self.unhandled)(message);
            return Ok(());
        };

        if self.validate_messages && method.requires_validation() {
            let violations = self.validator.validate(message.as_any());
            if !violations.is_empty() {
                debug!(%violations, handler = %method.identity(), "message rejected");
                return Err(DispatchError::Validation {
                    class: self.table.class().name(),
                    handler: method.identity(),
                    message_type: message.runtime_type_name(),
                    violations,
                });
            }
        }

        trace!(handler = %method.identity(), "invoking");
        method
            .invoke(&mut self.instance, message)
            .map_err(|source| DispatchError::Invocation {
                class: self.table.class().name(),
                handler: method.identity(),
                message_type: message.runtime_type_name(),
                source,
            })
    }

    /// Turns the dispatcher into the boxed receive function a host runtime drives.
    #[must_use]
    pub fn into_receive(mut self) -> Receive {
        Box::new(move |message: &dyn Message| self.dispatch(message))
    }

    /// The bound instance.
    #[must_use]
    pub const fn instance(&self) -> &A {
        &self.instance
    }

    /// The bound instance, mutably.
    pub fn instance_mut(&mut self) -> &mut A {
        &mut self.instance
    }

    /// Releases the bound instance.
    #[must_use]
    pub fn into_instance(self) -> A {
        self.instance
    }

    /// The handler table in use.
    #[must_use]
    pub const fn table(&self) -> &Arc<HandlerTable<A>> {
        &self.table
    }
}

impl<A: fmt::Debug> fmt::Debug for BoundDispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDispatcher")
            .field("instance", &self.instance)
            .field("class", &self.table.class().name())
            .field("handlers", &self.table.len())
            .field("validate_messages", &self.validate_messages)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BoundDispatcher`]. Defaults: unhandled messages are logged at `debug`,
/// every message is valid, validation follows `dispatch.validate_messages`.
pub struct DispatcherBuilder<A> {
    instance: A,
    table: Arc<HandlerTable<A>>,
    unhandled: Option<UnhandledCallback>,
    validator: Option<Arc<dyn Validator>>,
    validate_messages: bool,
}

impl<A: Send + 'static> DispatcherBuilder<A> {
    /// Called once for every message without a handler.
    #[must_use]
    pub fn on_unhandled<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&dyn Message) + Send + 'static,
    {
        self.unhandled = Some(Box::new(callback));
        self
    }

    /// Validates messages for handlers flagged validated.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Like [`DispatcherBuilder::validator`], sharing an existing validator.
    #[must_use]
    pub fn shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Overrides the configured `dispatch.validate_messages` switch.
    #[must_use]
    pub fn validate_messages(mut self, enabled: bool) -> Self {
        self.validate_messages = enabled;
        self
    }

    /// Finishes the dispatcher.
    #[must_use]
    pub fn build(self) -> BoundDispatcher<A> {
        BoundDispatcher {
            instance: self.instance,
            table: self.table,
            unhandled: self.unhandled.unwrap_or_else(log_unhandled),
            validator: self
                .validator
                .unwrap_or_else(|| Arc::new(AcceptAll) as Arc<dyn Validator>),
            validate_messages: self.validate_messages,
        }
    }
}

/// Builds the receive function for `instance`: `table` for routing, `unhandled` for
/// messages without a handler, every message treated as valid.
pub fn new_receive<A, F>(instance: A, table: Arc<HandlerTable<A>>, unhandled: F) -> Receive
where
    A: Send + 'static,
    F: FnMut(&dyn Message) + Send + 'static,
{
    BoundDispatcher::builder(instance, table)
        .on_unhandled(unhandled)
        .build()
        .into_receive()
}
