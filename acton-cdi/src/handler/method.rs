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
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::common::{BoxError, Invoker, Projection};
use crate::inject::{ParameterDescriptor, ParameterList};
use crate::traits::Message;

/// Identifies a type that declares handlers: its `TypeId` and Rust type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// The identity of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// `TypeId` of the class.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the class.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Names a handler by the class that declared it and the method name, e.g. `Base::on_ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerIdentity {
    /// Type name of the declaring class.
    pub declaring_class: &'static str,
    /// Handler (method) name.
    pub name: &'static str,
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_class, self.name)
    }
}

/// The handler was handed a message of a type it was not declared for.
#[derive(Debug)]
struct MessageTypeMismatch {
    expected: &'static str,
    found: &'static str,
}

impl fmt::Display for MessageTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "handler expects {}, but was invoked with {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for MessageTypeMismatch {}

/// One resolved message handler of class `A`.
///
/// Immutable once created. The invoker is not bound to an instance; it receives the
/// instance on every call, so one table serves every instance of `A`.
pub struct MessageHandlerMethod<A> {
    declaring_class: ClassId,
    message_type: TypeId,
    message_type_name: &'static str,
    handler_name: &'static str,
    return_type: &'static str,
    parameters: ParameterList,
    invoker: Arc<Invoker<A>>,
}

impl<A: 'static> MessageHandlerMethod<A> {
    /// Wraps an infallible handler declared on `declaring_class`.
    pub(crate) fn new<M, F>(
        declaring_class: ClassId,
        handler_name: &'static str,
        handler: F,
    ) -> Self
    where
        M: Message,
        F: Fn(&mut A, &M) + Send + Sync + 'static,
    {
        Self::with_result::<M, Infallible, _>(
            declaring_class,
            handler_name,
            "()",
            move |instance: &mut A, message: &M| {
                handler(instance, message);
                Ok(())
            },
        )
    }

    /// Wraps a fallible handler declared on `declaring_class`.
    pub(crate) fn fallible<M, E, F>(
        declaring_class: ClassId,
        handler_name: &'static str,
        handler: F,
    ) -> Self
    where
        M: Message,
        E: Into<BoxError>,
        F: Fn(&mut A, &M) -> Result<(), E> + Send + Sync + 'static,
    {
        Self::with_result::<M, E, F>(
            declaring_class,
            handler_name,
            std::any::type_name::<Result<(), E>>(),
            handler,
        )
    }

    fn with_result<M, E, F>(
        declaring_class: ClassId,
        handler_name: &'static str,
        return_type: &'static str,
        handler: F,
    ) -> Self
    where
        M: Message,
        E: Into<BoxError>,
        F: Fn(&mut A, &M) -> Result<(), E> + Send + Sync + 'static,
    {
        let message_type_name = std::any::type_name::<M>();
        let invoker: Arc<Invoker<A>> = Arc::new(
            move |instance: &mut A, message: &dyn Message| -> Result<(), BoxError> {
                match message.as_any().downcast_ref::<M>() {
                    Some(concrete) => handler(instance, concrete).map_err(Into::into),
                    None => {
                        error!(
                            expected = message_type_name,
                            found = message.runtime_type_name(),
                            "message failed to downcast"
                        );
                        Err(Box::new(MessageTypeMismatch {
                            expected: message_type_name,
                            found: message.runtime_type_name(),
                        }))
                    }
                }
            },
        );

        let mut parameters = ParameterList::default();
        parameters.push(ParameterDescriptor::of::<M>(0, "message"), false);

        Self {
            declaring_class,
            message_type: TypeId::of::<M>(),
            message_type_name,
            handler_name,
            return_type,
            parameters,
            invoker,
        }
    }

    /// Flags the message parameter for validation before invocation.
    pub(crate) fn mark_validated(&mut self) {
        self.parameters.mark_validated(0);
    }

    /// Re-targets the handler at a descendant `C` that embeds this class through `project`.
    ///
    /// The declaring class is preserved.
    pub(crate) fn lift<C: 'static>(&self, project: Projection<C, A>) -> MessageHandlerMethod<C> {
        let invoker = Arc::clone(&self.invoker);
        MessageHandlerMethod {
            declaring_class: self.declaring_class,
            message_type: self.message_type,
            message_type_name: self.message_type_name,
            handler_name: self.handler_name,
            return_type: self.return_type,
            parameters: self.parameters.clone(),
            invoker: Arc::new(move |instance: &mut C, message: &dyn Message| {
                invoker(project(instance), message)
            }),
        }
    }

    /// Invokes the handler on `instance`.
    ///
    /// # Errors
    ///
    /// Whatever the handler returns, or a type mismatch if `message` is not the declared
    /// message type.
    pub fn invoke(&self, instance: &mut A, message: &dyn Message) -> Result<(), BoxError> {
        (self.invoker)(instance, message)
    }
}

impl<A> MessageHandlerMethod<A> {
    /// The class whose declaration produced this handler.
    #[must_use]
    pub const fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    /// `TypeId` of the handled message type.
    #[must_use]
    pub const fn message_type(&self) -> TypeId {
        self.message_type
    }

    /// Rust type name of the handled message type.
    #[must_use]
    pub const fn message_type_name(&self) -> &'static str {
        self.message_type_name
    }

    /// The handler's method name.
    #[must_use]
    pub const fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    /// Declared return type, `()` for infallible handlers.
    #[must_use]
    pub const fn return_type(&self) -> &'static str {
        self.return_type
    }

    /// The single message parameter.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    /// `true` iff the message parameter is flagged validated.
    #[must_use]
    pub fn requires_validation(&self) -> bool {
        self.parameters.is_validated(0)
    }

    /// `DeclaringClass::handler_name`.
    #[must_use]
    pub const fn identity(&self) -> HandlerIdentity {
        HandlerIdentity {
            declaring_class: self.declaring_class.name(),
            name: self.handler_name,
        }
    }
}

impl<A> fmt::Debug for MessageHandlerMethod<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHandlerMethod")
            .field("declaring_class", &self.declaring_class.name())
            .field("handler_name", &self.handler_name)
            .field("message_type", &self.message_type_name)
            .field("return_type", &self.return_type)
            .field("requires_validation", &self.requires_validation())
            .finish_non_exhaustive()
    }
}
