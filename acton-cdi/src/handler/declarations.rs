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

use tracing::{instrument, trace};

use super::{ClassId, MessageHandlerMethod, RegistryError};
use crate::common::{BoxError, Projection};
use crate::traits::{HandlerSource, Message};

/// Collects the handlers a class declares on itself.
///
/// Passed to [`HandlerSource::declare`]. Declaration order is preserved; it decides
/// which handler is kept when one class declares two for the same message type.
pub struct Declarations<A> {
    class: ClassId,
    methods: Vec<MessageHandlerMethod<A>>,
}

impl<A: 'static> Declarations<A> {
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            methods: Vec::new(),
        }
    }

    /// Declares an infallible handler for messages of type `M`.
    ///
    /// # Parameters
    /// - `name`: The handler's method name, reported in errors and conflicts.
    /// - `handler`: Called with the instance and the concrete message.
    pub fn on<M, F>(&mut self, name: &'static str, handler: F) -> HandlerOptions<'_, A>
    where
        M: Message,
        F: Fn(&mut A, &M) + Send + Sync + 'static,
    {
        trace!(
            class = self.class.name(),
            handler = name,
            message_type = std::any::type_name::<M>(),
            "declaring handler"
        );
        let method = MessageHandlerMethod::new::<M, F>(self.class, name, handler);
        self.push(method)
    }

    /// Declares a fallible handler for messages of type `M`.
    ///
    /// An `Err` becomes a dispatch invocation error naming this handler.
    pub fn try_on<M, E, F>(&mut self, name: &'static str, handler: F) -> HandlerOptions<'_, A>
    where
        M: Message,
        E: Into<BoxError>,
        F: Fn(&mut A, &M) -> Result<(), E> + Send + Sync + 'static,
    {
        trace!(
            class = self.class.name(),
            handler = name,
            message_type = std::any::type_name::<M>(),
            "declaring fallible handler"
        );
        let method = MessageHandlerMethod::fallible::<M, E, F>(self.class, name, handler);
        self.push(method)
    }

    /// The declaring class.
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    /// Number of handlers declared so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn push(&mut self, method: MessageHandlerMethod<A>) -> HandlerOptions<'_, A> {
        self.methods.push(method);
        let last = self.methods.len() - 1;
        HandlerOptions {
            method: &mut self.methods[last],
        }
    }
}

/// Per-handler options, returned by [`Declarations::on`] and [`Declarations::try_on`].
pub struct HandlerOptions<'d, A> {
    method: &'d mut MessageHandlerMethod<A>,
}

impl<A: 'static> HandlerOptions<'_, A> {
    /// Validates the message before this handler runs.
    ///
    /// A message with violations is rejected and the handler is not invoked.
    pub fn validated(self) -> Self {
        self.method.mark_validated();
        self
    }
}

/// One class's own declarations, already re-targeted at the class being registered.
pub(crate) struct Layer<A> {
    pub(crate) class: ClassId,
    pub(crate) methods: Vec<MessageHandlerMethod<A>>,
}

impl<A: 'static> Layer<A> {
    fn lift<C: 'static>(&self, project: Projection<C, A>) -> Layer<C> {
        Layer {
            class: self.class,
            methods: self
                .methods
                .iter()
                .map(|method| method.lift(project))
                .collect(),
        }
    }
}

/// The ancestry of a class, most distant ancestor first.
///
/// Passed to [`HandlerSource::lineage`]. A class names its direct parent and the projection
/// from itself to the embedded parent state; the parent's own lineage is followed
/// automatically. A parent that is already being collected (the class itself, or one of its
/// descendants) is reported as [`RegistryError::CyclicLineage`] instead of being followed.
pub struct Lineage<A> {
    path: Vec<ClassId>,
    layers: Vec<Layer<A>>,
    cycle: Option<RegistryError>,
}

impl<A: 'static> Lineage<A> {
    fn new(path: Vec<ClassId>) -> Self {
        Self {
            path,
            layers: Vec::new(),
            cycle: None,
        }
    }

    /// Inherits every handler of `P` (and of `P`'s ancestors).
    ///
    /// Handlers of `P` run against `project(self)`. Calling this more than once stacks the
    /// parents in call order, later parents overriding earlier ones.
    pub fn extends<P: HandlerSource>(&mut self, project: Projection<A, P>) -> &mut Self {
        trace!(
            child = std::any::type_name::<A>(),
            parent = std::any::type_name::<P>(),
            "extending"
        );
        if self.cycle.is_some() {
            return self;
        }
        match collect_along::<P>(self.path.clone()) {
            Ok(layers) => {
                for layer in layers {
                    self.layers.push(layer.lift(project));
                }
            }
            Err(error) => self.cycle = Some(error),
        }
        self
    }

    /// Number of ancestor layers collected so far.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

/// The handler layers of `S`, root ancestor first and `S`'s own declarations last.
///
/// Fails with [`RegistryError::CyclicLineage`] if `S` is its own ancestor.
pub(crate) fn collect_layers<S: HandlerSource>() -> Result<Vec<Layer<S>>, RegistryError> {
    collect_along::<S>(Vec::new())
}

/// `path` holds the classes whose lineage is being collected, outermost first.
#[instrument(level = "trace", skip_all, fields(class = std::any::type_name::<S>()))]
fn collect_along<S: HandlerSource>(
    mut path: Vec<ClassId>,
) -> Result<Vec<Layer<S>>, RegistryError> {
    let class = ClassId::of::<S>();
    let revisited = path.contains(&class);
    path.push(class);
    if revisited {
        return Err(RegistryError::CyclicLineage {
            path: path.iter().map(ClassId::name).collect(),
        });
    }

    let mut lineage = Lineage::new(path);
    S::lineage(&mut lineage);
    if let Some(error) = lineage.cycle {
        return Err(error);
    }

    let mut declarations = Declarations::new(class);
    S::declare(&mut declarations);

    let mut layers = lineage.layers;
    layers.push(Layer {
        class,
        methods: declarations.methods,
    });
    Ok(layers)
}
