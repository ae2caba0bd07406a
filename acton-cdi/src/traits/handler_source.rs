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

use crate::handler::{Declarations, Lineage};

/// A type that declares message handlers.
///
/// `declare` lists only the handlers written on the type itself, in declaration order.
/// Inherited handlers come from the ancestor named in `lineage`; the
/// [`MessageHandlerRegistry`](crate::handler::MessageHandlerRegistry) walks the chain and
/// lets the most-derived declaration for each message type win.
///
/// Usually generated by `#[acton_handlers]`, but straightforward to write by hand:
///
/// ```rust,ignore
/// struct Base { seen: usize }
/// struct Derived { base: Base, overridden: bool }
///
/// impl HandlerSource for Derived {
///     fn declare(declarations: &mut Declarations<Self>) {
///         declarations.on("on_ping", |this: &mut Self, _msg: &Ping| this.overridden = true);
///     }
///
///     fn lineage(lineage: &mut Lineage<Self>) {
///         lineage.extends::<Base>(|this| &mut this.base);
///     }
/// }
/// ```
pub trait HandlerSource: Sized + Send + 'static {
    /// Declares the handlers defined directly on this type.
    fn declare(declarations: &mut Declarations<Self>);

    /// Names the direct ancestor whose handlers this type inherits. Root types keep the default.
    fn lineage(_lineage: &mut Lineage<Self>) {}
}
