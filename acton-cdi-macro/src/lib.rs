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

//! Acton CDI Macro Library
//!
//! Attribute macros that turn annotated handler methods into a `HandlerSource`
//! implementation, so handler discovery is fixed at compile time.
//!
//! # Handlers Macro
//!
//! ```ignore
//! #[acton_handlers]
//! impl Counter {
//!     #[handler]
//!     fn on_ping(&mut self, _msg: &Ping) {
//!         self.pings += 1;
//!     }
//!
//!     #[handler(validated, name = "reset")]
//!     fn on_reset(&mut self, msg: &Reset) -> Result<(), BoxError> {
//!         self.pings = msg.to;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! A type that embeds its parent's state inherits the parent's handlers:
//!
//! ```ignore
//! #[acton_handlers(extends = Counter, via = counter)]
//! impl AuditedCounter {
//!     #[handler]
//!     fn on_ping(&mut self, _msg: &Ping) {
//!         self.audited += 1;
//!     }
//! }
//! ```

use proc_macro::TokenStream;

use proc_macro2::Span;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Member, Meta,
    ReturnType, Type,
};

/// Configuration options parsed from `#[acton_handlers(...)]` attributes.
#[derive(Default)]
struct HandlersConfig {
    /// The direct parent type whose handlers are inherited.
    extends: Option<Type>,
    /// The field holding the parent's state.
    via: Option<Member>,
}

/// Configuration options parsed from `#[handler(...)]` attributes.
struct HandlerConfig {
    /// Validate the message before the handler runs.
    validated: bool,
    /// Name reported in conflicts and errors; defaults to the method name.
    name: Option<LitStr>,
}

impl HandlerConfig {
    fn parse(attr: &Attribute) -> syn::Result<Self> {
        let mut config = Self {
            validated: false,
            name: None,
        };
        if let Meta::List(_) = attr.meta {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("validated") {
                    config.validated = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    config.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `validated` or `name = \"...\"`"))
                }
            })?;
        }
        Ok(config)
    }
}

/// One `#[handler]` method, ready to be declared.
struct HandlerSpec {
    method: syn::Ident,
    message: Type,
    name: LitStr,
    validated: bool,
    fallible: bool,
}

fn is_handler_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("handler")
}

/// `true` for a missing return type or an explicit `-> ()`.
fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()),
    }
}

/// Extracts the handler declaration from `method` and strips its `#[handler]` attribute.
fn take_handler(method: &mut ImplItemFn) -> syn::Result<Option<HandlerSpec>> {
    let Some(position) = method.attrs.iter().position(is_handler_attr) else {
        return Ok(None);
    };
    let attr = method.attrs.remove(position);
    let config = HandlerConfig::parse(&attr)?;

    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(sig.span(), "handlers must be synchronous"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "handlers cannot be generic",
        ));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_some() => {}
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                "handlers take `&mut self` as their first parameter",
            ))
        }
    }
    let message = match (inputs.next(), inputs.next()) {
        (Some(FnArg::Typed(arg)), None) => match &*arg.ty {
            Type::Reference(reference) if reference.mutability.is_none() => {
                (*reference.elem).clone()
            }
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "the message parameter must be a shared reference, e.g. `msg: &Ping`",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                "handlers take exactly one message parameter after `&mut self`",
            ))
        }
    };

    let name = config
        .name
        .unwrap_or_else(|| LitStr::new(&sig.ident.to_string(), Span::call_site()));

    Ok(Some(HandlerSpec {
        method: sig.ident.clone(),
        message,
        name,
        validated: config.validated,
        fallible: !returns_unit(&sig.output),
    }))
}

/// Generates a `HandlerSource` implementation from the `#[handler]` methods of an impl block.
///
/// Each `#[handler]` method must take `&mut self` and exactly one `&Message` parameter.
/// Methods returning nothing (or `()`) are declared with `Declarations::on`; methods returning
/// `Result<(), E>` are declared with `Declarations::try_on`. Handlers are declared in
/// source order.
///
/// # Options
///
/// - `extends = Parent`: inherit every handler of `Parent` (itself a `HandlerSource`).
/// - `via = field`: the field of `Self` holding the `Parent` state. Required with `extends`.
///
/// # Handler Options
///
/// - `#[handler(validated)]`: validate the message before the handler runs.
/// - `#[handler(name = "...")]`: report the handler under another name.
#[proc_macro_attribute]
pub fn acton_handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut config = HandlersConfig::default();
    let config_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("extends") {
            config.extends = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("via") {
            config.via = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("expected `extends = Type` or `via = field`"))
        }
    });
    parse_macro_input!(attr with config_parser);

    let mut input = parse_macro_input!(item as ItemImpl);
    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new(
            path.span(),
            "#[acton_handlers] belongs on an inherent impl block",
        )
        .to_compile_error()
        .into();
    }

    let mut handlers = Vec::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            match take_handler(method) {
                Ok(Some(handler)) => handlers.push(handler),
                Ok(None) => {}
                Err(error) => return error.to_compile_error().into(),
            }
        }
    }

    let declarations = handlers.iter().map(|handler| {
        let HandlerSpec {
            method,
            message,
            name,
            validated,
            fallible,
        } = handler;
        let declare = if *fallible {
            quote!(declarations.try_on::<#message, _, _>(#name, Self::#method))
        } else {
            quote!(declarations.on::<#message, _>(#name, Self::#method))
        };
        let validated = validated.then(|| quote!(.validated()));
        quote!(#declare #validated;)
    });

    let lineage = match (&config.extends, &config.via) {
        (Some(parent), Some(field)) => quote! {
            fn lineage(lineage: &mut ::acton_cdi::prelude::Lineage<Self>) {
                lineage.extends::<#parent>(|this| &mut this.#field);
            }
        },
        (None, None) => quote!(),
        (Some(parent), None) => {
            return syn::Error::new(
                parent.span(),
                "`extends` needs `via = field` naming the field that holds the parent",
            )
            .to_compile_error()
            .into()
        }
        (None, Some(field)) => {
            return syn::Error::new(field.span(), "`via` is only meaningful with `extends`")
                .to_compile_error()
                .into()
        }
    };

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics ::acton_cdi::prelude::HandlerSource for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn declare(declarations: &mut ::acton_cdi::prelude::Declarations<Self>) {
                #(#declarations)*
            }

            #lineage
        }
    };

    // Return the generated tokens.
    TokenStream::from(expanded)
}

/// Marks a method inside an `#[acton_handlers]` impl block as a message handler.
///
/// `#[acton_handlers]` consumes this attribute; on its own it only reports an error.
#[proc_macro_attribute]
pub fn handler(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(item);
    let error = syn::Error::new(
        Span::call_site(),
        "#[handler] only has an effect inside an #[acton_handlers] impl block",
    )
    .to_compile_error();
    TokenStream::from(quote! {
        #error
        #item
    })
}
