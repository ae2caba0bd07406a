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

use std::sync::Arc;
use std::thread;

use acton_cdi::prelude::*;

use crate::setup::initialize_tracing;

mod setup;

#[derive(Debug)]
struct Ping;

#[derive(Debug)]
struct Reset;

#[derive(Debug)]
struct Audit;

#[derive(Debug, Default)]
struct Base {
    pings: usize,
    resets: usize,
}

impl HandlerSource for Base {
    fn declare(declarations: &mut Declarations<Self>) {
        declarations.on("on_ping", |this: &mut Self, _: &Ping| this.pings += 1);
        declarations.on("on_reset", |this: &mut Self, _: &Reset| this.resets += 1);
    }
}

#[derive(Debug, Default)]
struct Derived {
    base: Base,
    derived_pings: usize,
}

impl HandlerSource for Derived {
    fn declare(declarations: &mut Declarations<Self>) {
        declarations.on("on_ping", |this: &mut Self, _: &Ping| this.derived_pings += 1);
    }

    fn lineage(lineage: &mut Lineage<Self>) {
        lineage.extends::<Base>(|this| &mut this.base);
    }
}

#[derive(Debug, Default)]
struct Leaf {
    derived: Derived,
    audits: usize,
}

impl HandlerSource for Leaf {
    fn declare(declarations: &mut Declarations<Self>) {
        declarations.on("on_audit", |this: &mut Self, _: &Audit| this.audits += 1);
    }

    fn lineage(lineage: &mut Lineage<Self>) {
        lineage.extends::<Derived>(|this| &mut this.derived);
    }
}

#[derive(Debug, Default)]
struct Doubled {
    first: bool,
    second: bool,
}

impl HandlerSource for Doubled {
    fn declare(declarations: &mut Declarations<Self>) {
        declarations.on("first", |this: &mut Self, _: &Ping| this.first = true);
        declarations.on("second", |this: &mut Self, _: &Ping| this.second = true);
    }
}

#[derive(Debug, Default)]
struct SelfExtending;

impl HandlerSource for SelfExtending {
    fn declare(declarations: &mut Declarations<Self>) {
        declarations.on("on_ping", |_: &mut Self, _: &Ping| {});
    }

    fn lineage(lineage: &mut Lineage<Self>) {
        lineage.extends::<Self>(|this| this);
    }
}

#[test]
fn most_derived_handler_wins() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<Derived>()?;

    assert_eq!(table.len(), 2);
    let ping = table.get_for::<Ping>().expect("ping handler");
    assert_eq!(ping.declaring_class(), ClassId::of::<Derived>());
    assert_eq!(ping.handler_name(), "on_ping");

    let reset = table.get_for::<Reset>().expect("inherited reset handler");
    assert_eq!(reset.declaring_class(), ClassId::of::<Base>());
    assert!(!table.has_conflicts(), "overrides across the lineage are not conflicts");
    Ok(())
}

#[test]
fn inherited_handlers_act_on_the_embedded_parent() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<Leaf>()?;
    assert_eq!(table.len(), 3);

    let mut leaf = Leaf::default();
    for message in [&Ping as &dyn Message, &Reset, &Audit, &Ping] {
        let handler = table
            .get(message.as_any().type_id())
            .expect("every message is handled");
        handler
            .invoke(&mut leaf, message)
            .map_err(|error| anyhow::anyhow!(error))?;
    }

    assert_eq!(leaf.derived.derived_pings, 2);
    assert_eq!(leaf.derived.base.pings, 0, "the overridden base handler never runs");
    assert_eq!(leaf.derived.base.resets, 1);
    assert_eq!(leaf.audits, 1);
    Ok(())
}

#[test]
fn same_class_conflict_keeps_the_later_handler() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::with_policy(ConflictPolicy::LastWins);
    let table = registry.handlers_for::<Doubled>()?;

    assert_eq!(table.len(), 1);
    assert_eq!(table.get_for::<Ping>().map(|h| h.handler_name()), Some("second"));

    let conflicts = table.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].discarded, "first");
    assert_eq!(conflicts[0].kept, "second");
    assert_eq!(conflicts[0].class, ClassId::of::<Doubled>());
    Ok(())
}

#[test]
fn reject_policy_fails_and_caches_nothing() {
    initialize_tracing();
    let registry = MessageHandlerRegistry::with_policy(ConflictPolicy::Reject);

    let error = registry.handlers_for::<Doubled>().unwrap_err();
    assert!(matches!(error, RegistryError::ConflictingHandlers(_)));
    assert!(error.to_string().contains("first"));
    assert!(!registry.contains::<Doubled>());
    assert!(registry.is_empty());

    assert!(registry.handlers_for::<Base>().is_ok(), "other classes are unaffected");
}

#[test]
fn class_extending_itself_is_rejected() {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();

    let error = registry.handlers_for::<SelfExtending>().unwrap_err();
    let RegistryError::CyclicLineage { path } = &error else {
        panic!("expected a cyclic lineage, got {error}");
    };
    assert_eq!(path.len(), 2);
    assert!(path.iter().all(|class| *class == std::any::type_name::<SelfExtending>()));
    assert!(!registry.contains::<SelfExtending>());
}

#[test]
fn concurrent_first_requests_share_one_table() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = Arc::new(MessageHandlerRegistry::new());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.handlers_for::<Leaf>())
        })
        .collect();

    let mut tables = Vec::new();
    for worker in workers {
        let table = worker
            .join()
            .map_err(|_| anyhow::anyhow!("registry worker panicked"))??;
        tables.push(table);
    }

    let first = &tables[0];
    assert!(tables.iter().all(|table| Arc::ptr_eq(first, table)));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn global_registry_is_shared() -> anyhow::Result<()> {
    initialize_tracing();
    let first = MessageHandlerRegistry::global().handlers_for::<Base>()?;
    let second = MessageHandlerRegistry::global().handlers_for::<Base>()?;
    assert!(Arc::ptr_eq(&first, &second));
    assert!(MessageHandlerRegistry::global().contains::<Base>());
    Ok(())
}

#[test]
fn handler_metadata_describes_the_declaration() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let handler = registry
        .handler_for_message::<Derived, Reset>()?
        .expect("reset is inherited");

    assert_eq!(handler.message_type_name(), std::any::type_name::<Reset>());
    assert_eq!(handler.return_type(), "()");
    assert_eq!(handler.parameters().len(), 1);
    assert!(!handler.requires_validation());
    assert_eq!(
        handler.identity().to_string(),
        format!("{}::on_reset", std::any::type_name::<Base>())
    );

    assert!(registry.handler_for_message::<Derived, Audit>()?.is_none());
    Ok(())
}
