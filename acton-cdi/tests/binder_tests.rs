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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use acton_cdi::prelude::*;

use crate::setup::initialize_tracing;

mod setup;

#[derive(Debug)]
struct Clock(&'static str);

#[derive(Debug)]
struct Ledger(&'static str);

#[derive(Debug)]
struct Datasource(&'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Port(u16);

impl Validate for Port {
    fn validate(&self) -> Violations {
        let mut violations = Violations::none();
        violations.check(self.0 >= 1024, "port", "must not be privileged");
        violations
    }
}

/// Two container parameters interleaved with two assisted ones.
#[derive(Debug)]
struct Position {
    clock: Arc<Clock>,
    x: i32,
    ledger: Arc<Ledger>,
    y: i32,
}

impl Injectable for Position {
    fn blueprint() -> Blueprint<Self> {
        Blueprint::new().constructor(
            Constructor::new(|args: &mut Arguments| -> Result<Self, ArgumentError> {
                Ok(Self {
                    clock: args.take()?,
                    x: args.take()?,
                    ledger: args.take()?,
                    y: args.take()?,
                })
            })
            .inject::<Clock>("clock")
            .assisted::<i32>("x")
            .inject::<Ledger>("ledger")
            .assisted::<i32>("y"),
        )
    }
}

static PAIR_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Counts constructor calls; only the arity test builds it.
#[derive(Debug)]
struct Pair(i32, i32);

impl Injectable for Pair {
    fn blueprint() -> Blueprint<Self> {
        Blueprint::new().constructor(
            Constructor::new(|args: &mut Arguments| -> Result<Self, ArgumentError> {
                PAIR_CALLS.fetch_add(1, Ordering::SeqCst);
                let left = args.take()?;
                let _clock: Arc<Clock> = args.take()?;
                Ok(Self(left, args.take()?))
            })
            .assisted::<i32>("left")
            .inject::<Clock>("clock")
            .assisted::<i32>("right"),
        )
    }
}

/// Field injection with its own assisted list and a post-construct hook.
#[derive(Debug, Default)]
struct Session {
    user: String,
    datasource: Option<Arc<Datasource>>,
    tenant: Option<String>,
    port: Option<Port>,
    ready: bool,
}

impl Injectable for Session {
    fn blueprint() -> Blueprint<Self> {
        Blueprint::new()
            .constructor(
                Constructor::new(|args: &mut Arguments| {
                    args.take::<String>().map(|user| Self {
                        user,
                        ..Self::default()
                    })
                })
                .assisted::<String>("user"),
            )
            .fields(
                FieldPlan::new()
                    .inject_qualified::<Datasource, _>(
                        "datasource",
                        [Qualifier::named("replica")],
                        |this: &mut Self, ds| this.datasource = Some(ds),
                    )
                    .assisted::<String, _>("tenant", |this: &mut Self, tenant| {
                        this.tenant = Some(tenant);
                    })
                    .assisted::<Port, _>("port", |this: &mut Self, port| this.port = Some(port))
                    .validated(),
            )
            .post_construct("ready", |this: &mut Self| -> Result<(), BoxError> {
                if this.tenant.as_deref() == Some("") {
                    return Err("tenant must not be blank".into());
                }
                this.ready = true;
                Ok(())
            })
    }
}

/// Two constructors; only one is eligible.
#[derive(Debug)]
struct Report {
    source: &'static str,
}

impl Injectable for Report {
    fn blueprint() -> Blueprint<Self> {
        Blueprint::new()
            .constructor(
                Constructor::new(|_: &mut Arguments| -> Result<Self, BoxError> {
                    Ok(Self { source: "default" })
                }),
            )
            .constructor(
                Constructor::new(|args: &mut Arguments| -> Result<Self, ArgumentError> {
                    let ledger: Arc<Ledger> = args.take()?;
                    Ok(Self { source: ledger.0 })
                })
                .inject::<Ledger>("ledger")
                .eligible(),
            )
    }
}

fn container() -> Container {
    let container = Container::new();
    container
        .register(Clock("utc"))
        .register(Ledger("main"))
        .register(Datasource("primary"))
        .register_named("replica", Datasource("replica"));
    container
}

#[test]
fn assisted_values_fill_their_slots_in_order() -> anyhow::Result<()> {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let position: Position = binder.create_with(assisted![5, 6])?;
    assert_eq!((position.x, position.y), (5, 6));
    assert_eq!(position.clock.0, "utc");
    assert_eq!(position.ledger.0, "main");
    Ok(())
}

#[test]
fn wrong_argument_count_never_reaches_the_constructor() {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let error = binder.create_with::<Pair>(assisted![5]).unwrap_err();
    assert!(error.is_argument_mismatch());
    assert!(matches!(
        error.cause,
        ConstructionFailure::ArgumentCountMismatch {
            scope: BindingScope::Constructor,
            expected: 2,
            supplied: 1,
        }
    ));

    let error = binder.create_with::<Pair>(assisted![5, 6, 7]).unwrap_err();
    assert!(error.is_argument_mismatch());
    assert_eq!(PAIR_CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn assisted_types_must_match_exactly() {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let error = binder
        .create_with::<Position>(assisted![5_i32, 6_i64])
        .unwrap_err();
    match error.cause {
        ConstructionFailure::ArgumentTypeMismatch {
            position,
            expected,
            found,
            ..
        } => {
            assert_eq!(position, 3);
            assert_eq!(expected, "i32");
            assert_eq!(found, "i64");
        }
        other => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn missing_dependency_is_a_resolution_failure() {
    initialize_tracing();
    let container = Container::new();
    container.register(Clock("utc"));
    let binder = ConstructorBinder::new(&container);

    let error = binder.create_with::<Position>(assisted![5, 6]).unwrap_err();
    assert!(error.is_resolution_failure());
    assert_eq!(error.bean, std::any::type_name::<Position>());
    match &error.cause {
        ConstructionFailure::Resolution {
            parameter, source, ..
        } => {
            assert_eq!(*parameter, "ledger");
            assert!(matches!(source, ResolutionError::NotFound(_)));
        }
        other => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn fields_use_their_own_assisted_list() -> anyhow::Result<()> {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let session: Session = binder.create(
        assisted![String::from("ada")],
        assisted![String::from("acme"), Port(8080)],
    )?;
    assert_eq!(session.user, "ada");
    assert_eq!(session.tenant.as_deref(), Some("acme"));
    assert_eq!(session.port, Some(Port(8080)));
    assert_eq!(session.datasource.map(|ds| ds.0), Some("replica"));
    assert!(session.ready);

    let error = binder
        .create::<Session>(assisted![String::from("ada")], assisted![String::from("acme")])
        .unwrap_err();
    assert!(matches!(
        error.cause,
        ConstructionFailure::ArgumentCountMismatch {
            scope: BindingScope::Fields,
            ..
        }
    ));
    Ok(())
}

#[test]
fn validated_field_rejects_violations() {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container)
        .validator(ConstraintValidator::new().with::<Port>())
        .validate_parameters(true);

    let error = binder
        .create::<Session>(
            assisted![String::from("ada")],
            assisted![String::from("acme"), Port(80)],
        )
        .unwrap_err();
    match error.cause {
        ConstructionFailure::ParameterValidation {
            scope,
            parameter,
            violations,
        } => {
            assert_eq!(scope, BindingScope::Fields);
            assert_eq!(parameter, "port");
            assert_eq!(violations.len(), 1);
        }
        other => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn failing_hook_discards_the_instance() {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let error = binder
        .create::<Session>(
            assisted![String::from("ada")],
            assisted![String::new(), Port(8080)],
        )
        .unwrap_err();
    assert!(matches!(
        error.cause,
        ConstructionFailure::PostConstruct { hook: "ready", .. }
    ));
    assert!(error.to_string().contains("tenant must not be blank"));
}

#[test]
fn eligible_constructor_is_chosen() -> anyhow::Result<()> {
    initialize_tracing();
    let container = container();
    let binder = ConstructorBinder::new(&container);

    let report: Report = binder.create_with(assisted![])?;
    assert_eq!(report.source, "main");
    Ok(())
}
