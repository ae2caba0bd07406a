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

use acton_cdi::prelude::*;

use crate::setup::initialize_tracing;

mod setup;

#[derive(Debug)]
struct Ping;

#[derive(Debug)]
struct SetLimit(u32);

impl Validate for SetLimit {
    fn validate(&self) -> Violations {
        let mut violations = Violations::none();
        violations.check(self.0 <= 100, "0", "must be at most 100");
        violations
    }
}

#[derive(Debug)]
struct LimitExceeded;

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("limit reached")
    }
}

impl std::error::Error for LimitExceeded {}

#[derive(Debug, Default)]
struct Throttle {
    limit: u32,
    pings: u32,
}

#[acton_handlers]
impl Throttle {
    #[handler]
    fn on_ping(&mut self, _msg: &Ping) -> Result<(), LimitExceeded> {
        if self.pings >= self.limit {
            return Err(LimitExceeded);
        }
        self.pings += 1;
        Ok(())
    }

    #[handler(validated, name = "set_limit")]
    fn on_set_limit(&mut self, msg: &SetLimit) {
        self.limit = msg.0;
    }

    fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.pings)
    }
}

#[derive(Debug)]
struct Reset;

#[derive(Debug, Default)]
struct Resettable {
    resets: u32,
}

#[acton_handlers]
impl Resettable {
    #[handler]
    #[allow(clippy::unused_unit)]
    fn on_reset(&mut self, _msg: &Reset) -> () {
        self.resets += 1;
    }
}

#[derive(Debug, Default)]
struct LoggedThrottle {
    throttle: Throttle,
    logged: Vec<&'static str>,
}

#[acton_handlers(extends = Throttle, via = throttle)]
impl LoggedThrottle {
    #[handler]
    fn on_ping(&mut self, msg: &Ping) -> Result<(), BoxError> {
        self.logged.push("ping");
        self.throttle.on_ping(msg)?;
        Ok(())
    }
}

#[test]
fn generated_source_declares_every_handler() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<Throttle>()?;

    assert_eq!(table.len(), 2);
    let ping = table.get_for::<Ping>().expect("ping handler");
    assert_eq!(ping.handler_name(), "on_ping");
    assert!(!ping.requires_validation());

    let set_limit = table.get_for::<SetLimit>().expect("set_limit handler");
    assert_eq!(set_limit.handler_name(), "set_limit");
    assert!(set_limit.requires_validation());
    Ok(())
}

#[test]
fn generated_handlers_dispatch() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<Throttle>()?;
    let mut dispatcher = BoundDispatcher::builder(Throttle::default(), table)
        .validator(ConstraintValidator::new().with::<SetLimit>())
        .validate_messages(true)
        .build();

    assert!(matches!(
        dispatcher.dispatch(&SetLimit(500)),
        Err(DispatchError::Validation { .. })
    ));
    dispatcher.dispatch(&SetLimit(1))?;
    dispatcher.dispatch(&Ping)?;
    assert_eq!(dispatcher.instance().remaining(), 0);

    let error = dispatcher.dispatch(&Ping).unwrap_err();
    assert_eq!(error.handler().name, "on_ping");
    assert!(error.to_string().contains("limit reached"));
    Ok(())
}

#[test]
fn extends_inherits_and_overrides() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<LoggedThrottle>()?;
    assert_eq!(table.len(), 2);

    let ping = table.get_for::<Ping>().expect("overridden ping handler");
    assert_eq!(ping.declaring_class(), ClassId::of::<LoggedThrottle>());
    let set_limit = table.get_for::<SetLimit>().expect("inherited set_limit handler");
    assert_eq!(set_limit.declaring_class(), ClassId::of::<Throttle>());

    let mut dispatcher = BoundDispatcher::builder(LoggedThrottle::default(), table).build();
    dispatcher.dispatch(&SetLimit(2))?;
    dispatcher.dispatch(&Ping)?;
    assert_eq!(dispatcher.instance().logged, ["ping"]);
    assert_eq!(dispatcher.instance().throttle.remaining(), 1);
    Ok(())
}

#[test]
fn explicit_unit_return_is_infallible() -> anyhow::Result<()> {
    initialize_tracing();
    let registry = MessageHandlerRegistry::new();
    let table = registry.handlers_for::<Resettable>()?;

    let reset = table.get_for::<Reset>().expect("reset handler");
    assert_eq!(reset.return_type(), "()");

    let mut dispatcher = BoundDispatcher::builder(Resettable::default(), table).build();
    dispatcher.dispatch(&Reset)?;
    dispatcher.dispatch(&Reset)?;
    assert_eq!(dispatcher.instance().resets, 2);
    Ok(())
}
