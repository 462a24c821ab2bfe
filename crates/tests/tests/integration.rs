//! Integration tests for end-to-end Cx execution.
//!
//! These tests drive the full pipeline — parse → load → dispatch — and pin
//! down the language's observable dispatch contract: exact-name matching,
//! registration-order delivery, chain payload merging, lifecycle and
//! recursion limits, and parked-continuation cancellation.

use cx_tests::TestHarness;

use cx_runtime::{
    map_of, EntityId, HubConfig, RuntimeError, Scope, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Dispatch requires an exact full-name match: no prefix, no wildcard.
#[test]
fn test_exact_name_dispatch_only() {
    let harness = TestHarness::from_source(
        r#"
        on a.b.c (e) { print("hit"); }
        "#,
    );

    harness.emit("a.b.c").unwrap();
    harness.emit("a.b").unwrap();
    harness.emit("a.b.c.d").unwrap();

    assert_eq!(harness.printed(), vec!["hit"]);
}

/// Unregistered event names are ordinary no-ops, never errors.
#[test]
fn test_unregistered_event_is_legal() {
    let harness = TestHarness::from_source("emit no.such.event {};");
    harness.emit("still.nobody.listening").unwrap();
    assert!(harness.printed().is_empty());
}

/// Chain-item keys override base payload keys in the merged payload.
#[test]
fn test_handler_chain_payload_merge() {
    let harness = TestHarness::from_source(
        r#"
        on z.w (e) { print(e.payload.n); }
        emit x.y { n: 1, handlers: [ z.w { n: 2 } ] };
        "#,
    );
    assert_eq!(harness.printed(), vec!["2"]);
}

/// Chain items without extras receive the base payload untouched, and fire
/// in declaration order after direct handlers.
#[test]
fn test_handler_chain_ordering_and_base_payload() {
    let harness = TestHarness::from_source(
        r#"
        on first.step (e) { print("first", e.payload.n); }
        on second.step (e) { print("second", e.payload.n); }
        on start (e) { print("direct"); }
        emit start { n: 7, handlers: [ first.step, second.step { n: 8 } ] };
        "#,
    );
    assert_eq!(
        harness.printed(),
        vec!["direct", "first 7", "second 8"]
    );
}

/// The spec's core scenario: a handler emits a second event whose handler
/// observes the payload — exactly once.
#[test]
fn test_emit_from_handler_scenario() {
    let harness = TestHarness::from_source(
        r#"
        on a.b (e) { emit c.d { x: 1 }; }
        on c.d (e) { print(e.payload.x); }
        emit a.b {};
        "#,
    );
    assert_eq!(harness.printed(), vec!["1"]);
}

/// Handlers for the same `(scope, event)` fire in registration order,
/// stably across repeated runs.
#[test]
fn test_registration_order_is_deterministic() {
    let source = r#"
        on seq.go (e) { print("first"); }
        on seq.go (e) { print("second"); }
        on seq.go (e) { print("third"); }
        emit seq.go {};
    "#;
    for _ in 0..5 {
        let harness = TestHarness::from_source(source);
        assert_eq!(harness.printed(), vec!["first", "second", "third"]);
    }
}

/// Recursive emission chains succeed up to the configured depth and fail
/// with a dispatch-depth error beyond it — an error, not a stack overflow.
#[test]
fn test_recursion_limit_is_an_error_not_a_crash() {
    let harness = TestHarness::with_config(
        HubConfig {
            max_dispatch_depth: 10,
            ..HubConfig::default()
        },
        r#"
        on loop.step (e) { print("step"); emit loop.step {}; }
        "#,
    );

    let err = harness.emit("loop.step").unwrap_err();
    assert!(matches!(err, RuntimeError::DispatchDepth { limit: 10, .. }));
    assert_eq!(harness.printed().len(), 10);
}

/// A pipeline within the limit completes normally.
#[test]
fn test_long_pipeline_within_limit() {
    let harness = TestHarness::from_source(
        r#"
        on think.start (e) { emit adapt.weights { from: "think" }; }
        on adapt.weights (e) { emit think.done { from: e.payload.from }; }
        on think.done (e) { print("done after", e.payload.from); }
        emit think.start {};
        "#,
    );
    assert_eq!(harness.printed(), vec!["done after think"]);
}

/// Entity lifecycle: realize runs once, declared handlers receive events,
/// fields mutate per instance, and disposal makes later operations fail.
#[test]
fn test_entity_lifecycle_and_fields() {
    let harness = TestHarness::from_source(
        r#"
        conscious Counter {
            let count = 0;

            realize() {
                emit counter.ready {};
            }

            on counter.ready (e) {
                self.count = 100;
            }

            on tick (e) {
                self.count = self.count + 1;
                emit counter.value { n: self.count };
            }
        }

        on counter.value (e) { print(e.payload.n); }

        let id = new Counter;
        "#,
    );

    // realize()'s own emission was received locally before activation
    // completed; ticks go through the entity's scope.
    let runtime = harness.runtime();
    let id = EntityId::from("Counter#1");
    let scope = Scope::Entity(id.clone());

    runtime
        .hub()
        .emit(&scope, "tick", Value::empty_map(), &[])
        .unwrap();
    runtime
        .hub()
        .emit(&scope, "tick", Value::empty_map(), &[])
        .unwrap();
    assert_eq!(harness.printed(), vec!["101", "102"]);

    runtime.dispose(&id).unwrap();
    let err = runtime
        .hub()
        .emit(&scope, "tick", Value::empty_map(), &[])
        .unwrap_err();
    assert_eq!(err.kind(), "lifecycle");
}

/// Two instances of the same entity type keep separate fields and handler
/// scopes.
#[test]
fn test_entity_instances_are_isolated() {
    let harness = TestHarness::from_source(
        r#"
        conscious Cell {
            let n = 0;
            on bump (e) {
                self.n = self.n + 1;
                emit cell.report { who: self, n: self.n };
            }
        }
        on cell.report (e) { print(e.payload.who, e.payload.n); }
        let a = new Cell;
        let b = new Cell;
        "#,
    );

    let hub = harness.runtime().hub();
    let a = Scope::Entity(EntityId::from("Cell#1"));
    let b = Scope::Entity(EntityId::from("Cell#2"));

    hub.emit(&a, "bump", Value::empty_map(), &[]).unwrap();
    hub.emit(&a, "bump", Value::empty_map(), &[]).unwrap();
    hub.emit(&b, "bump", Value::empty_map(), &[]).unwrap();

    assert_eq!(
        harness.printed(),
        vec!["Cell#1 1", "Cell#1 2", "Cell#2 1"]
    );
}

/// Disposing an entity mid-flight: a parked invocation never resumes, even
/// when its external completion later arrives.
#[test]
fn test_disposal_cancels_parked_continuations() {
    let harness = TestHarness::from_source(
        r#"
        conscious Thinker {
            on ai.think.result (e) {
                print("resumed", e.payload);
            }
            on question (e) {
                think "ponder the question";
            }
        }
        let id = new Thinker;
        "#,
    );

    let runtime = harness.runtime();
    let hub = runtime.hub().clone();
    let id = EntityId::from("Thinker#1");

    // Native capability binding: park the invocation for the emitting
    // entity and hand the token to the "provider".
    let tokens = Arc::new(Mutex::new(Vec::new()));
    {
        let hub = hub.clone();
        let tokens = tokens.clone();
        runtime
            .register_native(
                &Scope::Global,
                "ai.think",
                Arc::new(move |event, ctx| {
                    let entity = ctx.scope.entity_id().expect("entity-scoped request");
                    let reply = match event.payload.get("reply") {
                        Some(Value::Str(reply)) => reply.clone(),
                        other => panic!("missing reply event: {:?}", other),
                    };
                    tokens.lock().push(hub.park(entity, reply)?);
                    Ok(())
                }),
            )
            .unwrap();
    }

    hub.emit(
        &Scope::Entity(id.clone()),
        "question",
        Value::empty_map(),
        &[],
    )
    .unwrap();
    let token = tokens.lock()[0];
    assert!(hub.is_parked(token));

    // Dispose while the provider is still "working"; the completion
    // arrives afterwards and must be discarded.
    let sender = hub.completion_sender();
    runtime.dispose(&id).unwrap();
    sender
        .complete(token, Ok(Value::Str("too late".into())))
        .unwrap();
    harness.pump();

    assert!(harness.printed().is_empty());
    assert!(!hub.is_parked(token));
}

/// The happy path of the same flow: the completion resumes the parked
/// reply event on the owning entity.
#[test]
fn test_parked_continuation_resumes_on_completion() {
    let harness = TestHarness::from_source(
        r#"
        conscious Thinker {
            on ai.think.result (e) {
                print("resumed:", e.payload.answer);
            }
            on question (e) {
                think "ponder";
            }
        }
        let id = new Thinker;
        "#,
    );

    let runtime = harness.runtime();
    let hub = runtime.hub().clone();

    let tokens = Arc::new(Mutex::new(Vec::new()));
    {
        let hub = hub.clone();
        let tokens = tokens.clone();
        runtime
            .register_native(
                &Scope::Global,
                "ai.think",
                Arc::new(move |event, ctx| {
                    let entity = ctx.scope.entity_id().expect("entity-scoped request");
                    let Some(Value::Str(reply)) = event.payload.get("reply") else {
                        panic!("missing reply event");
                    };
                    tokens.lock().push(hub.park(entity, reply.clone())?);
                    Ok(())
                }),
            )
            .unwrap();
    }

    hub.emit(
        &Scope::Entity(EntityId::from("Thinker#1")),
        "question",
        Value::empty_map(),
        &[],
    )
    .unwrap();

    let token = tokens.lock()[0];
    hub.completion_sender()
        .complete(token, Ok(map_of([("answer", Value::Int(42))])))
        .unwrap();
    harness.pump();

    assert_eq!(harness.printed(), vec!["resumed: 42"]);
}

/// Queue overflow rejects new posts with a backpressure error; draining
/// restores capacity.
#[test]
fn test_backpressure_on_queue_bound() {
    let harness = TestHarness::with_config(
        HubConfig {
            max_queue_depth: 3,
            ..HubConfig::default()
        },
        "on tick (e) { print(\"tick\"); }",
    );

    let hub = harness.runtime().hub();
    for _ in 0..3 {
        hub.post_emit(Scope::Global, "tick", Value::empty_map(), vec![])
            .unwrap();
    }
    let err = hub
        .post_emit(Scope::Global, "tick", Value::empty_map(), vec![])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Backpressure { limit: 3, .. }));

    assert_eq!(harness.pump(), 3);
    assert_eq!(harness.printed().len(), 3);
    hub.post_emit(Scope::Global, "tick", Value::empty_map(), vec![])
        .unwrap();
}

/// Errors raised by a queued delivery are routed to the owning entity's
/// `error` event instead of crashing the pump.
#[test]
fn test_queued_failure_routes_to_error_event() {
    let harness = TestHarness::from_source(
        r#"
        conscious Fragile {
            on error (e) {
                print("error:", e.payload.kind);
            }
            on risky (e) {
                throw "handler exploded";
            }
        }
        let id = new Fragile;
        "#,
    );

    let hub = harness.runtime().hub();
    hub.post_emit(
        Scope::Entity(EntityId::from("Fragile#1")),
        "risky",
        Value::empty_map(),
        vec![],
    )
    .unwrap();
    harness.pump();

    assert_eq!(harness.printed(), vec!["error: thrown"]);
}

/// Two runtimes are fully isolated: no hidden process-wide hub.
#[test]
fn test_isolated_runtimes() {
    let first = TestHarness::from_source(
        r#"
        on shared.name (e) { print("first"); }
        "#,
    );
    let second = TestHarness::from_source(
        r#"
        on shared.name (e) { print("second"); }
        "#,
    );

    first.emit("shared.name").unwrap();
    assert_eq!(first.printed(), vec!["first"]);
    assert!(second.printed().is_empty());
}

/// Payloads are plain data, decoupled from entity internals: they
/// round-trip through JSON with property order intact.
#[test]
fn test_payloads_serialize_round_trip() {
    let payload = map_of([
        ("z", Value::Int(1)),
        ("a", Value::List(vec![Value::Bool(true), Value::Null])),
        ("m", map_of([("nested", Value::Float(0.5))])),
    ]);

    let json = serde_json::to_string(&payload).unwrap();
    assert_eq!(json, r#"{"z":1,"a":[true,null],"m":{"nested":0.5}}"#);

    let back: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back, payload);
}

/// Payloads are structured values: nested maps and lists survive the trip
/// through emit, merge, and handler binding with order intact.
#[test]
fn test_structured_payloads_round_trip() {
    let harness = TestHarness::from_source(
        r#"
        on data.in (e) {
            print(e.payload.tags[1], e.payload.meta.depth, len(e.payload.tags));
        }
        emit data.in {
            tags: ["a", "b", "c"],
            meta: { depth: 2 }
        };
        "#,
    );
    assert_eq!(harness.printed(), vec!["b 2 3"]);
}
