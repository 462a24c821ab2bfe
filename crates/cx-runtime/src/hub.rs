//! Event hub — handler registration tables and the dispatch engine.
//!
//! Two-tier topology: each conscious entity owns a local handler table
//! scoped to its `on` registrations; a single hub instance federates across
//! entities for events not resolved locally and for cross-entity
//! broadcasts. The hub is an explicitly constructed object handed to every
//! entity at creation — never a hidden process-wide singleton — so isolated
//! hubs can run side by side (parallel tests included).
//!
//! Locking discipline: registration and deregistration take the table's
//! write lock and swap in a fresh snapshot; dispatch clones the snapshot
//! `Arc` out under the read lock and invokes handlers with no lock held, so
//! concurrent emissions never wait on a registration.

use crate::entity::{EntityId, EntityState, Lifecycle};
use crate::error::{Result, RuntimeError};
use crate::event::{ChainItem, CxEvent, ERROR_EVENT};
use crate::value::{map_of, Value};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

/// Dispatch scope: the hub-wide tier or a single entity instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The cross-entity tier
    Global,
    /// A conscious entity instance's local tier
    Entity(EntityId),
}

impl Scope {
    /// The entity id, when this is an entity scope.
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Scope::Global => None,
            Scope::Entity(id) => Some(id),
        }
    }
}

/// Context passed to every handler invocation.
///
/// Carries the scope the triggering emission ran in and the causal-chain
/// depth of this delivery, so a handler's own emissions (and any parked
/// work) stay tied to the right entity and chain.
#[derive(Debug, Clone)]
pub struct DispatchCtx {
    /// Scope of the triggering emission
    pub scope: Scope,
    /// Depth of this delivery within its causal chain (first delivery is 1)
    pub depth: u32,
}

/// A registered handler.
///
/// Handlers are shared closures over the event and its dispatch context —
/// interpreter-backed for `on` statements, plain Rust for native
/// capability bindings and tests.
pub type HandlerFn = Arc<dyn Fn(&CxEvent, &DispatchCtx) -> Result<()> + Send + Sync>;

/// Hub limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Maximum causal-chain depth before an emission is rejected.
    ///
    /// Legitimate pipelines can be long, so the default is generous; the
    /// limit exists to turn runaway recursion into an error instead of a
    /// stack overflow.
    pub max_dispatch_depth: u32,
    /// Maximum pending-queue depth before posts are rejected.
    pub max_queue_depth: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: 64,
            max_queue_depth: 1024,
        }
    }
}

/// Ordered handler registrations keyed by full event name.
///
/// Each event's handler list is behind an `Arc` snapshot: registration
/// builds a new list and swaps it in, dispatch clones the `Arc` out.
pub struct HandlerTable {
    inner: RwLock<HashMap<String, Arc<Vec<HandlerFn>>>>,
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Append a handler for an event name, preserving registration order.
    pub fn register(&self, event: &str, handler: HandlerFn) {
        let mut inner = self.inner.write();
        let next = match inner.get(event) {
            Some(existing) => {
                let mut list: Vec<HandlerFn> = existing.as_ref().clone();
                list.push(handler);
                Arc::new(list)
            }
            None => Arc::new(vec![handler]),
        };
        inner.insert(event.to_string(), next);
    }

    /// Snapshot the handler list for an event name.
    pub fn snapshot(&self, event: &str) -> Option<Arc<Vec<HandlerFn>>> {
        self.inner.read().get(event).cloned()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Number of handlers registered for an event name.
    pub fn count(&self, event: &str) -> usize {
        self.inner.read().get(event).map_or(0, |list| list.len())
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Token identifying a parked handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParkToken(u64);

struct Parked {
    entity: EntityId,
    reply: String,
    cancelled: bool,
}

/// A message on the hub's pending queue.
enum HubMessage {
    Emit {
        scope: Scope,
        event: String,
        payload: Value,
        chain: Vec<ChainItem>,
    },
    Completion {
        token: ParkToken,
        result: std::result::Result<Value, String>,
    },
}

/// The event hub.
///
/// Owns the global handler table, the entity registry, the bounded pending
/// queue, and the parked-invocation table. See the module docs for the
/// topology and locking discipline.
pub struct EventHub {
    config: HubConfig,
    self_weak: Weak<EventHub>,
    global: HandlerTable,
    entities: RwLock<HashMap<EntityId, Arc<EntityState>>>,
    serials: Mutex<HashMap<String, u64>>,
    queue: Mutex<VecDeque<HubMessage>>,
    parked: Mutex<HashMap<u64, Parked>>,
    next_token: Mutex<u64>,
}

impl EventHub {
    /// Create a hub with the given limits.
    pub fn new(config: HubConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            config,
            self_weak: self_weak.clone(),
            global: HandlerTable::new(),
            entities: RwLock::new(HashMap::new()),
            serials: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            parked: Mutex::new(HashMap::new()),
            next_token: Mutex::new(0),
        })
    }

    /// The hub's limits.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    // === Entity registry ===

    /// Construct a new entity instance of the given type.
    ///
    /// The instance starts `Constructed`; the caller drives realize and the
    /// later transitions.
    pub fn create_entity(&self, type_name: &str) -> Arc<EntityState> {
        let serial = {
            let mut serials = self.serials.lock();
            let n = serials.entry(type_name.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        let id = EntityId(format!("{}#{}", type_name, serial));
        let entity = Arc::new(EntityState::new(id.clone(), type_name));
        self.entities.write().insert(id.clone(), entity.clone());
        tracing::debug!(entity = %id, "entity constructed");
        entity
    }

    /// Look up an entity instance.
    pub fn entity(&self, id: &EntityId) -> Result<Arc<EntityState>> {
        self.entities
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownEntity(id.0.clone()))
    }

    /// Dispose an entity: deregister its handlers, cancel its parked
    /// invocations, and discard queued deliveries addressed to it.
    ///
    /// The instance stays in the registry so later operations against it
    /// fail with a lifecycle error rather than "unknown entity".
    pub fn dispose(&self, id: &EntityId) -> Result<()> {
        let entity = self.entity(id)?;
        entity.advance(Lifecycle::Disposed)?;
        entity.handlers.clear();

        let mut cancelled = 0usize;
        for parked in self.parked.lock().values_mut() {
            if &parked.entity == id && !parked.cancelled {
                parked.cancelled = true;
                cancelled += 1;
            }
        }

        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|msg| match msg {
            HubMessage::Emit { scope, .. } => scope.entity_id() != Some(id),
            HubMessage::Completion { .. } => true,
        });
        let discarded = before - queue.len();
        drop(queue);

        tracing::info!(entity = %id, cancelled, discarded, "entity disposed");
        Ok(())
    }

    // === Registration ===

    /// Register a handler for `(scope, event)` in registration order.
    ///
    /// Fails only if the scope is a disposed entity.
    pub fn register(&self, scope: &Scope, event: &str, handler: HandlerFn) -> Result<()> {
        match scope {
            Scope::Global => {
                self.global.register(event, handler);
            }
            Scope::Entity(id) => {
                let entity = self.entity(id)?;
                entity.require_live()?;
                entity.handlers.register(event, handler);
            }
        }
        tracing::debug!(?scope, event, "handler registered");
        Ok(())
    }

    // === Dispatch ===

    /// Emit an event synchronously from outside any handler.
    pub fn emit(
        &self,
        scope: &Scope,
        event: &str,
        payload: Value,
        chain: &[ChainItem],
    ) -> Result<()> {
        self.emit_from(scope, event, payload, chain, 0)
    }

    /// Emit an event from code already running at `parent_depth` in a
    /// causal chain (0 for fresh chains).
    ///
    /// Delivery order: the emitting entity's local handlers in registration
    /// order, then global handlers in registration order. Chain items fire
    /// independently of handler outcomes, each with the base payload
    /// deep-merged under its extras (item keys win), continuing the same
    /// causal chain. Unregistered event names are ordinary no-ops.
    ///
    /// A handler error stops the remaining handlers but not the chain; the
    /// first error (handler before chain) surfaces to the caller.
    pub fn emit_from(
        &self,
        scope: &Scope,
        event: &str,
        payload: Value,
        chain: &[ChainItem],
        parent_depth: u32,
    ) -> Result<()> {
        let depth = parent_depth + 1;
        if depth > self.config.max_dispatch_depth {
            return Err(RuntimeError::DispatchDepth {
                event: event.to_string(),
                limit: self.config.max_dispatch_depth,
            });
        }

        let local = match scope {
            Scope::Global => None,
            Scope::Entity(id) => {
                let entity = self.entity(id)?;
                entity.require_live()?;
                entity.handlers.snapshot(event)
            }
        };

        let cx_event = CxEvent::new(event, payload.clone());
        let ctx = DispatchCtx {
            scope: scope.clone(),
            depth,
        };
        tracing::trace!(event, depth, ?scope, "dispatch");

        let mut first_error = None;
        let tiers = [local, self.global.snapshot(event)];
        'dispatch: for handlers in tiers.iter().flatten() {
            for handler in handlers.iter() {
                if let Err(error) = handler(&cx_event, &ctx) {
                    first_error = Some(error);
                    break 'dispatch;
                }
            }
        }

        for item in chain {
            let merged = match &item.extra {
                Some(extra) => Value::deep_merge(&payload, extra),
                None => payload.clone(),
            };
            if let Err(error) = self.emit_from(scope, &item.event, merged, &[], depth) {
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // === Pending queue ===

    /// Post an emission onto the pending queue for the next pump.
    ///
    /// Rejects with a backpressure error when the queue is at its bound;
    /// the caller decides whether to retry or drop.
    pub fn post_emit(
        &self,
        scope: Scope,
        event: impl Into<String>,
        payload: Value,
        chain: Vec<ChainItem>,
    ) -> Result<()> {
        let event = event.into();
        let mut queue = self.queue.lock();
        if queue.len() >= self.config.max_queue_depth {
            return Err(RuntimeError::Backpressure {
                event,
                limit: self.config.max_queue_depth,
            });
        }
        queue.push_back(HubMessage::Emit {
            scope,
            event,
            payload,
            chain,
        });
        Ok(())
    }

    /// Number of messages currently pending.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drain the pending queue, dispatching each message in arrival order.
    ///
    /// Failures from queued deliveries are routed to the owning entity's
    /// `error` event rather than crashing the pump. Returns the number of
    /// messages processed.
    pub fn run_until_idle(&self) -> usize {
        let mut processed = 0usize;
        loop {
            let message = self.queue.lock().pop_front();
            let Some(message) = message else {
                break;
            };
            processed += 1;

            match message {
                HubMessage::Emit {
                    scope,
                    event,
                    payload,
                    chain,
                } => {
                    if let Err(error) = self.emit(&scope, &event, payload, &chain) {
                        self.route_failure(&scope, &event, error);
                    }
                }
                HubMessage::Completion { token, result } => self.resume(token, result),
            }
        }
        processed
    }

    // === Parked continuations ===

    /// Park a handler invocation on behalf of an entity.
    ///
    /// The returned token is handed to the external operation; when its
    /// completion arrives (via [`CompletionSender`]), the hub resumes by
    /// emitting `reply` on the owning entity. Disposal of the entity marks
    /// the parked invocation cancelled, and a late completion is discarded.
    pub fn park(&self, entity: &EntityId, reply: impl Into<String>) -> Result<ParkToken> {
        let state = self.entity(entity)?;
        state.require_live()?;

        let token = {
            let mut next = self.next_token.lock();
            *next += 1;
            ParkToken(*next)
        };
        self.parked.lock().insert(
            token.0,
            Parked {
                entity: entity.clone(),
                reply: reply.into(),
                cancelled: false,
            },
        );
        tracing::debug!(entity = %entity, token = token.0, "invocation parked");
        Ok(token)
    }

    /// Whether a parked invocation is still waiting (not resumed, not
    /// cancelled).
    pub fn is_parked(&self, token: ParkToken) -> bool {
        self.parked
            .lock()
            .get(&token.0)
            .map_or(false, |p| !p.cancelled)
    }

    /// Resume a parked invocation from a completion message.
    fn resume(&self, token: ParkToken, result: std::result::Result<Value, String>) {
        let Some(parked) = self.parked.lock().remove(&token.0) else {
            tracing::warn!(token = token.0, "completion for unknown park token");
            return;
        };
        if parked.cancelled {
            tracing::debug!(entity = %parked.entity, token = token.0, "late completion discarded");
            return;
        }

        let scope = Scope::Entity(parked.entity.clone());
        match result {
            Ok(value) => {
                if let Err(error) = self.emit(&scope, &parked.reply, value, &[]) {
                    self.route_failure(&scope, &parked.reply, error);
                }
            }
            Err(message) => {
                let payload = map_of([("message", Value::Str(message))]);
                if let Err(error) = self.emit(&scope, ERROR_EVENT, payload, &[]) {
                    tracing::warn!(entity = %parked.entity, %error, "error event undeliverable");
                }
            }
        }
    }

    /// Obtain a cross-thread completion handle for parked invocations.
    pub fn completion_sender(&self) -> CompletionSender {
        CompletionSender {
            hub: self.self_weak.clone(),
        }
    }

    /// Deliver a queued-dispatch failure to the owning entity's `error`
    /// event, or log it when there is no live owner.
    fn route_failure(&self, scope: &Scope, event: &str, error: RuntimeError) {
        let live_entity = scope
            .entity_id()
            .and_then(|id| self.entity(id).ok())
            .filter(|e| !e.is_disposed());

        match live_entity {
            Some(_) => {
                let payload = map_of([
                    ("event", Value::Str(event.to_string())),
                    ("kind", Value::Str(error.kind().to_string())),
                    ("message", Value::Str(error.to_string())),
                ]);
                if let Err(second) = self.emit(scope, ERROR_EVENT, payload, &[]) {
                    tracing::warn!(%error, %second, "error event undeliverable");
                }
            }
            None => {
                tracing::warn!(event, %error, "queued dispatch failed with no live owner");
            }
        }
    }
}

/// Clonable, thread-safe handle used by external operations to complete a
/// parked invocation.
///
/// Completion never re-enters dispatch synchronously — it posts a message
/// onto the hub's queue, honoring the queue bound.
#[derive(Clone)]
pub struct CompletionSender {
    hub: Weak<EventHub>,
}

impl CompletionSender {
    /// Post a completion for a parked invocation.
    ///
    /// `Ok` values resume the parked reply event; `Err` messages are
    /// delivered to the owning entity's `error` event. Returns a
    /// backpressure error if the queue is full, and succeeds trivially if
    /// the hub is gone.
    pub fn complete(
        &self,
        token: ParkToken,
        result: std::result::Result<Value, String>,
    ) -> Result<()> {
        let Some(hub) = self.hub.upgrade() else {
            return Ok(());
        };
        let mut queue = hub.queue.lock();
        if queue.len() >= hub.config.max_queue_depth {
            return Err(RuntimeError::Backpressure {
                event: "completion".to_string(),
                limit: hub.config.max_queue_depth,
            });
        }
        queue.push_back(HubMessage::Completion { token, result });
        Ok(())
    }
}
