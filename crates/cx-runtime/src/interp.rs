//! Tree-walking interpreter.
//!
//! Executes statement blocks against the hub: realize bodies, handler
//! bodies, and top-level program statements. Evaluation is an exhaustive
//! `match` over the closed statement and expression enums; the interpreter
//! never mutates the AST and holds no lock while dispatching.

use crate::entity::{EntityId, EntityState, Lifecycle};
use crate::error::{Result, RuntimeError};
use crate::event::{ChainItem, CxEvent};
use crate::hub::{DispatchCtx, EventHub, HandlerFn, HubConfig, Scope};
use crate::output::OutputSink;
use crate::value::{map_of, Value};
use cx_ast::{
    BinaryOp, ClassDecl, EntityDecl, Expr, ExprKind, FunctionDecl, OnHandler, Program, Stmt,
    StmtKind, UnaryOp,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Control-flow outcome of executing a statement.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Execution context for one logical invocation (top-level run, realize
/// body, handler body, or function call).
struct ExecCtx {
    /// Scope the running code emits from
    scope: Scope,
    /// Owning entity, for `self` resolution
    entity: Option<Arc<EntityState>>,
    /// Causal-chain depth the code runs at
    depth: u32,
    /// Lexical scope stack; empty at the top level, where `let` declares
    /// globals
    locals: Vec<IndexMap<String, Value>>,
}

impl ExecCtx {
    fn top_level() -> Self {
        Self {
            scope: Scope::Global,
            entity: None,
            depth: 0,
            locals: Vec::new(),
        }
    }
}

/// Assignment target root.
enum Root {
    Local { frame: usize, name: String },
    Global(String),
    SelfField(String),
}

/// One evaluated step of an assignment path.
enum Seg {
    Key(String),
    Idx(i64),
}

/// The Cx runtime: an explicitly constructed hub plus the program-level
/// declaration tables and an interpreter over them.
///
/// Multiple runtimes are fully isolated from each other — there is no
/// process-wide state.
pub struct Runtime {
    hub: Arc<EventHub>,
    self_weak: Weak<Runtime>,
    globals: Mutex<IndexMap<String, Value>>,
    functions: RwLock<HashMap<String, Arc<FunctionDecl>>>,
    classes: RwLock<HashMap<String, Arc<ClassDecl>>>,
    entity_types: RwLock<HashMap<String, Arc<EntityDecl>>>,
    output: OutputSink,
}

impl Runtime {
    /// Create a runtime with the given hub limits, printing to stdout.
    pub fn new(config: HubConfig) -> Arc<Self> {
        Self::with_output(config, OutputSink::Stdout)
    }

    /// Create a runtime with an explicit output sink.
    pub fn with_output(config: HubConfig, output: OutputSink) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            hub: EventHub::new(config),
            self_weak: self_weak.clone(),
            globals: Mutex::new(IndexMap::new()),
            functions: RwLock::new(HashMap::new()),
            classes: RwLock::new(HashMap::new()),
            entity_types: RwLock::new(HashMap::new()),
            output,
        })
    }

    /// The underlying hub.
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Load a parsed program: execute its top-level statements in order.
    ///
    /// Declarations register; plain statements run. Handler registration
    /// order is the statement execution order.
    pub fn load(&self, program: &Program) -> Result<()> {
        let mut ctx = ExecCtx::top_level();
        for stmt in &program.body {
            match self.exec_stmt(&mut ctx, stmt)? {
                Flow::Normal => {}
                Flow::Break | Flow::Continue => {
                    return Err(RuntimeError::Type(
                        "`break`/`continue` outside of a loop".to_string(),
                    ));
                }
                Flow::Return(_) => {
                    return Err(RuntimeError::Type(
                        "`return` outside of a function".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Emit an event from the outside world (global scope, fresh chain).
    pub fn emit(&self, event: &str, payload: Value) -> Result<()> {
        self.hub.emit(&Scope::Global, event, payload, &[])
    }

    /// Drain the hub's pending queue.
    pub fn run_until_idle(&self) -> usize {
        self.hub.run_until_idle()
    }

    /// Spawn an instance of a declared entity type.
    pub fn spawn(&self, type_name: &str) -> Result<EntityId> {
        let decl = self
            .entity_types
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| RuntimeError::Undefined(type_name.to_string()))?;
        self.spawn_entity(&decl, 0)
    }

    /// Dispose an entity instance.
    pub fn dispose(&self, id: &EntityId) -> Result<()> {
        self.hub.dispose(id)
    }

    /// Register a native handler (capability bindings, tests).
    pub fn register_native(&self, scope: &Scope, event: &str, handler: HandlerFn) -> Result<()> {
        self.hub.register(scope, event, handler)
    }

    // === Statements ===

    fn exec_block(&self, ctx: &mut ExecCtx, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            match self.exec_stmt(ctx, stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, ctx: &mut ExecCtx, stmt: &Stmt) -> Result<Flow> {
        match &stmt.kind {
            StmtKind::Let { name, init } => {
                let value = match init {
                    Some(init) => self.eval(ctx, init)?,
                    None => Value::Null,
                };
                match ctx.locals.last_mut() {
                    Some(frame) => {
                        frame.insert(name.clone(), value);
                    }
                    None => {
                        self.globals.lock().insert(name.clone(), value);
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::Assign { target, value } => {
                let value = self.eval(ctx, value)?;
                self.assign(ctx, target, value)?;
                Ok(Flow::Normal)
            }

            StmtKind::Function(decl) => {
                let mut functions = self.functions.write();
                if functions.contains_key(&decl.name) {
                    return Err(RuntimeError::Duplicate(decl.name.clone()));
                }
                functions.insert(decl.name.clone(), Arc::new(decl.clone()));
                Ok(Flow::Normal)
            }

            StmtKind::Class(decl) => {
                let mut classes = self.classes.write();
                if classes.contains_key(&decl.name) {
                    return Err(RuntimeError::Duplicate(decl.name.clone()));
                }
                classes.insert(decl.name.clone(), Arc::new(decl.clone()));
                Ok(Flow::Normal)
            }

            StmtKind::Entity(decl) => {
                let mut entity_types = self.entity_types.write();
                if entity_types.contains_key(&decl.name) {
                    return Err(RuntimeError::Duplicate(decl.name.clone()));
                }
                entity_types.insert(decl.name.clone(), Arc::new(decl.clone()));
                Ok(Flow::Normal)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(ctx, condition)?.is_truthy() {
                    self.exec_stmt(ctx, then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(ctx, else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            StmtKind::While { condition, body } => {
                while self.eval(ctx, condition)?.is_truthy() {
                    match self.exec_stmt(ctx, body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                ctx.locals.push(IndexMap::new());
                let result = (|| {
                    if let Some(init) = init {
                        self.exec_stmt(ctx, init)?;
                    }
                    loop {
                        if let Some(condition) = condition {
                            if !self.eval(ctx, condition)?.is_truthy() {
                                break;
                            }
                        }
                        match self.exec_stmt(ctx, body)? {
                            Flow::Normal | Flow::Continue => {}
                            Flow::Break => break,
                            flow @ Flow::Return(_) => return Ok(flow),
                        }
                        if let Some(step) = step {
                            self.exec_stmt(ctx, step)?;
                        }
                    }
                    Ok(Flow::Normal)
                })();
                ctx.locals.pop();
                result
            }

            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(ctx, value)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            StmtKind::Try {
                body,
                binding,
                handler,
            } => {
                ctx.locals.push(IndexMap::new());
                let outcome = self.exec_block(ctx, body);
                ctx.locals.pop();

                let caught = match outcome {
                    Ok(flow) => return Ok(flow),
                    Err(RuntimeError::Thrown(value)) => value,
                    Err(
                        error @ (RuntimeError::Lifecycle { .. }
                        | RuntimeError::Backpressure { .. }
                        | RuntimeError::DispatchDepth { .. }),
                    ) => map_of([
                        ("error", Value::Str(error.kind().to_string())),
                        ("message", Value::Str(error.to_string())),
                    ]),
                    Err(other) => return Err(other),
                };

                ctx.locals.push(IndexMap::new());
                if let Some(binding) = binding {
                    if let Some(frame) = ctx.locals.last_mut() {
                        frame.insert(binding.clone(), caught);
                    }
                }
                let flow = self.exec_block(ctx, handler);
                ctx.locals.pop();
                flow
            }

            StmtKind::Throw(value) => {
                let value = self.eval(ctx, value)?;
                Err(RuntimeError::Thrown(value))
            }

            StmtKind::On(handler) => {
                self.register_handler(ctx, handler)?;
                Ok(Flow::Normal)
            }

            StmtKind::Emit(emit) => {
                let mut payload = IndexMap::new();
                for (key, expr) in &emit.payload {
                    payload.insert(key.clone(), self.eval(ctx, expr)?);
                }
                let mut chain = Vec::with_capacity(emit.chain.len());
                for item in &emit.chain {
                    let extra = if item.extra.is_empty() {
                        None
                    } else {
                        let mut extra = IndexMap::new();
                        for (key, expr) in &item.extra {
                            extra.insert(key.clone(), self.eval(ctx, expr)?);
                        }
                        Some(Value::Map(extra))
                    };
                    chain.push(ChainItem {
                        event: item.event.full_name(),
                        extra,
                    });
                }
                self.hub.emit_from(
                    &ctx.scope,
                    &emit.event.full_name(),
                    Value::Map(payload),
                    &chain,
                    ctx.depth,
                )?;
                Ok(Flow::Normal)
            }

            StmtKind::AiCall {
                verb,
                goal,
                options,
            } => {
                let goal = self.eval(ctx, goal)?;
                let options = match options {
                    Some(options) => self.eval(ctx, options)?,
                    None => Value::Null,
                };
                let reply = match options.get("reply") {
                    Some(Value::Str(reply)) => reply.clone(),
                    _ => format!("ai.{}.result", verb.as_str()),
                };
                let payload = map_of([
                    ("goal", goal),
                    ("options", options),
                    ("reply", Value::Str(reply)),
                ]);
                self.hub.emit_from(
                    &ctx.scope,
                    &verb.event_name().full_name(),
                    payload,
                    &[],
                    ctx.depth,
                )?;
                Ok(Flow::Normal)
            }

            StmtKind::Expr(expr) => {
                self.eval(ctx, expr)?;
                Ok(Flow::Normal)
            }

            StmtKind::Block(stmts) => {
                ctx.locals.push(IndexMap::new());
                let flow = self.exec_block(ctx, stmts);
                ctx.locals.pop();
                flow
            }
        }
    }

    // === Handlers and entities ===

    /// Register an `on` handler at the context's scope, backed by the
    /// interpreter.
    fn register_handler(&self, ctx: &ExecCtx, handler: &OnHandler) -> Result<()> {
        let body = Arc::new(handler.body.clone());
        let param = handler.param.clone();
        let runtime = self.self_weak.clone();
        let owner = ctx.entity.as_ref().map(Arc::downgrade);

        let callback: HandlerFn = Arc::new(move |event, dispatch| {
            let Some(runtime) = runtime.upgrade() else {
                return Ok(());
            };
            let owner = owner.as_ref().and_then(Weak::upgrade);
            runtime.invoke_handler(&body, param.as_deref(), owner, event, dispatch)
        });

        self.hub
            .register(&ctx.scope, &handler.event.full_name(), callback)
    }

    /// Run a handler body for a delivered event.
    ///
    /// The body executes in its owner's scope (not the emitter's), at the
    /// delivery's causal depth, with the event reflected into the declared
    /// parameter.
    fn invoke_handler(
        &self,
        body: &[Stmt],
        param: Option<&str>,
        owner: Option<Arc<EntityState>>,
        event: &CxEvent,
        dispatch: &DispatchCtx,
    ) -> Result<()> {
        let scope = match &owner {
            Some(entity) => Scope::Entity(entity.id.clone()),
            None => Scope::Global,
        };
        let mut frame = IndexMap::new();
        if let Some(param) = param {
            frame.insert(param.to_string(), event.to_value());
        }
        let mut ctx = ExecCtx {
            scope,
            entity: owner,
            depth: dispatch.depth,
            locals: vec![frame],
        };

        match self.exec_block(&mut ctx, body)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break | Flow::Continue => Err(RuntimeError::Type(
                "`break`/`continue` outside of a loop".to_string(),
            )),
        }
    }

    /// Construct, realize, and activate an entity instance.
    ///
    /// Declared handlers register first (declaration order), so emissions
    /// from the realize body can already be received locally.
    fn spawn_entity(&self, decl: &EntityDecl, parent_depth: u32) -> Result<EntityId> {
        let entity = self.hub.create_entity(&decl.name);
        let mut ctx = ExecCtx {
            scope: Scope::Entity(entity.id.clone()),
            entity: Some(entity.clone()),
            depth: parent_depth,
            locals: vec![IndexMap::new()],
        };

        for (name, init) in &decl.fields {
            let value = match init {
                Some(init) => self.eval(&mut ctx, init)?,
                None => Value::Null,
            };
            entity.set_field(name.clone(), value);
        }

        for handler in &decl.handlers {
            self.register_handler(&ctx, handler)?;
        }

        if let Some(body) = &decl.realize {
            match self.exec_block(&mut ctx, body)? {
                Flow::Normal | Flow::Return(_) => {}
                Flow::Break | Flow::Continue => {
                    return Err(RuntimeError::Type(
                        "`break`/`continue` outside of a loop".to_string(),
                    ));
                }
            }
        }

        entity.advance(Lifecycle::Realized)?;
        entity.advance(Lifecycle::Active)?;
        Ok(entity.id.clone())
    }

    // === Expressions ===

    fn eval(&self, ctx: &mut ExecCtx, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),

            ExprKind::Ident(name) => {
                if name == "self" {
                    let entity = ctx.entity.as_ref().ok_or_else(|| {
                        RuntimeError::Type("`self` outside of an entity".to_string())
                    })?;
                    return Ok(Value::Str(entity.id.0.clone()));
                }
                for frame in ctx.locals.iter().rev() {
                    if let Some(value) = frame.get(name) {
                        return Ok(value.clone());
                    }
                }
                if let Some(value) = self.globals.lock().get(name) {
                    return Ok(value.clone());
                }
                Err(RuntimeError::Undefined(name.clone()))
            }

            ExprKind::Binary { op, left, right } => {
                // Logical operators short-circuit on truthiness.
                match op {
                    BinaryOp::And => {
                        let left = self.eval(ctx, left)?;
                        if !left.is_truthy() {
                            return Ok(Value::Bool(false));
                        }
                        let right = self.eval(ctx, right)?;
                        return Ok(Value::Bool(right.is_truthy()));
                    }
                    BinaryOp::Or => {
                        let left = self.eval(ctx, left)?;
                        if left.is_truthy() {
                            return Ok(Value::Bool(true));
                        }
                        let right = self.eval(ctx, right)?;
                        return Ok(Value::Bool(right.is_truthy()));
                    }
                    _ => {}
                }

                let left = self.eval(ctx, left)?;
                let right = self.eval(ctx, right)?;
                binary_op(*op, left, right)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.eval(ctx, operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Neg => match operand {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(RuntimeError::Type(format!(
                            "cannot negate a {}",
                            other.type_name()
                        ))),
                    },
                }
            }

            ExprKind::Call { callee, args } => self.eval_call(ctx, callee, args),

            ExprKind::Member { object, field } => {
                if let ExprKind::Ident(name) = &object.kind {
                    if name == "self" {
                        let entity = ctx.entity.as_ref().ok_or_else(|| {
                            RuntimeError::Type("`self` outside of an entity".to_string())
                        })?;
                        // Reading an unset field yields null, like a map.
                        return Ok(entity.field(field).unwrap_or(Value::Null));
                    }
                }
                let object = self.eval(ctx, object)?;
                match object {
                    Value::Map(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
                    other => Err(RuntimeError::Type(format!(
                        "cannot access field `{}` on a {}",
                        field,
                        other.type_name()
                    ))),
                }
            }

            ExprKind::Index { object, index } => {
                let object = self.eval(ctx, object)?;
                let index = self.eval(ctx, index)?;
                match (object, index) {
                    (Value::List(items), Value::Int(i)) => {
                        let idx = usize::try_from(i).map_err(|_| {
                            RuntimeError::Type(format!("negative list index {}", i))
                        })?;
                        items.get(idx).cloned().ok_or_else(|| {
                            RuntimeError::Type(format!(
                                "list index {} out of bounds (len {})",
                                idx,
                                items.len()
                            ))
                        })
                    }
                    (Value::Map(map), Value::Str(key)) => {
                        Ok(map.get(&key).cloned().unwrap_or(Value::Null))
                    }
                    (object, index) => Err(RuntimeError::Type(format!(
                        "cannot index a {} with a {}",
                        object.type_name(),
                        index.type_name()
                    ))),
                }
            }

            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(ctx, item)?);
                }
                Ok(Value::List(values))
            }

            ExprKind::Object(props) => {
                let mut map = IndexMap::new();
                for (key, value) in props {
                    map.insert(key.clone(), self.eval(ctx, value)?);
                }
                Ok(Value::Map(map))
            }

            ExprKind::New { name, args } => {
                if !args.is_empty() {
                    return Err(RuntimeError::Arity {
                        name: format!("new {}", name),
                        expected: 0,
                        got: args.len(),
                    });
                }

                let class = self.classes.read().get(name).cloned();
                if let Some(class) = class {
                    let mut map = IndexMap::new();
                    for (field, init) in &class.fields {
                        let value = match init {
                            Some(init) => self.eval(ctx, init)?,
                            None => Value::Null,
                        };
                        map.insert(field.clone(), value);
                    }
                    return Ok(Value::Map(map));
                }

                let entity_type = self.entity_types.read().get(name).cloned();
                if let Some(decl) = entity_type {
                    let id = self.spawn_entity(&decl, ctx.depth)?;
                    return Ok(Value::Str(id.0));
                }

                Err(RuntimeError::Undefined(name.clone()))
            }
        }
    }

    fn eval_call(&self, ctx: &mut ExecCtx, callee: &Expr, args: &[Expr]) -> Result<Value> {
        let ExprKind::Ident(name) = &callee.kind else {
            return Err(RuntimeError::Type(
                "only named functions are callable".to_string(),
            ));
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(ctx, arg)?);
        }

        let function = self.functions.read().get(name).cloned();
        if let Some(function) = function {
            return self.call_function(ctx, &function, values);
        }

        self.call_builtin(ctx, name, values)
    }

    fn call_function(
        &self,
        ctx: &ExecCtx,
        function: &FunctionDecl,
        args: Vec<Value>,
    ) -> Result<Value> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::Arity {
                name: function.name.clone(),
                expected: function.params.len(),
                got: args.len(),
            });
        }

        let mut frame = IndexMap::new();
        for (param, value) in function.params.iter().zip(args) {
            frame.insert(param.clone(), value);
        }
        let mut call_ctx = ExecCtx {
            scope: ctx.scope.clone(),
            entity: ctx.entity.clone(),
            depth: ctx.depth,
            locals: vec![frame],
        };

        match self.exec_block(&mut call_ctx, &function.body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
            Flow::Break | Flow::Continue => Err(RuntimeError::Type(
                "`break`/`continue` outside of a loop".to_string(),
            )),
        }
    }

    fn call_builtin(&self, _ctx: &ExecCtx, name: &str, args: Vec<Value>) -> Result<Value> {
        match name {
            "print" => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.output.line(line);
                Ok(Value::Null)
            }
            "len" => {
                expect_arity(name, 1, &args)?;
                match &args[0] {
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    Value::Map(map) => Ok(Value::Int(map.len() as i64)),
                    other => Err(RuntimeError::Type(format!(
                        "len() of a {}",
                        other.type_name()
                    ))),
                }
            }
            "str" => {
                expect_arity(name, 1, &args)?;
                Ok(Value::Str(args[0].to_string()))
            }
            "typeof" => {
                expect_arity(name, 1, &args)?;
                Ok(Value::Str(args[0].type_name().to_string()))
            }
            "dispose" => {
                expect_arity(name, 1, &args)?;
                match &args[0] {
                    Value::Str(id) => {
                        self.hub.dispose(&EntityId(id.clone()))?;
                        Ok(Value::Null)
                    }
                    other => Err(RuntimeError::Type(format!(
                        "dispose() expects an entity id string, got a {}",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(RuntimeError::Undefined(name.to_string())),
        }
    }

    // === Assignment ===

    fn assign(&self, ctx: &mut ExecCtx, target: &Expr, value: Value) -> Result<()> {
        let (root, segs) = self.resolve_target(ctx, target)?;

        match root {
            Root::Local { frame, name } => {
                if segs.is_empty() {
                    ctx.locals[frame].insert(name, value);
                    return Ok(());
                }
                let slot = ctx.locals[frame]
                    .get_mut(&name)
                    .ok_or_else(|| RuntimeError::Undefined(name.clone()))?;
                write_path(slot, &segs, value)
            }
            Root::Global(name) => {
                let mut globals = self.globals.lock();
                if segs.is_empty() {
                    globals.insert(name, value);
                    return Ok(());
                }
                let slot = globals
                    .get_mut(&name)
                    .ok_or_else(|| RuntimeError::Undefined(name.clone()))?;
                write_path(slot, &segs, value)
            }
            Root::SelfField(field) => {
                let entity = ctx
                    .entity
                    .as_ref()
                    .ok_or_else(|| RuntimeError::Type("`self` outside of an entity".to_string()))?;
                let mut fields = entity.fields.lock();
                if segs.is_empty() {
                    fields.insert(field, value);
                    return Ok(());
                }
                let slot = fields
                    .get_mut(&field)
                    .ok_or_else(|| RuntimeError::Undefined(format!("self.{}", field)))?;
                write_path(slot, &segs, value)
            }
        }
    }

    /// Peel an assignment target down to its root slot plus the evaluated
    /// path from that slot.
    fn resolve_target(
        &self,
        ctx: &mut ExecCtx,
        target: &Expr,
    ) -> Result<(Root, Vec<Seg>)> {
        let mut segs_rev = Vec::new();
        let mut current = target;

        loop {
            match &current.kind {
                ExprKind::Ident(name) => {
                    if name == "self" {
                        return Err(RuntimeError::Type(
                            "cannot assign to `self` itself".to_string(),
                        ));
                    }
                    let root = self.root_for_ident(ctx, name)?;
                    segs_rev.reverse();
                    return Ok((root, segs_rev));
                }
                ExprKind::Member { object, field } => {
                    if let ExprKind::Ident(name) = &object.kind {
                        if name == "self" {
                            segs_rev.reverse();
                            return Ok((Root::SelfField(field.clone()), segs_rev));
                        }
                    }
                    segs_rev.push(Seg::Key(field.clone()));
                    current = object;
                }
                ExprKind::Index { object, index } => {
                    let index = self.eval(ctx, index)?;
                    let seg = match index {
                        Value::Int(i) => Seg::Idx(i),
                        Value::Str(key) => Seg::Key(key),
                        other => {
                            return Err(RuntimeError::Type(format!(
                                "cannot index with a {}",
                                other.type_name()
                            )));
                        }
                    };
                    segs_rev.push(seg);
                    current = object;
                }
                _ => {
                    return Err(RuntimeError::Type(
                        "invalid assignment target".to_string(),
                    ));
                }
            }
        }
    }

    /// Choose where a bare identifier assignment lands: the innermost local
    /// frame declaring it, or an existing global. Assigning an undeclared
    /// name is an error — state lives in `let` bindings, declared fields,
    /// and payloads, nowhere else.
    fn root_for_ident(&self, ctx: &ExecCtx, name: &str) -> Result<Root> {
        for (frame, scope) in ctx.locals.iter().enumerate().rev() {
            if scope.contains_key(name) {
                return Ok(Root::Local {
                    frame,
                    name: name.to_string(),
                });
            }
        }
        if self.globals.lock().contains_key(name) {
            return Ok(Root::Global(name.to_string()));
        }
        Err(RuntimeError::Undefined(name.to_string()))
    }
}

/// Descend a value along evaluated path segments and write the final slot.
///
/// Intermediate segments must exist; the final segment may insert a new map
/// key.
fn write_path(slot: &mut Value, segs: &[Seg], value: Value) -> Result<()> {
    let (last, rest) = segs.split_last().expect("write_path requires segments");

    let mut current = slot;
    for seg in rest {
        current = descend_mut(current, seg)?;
    }

    match (last, current) {
        (Seg::Key(key), Value::Map(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Seg::Key(key), other) => Err(RuntimeError::Type(format!(
            "cannot set key `{}` on a {}",
            key,
            other.type_name()
        ))),
        (Seg::Idx(i), Value::List(items)) => {
            let idx = usize::try_from(*i)
                .map_err(|_| RuntimeError::Type(format!("negative list index {}", i)))?;
            match items.get_mut(idx) {
                Some(item) => {
                    *item = value;
                    Ok(())
                }
                None => Err(RuntimeError::Type(format!(
                    "list index {} out of bounds (len {})",
                    idx,
                    items.len()
                ))),
            }
        }
        (Seg::Idx(_), other) => Err(RuntimeError::Type(format!(
            "cannot index-assign a {}",
            other.type_name()
        ))),
    }
}

fn descend_mut<'v>(value: &'v mut Value, seg: &Seg) -> Result<&'v mut Value> {
    match (seg, value) {
        (Seg::Key(key), Value::Map(map)) => map
            .get_mut(key)
            .ok_or_else(|| RuntimeError::Type(format!("missing key `{}`", key))),
        (Seg::Idx(i), Value::List(items)) => {
            let idx = usize::try_from(*i)
                .map_err(|_| RuntimeError::Type(format!("negative list index {}", i)))?;
            let len = items.len();
            items
                .get_mut(idx)
                .ok_or_else(|| RuntimeError::Type(format!("list index {} out of bounds (len {})", idx, len)))
        }
        (Seg::Key(key), other) => Err(RuntimeError::Type(format!(
            "cannot access key `{}` on a {}",
            key,
            other.type_name()
        ))),
        (Seg::Idx(_), other) => Err(RuntimeError::Type(format!(
            "cannot index a {}",
            other.type_name()
        ))),
    }
}

/// Apply a non-logical binary operator.
fn binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use BinaryOp::*;

    match op {
        Add => {
            // String concatenation wins when either side is a string.
            if let Value::Str(l) = &left {
                return Ok(Value::Str(format!("{}{}", l, right)));
            }
            if let Value::Str(r) = &right {
                return Ok(Value::Str(format!("{}{}", left, r)));
            }
            arith(op, left, right)
        }
        Sub | Mul | Div | Mod => arith(op, left, right),
        Eq => Ok(Value::Bool(values_equal(&left, &right))),
        Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        Lt | Le | Gt | Ge => compare(op, left, right),
        And | Or => unreachable!("logical operators short-circuit in eval"),
    }
}

fn arith(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use BinaryOp::*;

    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => {
            let (l, r) = (*l, *r);
            match op {
                Add => Ok(Value::Int(l.wrapping_add(r))),
                Sub => Ok(Value::Int(l.wrapping_sub(r))),
                Mul => Ok(Value::Int(l.wrapping_mul(r))),
                Div => {
                    if r == 0 {
                        Err(RuntimeError::Type("division by zero".to_string()))
                    } else {
                        Ok(Value::Int(l.wrapping_div(r)))
                    }
                }
                Mod => {
                    if r == 0 {
                        Err(RuntimeError::Type("modulo by zero".to_string()))
                    } else {
                        Ok(Value::Int(l.wrapping_rem(r)))
                    }
                }
                _ => unreachable!("arith only handles arithmetic operators"),
            }
        }
        _ => {
            let l = as_float(&left, op)?;
            let r = as_float(&right, op)?;
            let result = match op {
                Add => l + r,
                Sub => l - r,
                Mul => l * r,
                Div => l / r,
                Mod => l % r,
                _ => unreachable!("arith only handles arithmetic operators"),
            };
            Ok(Value::Float(result))
        }
    }
}

fn as_float(value: &Value, op: BinaryOp) -> Result<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(RuntimeError::Type(format!(
            "cannot apply {:?} to a {}",
            op,
            other.type_name()
        ))),
    }
}

/// Equality with numeric cross-comparison (`1 == 1.0` is true).
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => *l as f64 == *r,
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use std::cmp::Ordering;

    let ordering = match (&left, &right) {
        (Value::Str(l), Value::Str(r)) => l.cmp(r),
        _ => {
            let l = as_float(&left, op)?;
            let r = as_float(&right, op)?;
            l.partial_cmp(&r)
                .ok_or_else(|| RuntimeError::Type("NaN is not orderable".to_string()))?
        }
    };

    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => unreachable!("compare only handles relational operators"),
    };
    Ok(Value::Bool(result))
}

fn expect_arity(name: &str, expected: usize, args: &[Value]) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime_with_capture() -> (Arc<Runtime>, Arc<Mutex<Vec<String>>>) {
        let (sink, lines) = OutputSink::capture();
        (Runtime::with_output(HubConfig::default(), sink), lines)
    }

    fn load(runtime: &Arc<Runtime>, source: &str) {
        let program = cx_parser::parse(source, None).expect("parse failed");
        runtime.load(&program).expect("load failed");
    }

    #[test]
    fn arithmetic_and_precedence() {
        let (runtime, lines) = runtime_with_capture();
        load(&runtime, "print(1 + 2 * 3, 7 / 2, 7.0 / 2, 7 % 3);");
        assert_eq!(*lines.lock(), vec!["7 3 3.5 1"]);
    }

    #[test]
    fn string_concatenation() {
        let (runtime, lines) = runtime_with_capture();
        load(&runtime, r#"print("n=" + 3);"#);
        assert_eq!(*lines.lock(), vec!["n=3"]);
    }

    #[test]
    fn control_flow_loops() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            let total = 0;
            for (let i = 0; i < 5; i = i + 1) {
                if (i == 3) { continue; }
                total = total + i;
            }
            let n = 0;
            while (true) {
                n = n + 1;
                if (n >= 2) { break; }
            }
            print(total, n);
            "#,
        );
        assert_eq!(*lines.lock(), vec!["7 2"]);
    }

    #[test]
    fn functions_return_values() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            function add(a, b) { return a + b; }
            print(add(2, 3));
            "#,
        );
        assert_eq!(*lines.lock(), vec!["5"]);
    }

    #[test]
    fn try_catch_binds_thrown_value() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            try {
                throw "boom";
            } catch (e) {
                print("caught", e);
            }
            "#,
        );
        assert_eq!(*lines.lock(), vec!["caught boom"]);
    }

    #[test]
    fn try_catch_reflects_dispatch_errors() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            conscious Short { }
            let id = new Short;
            dispose(id);
            try {
                dispose(id);
            } catch (e) {
                print(e.error);
            }
            "#,
        );
        assert_eq!(*lines.lock(), vec!["lifecycle"]);
    }

    #[test]
    fn nested_assignment_paths() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            let state = { inner: { n: 1 }, xs: [10, 20] };
            state.inner.n = 2;
            state.xs[1] = 21;
            print(state.inner.n, state.xs[1]);
            "#,
        );
        assert_eq!(*lines.lock(), vec!["2 21"]);
    }

    #[test]
    fn class_new_builds_record() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            class Point { let x = 1; let y = 2; }
            let p = new Point;
            p.y = 5;
            print(p.x, p.y, typeof(p));
            "#,
        );
        assert_eq!(*lines.lock(), vec!["1 5 map"]);
    }

    #[test]
    fn ai_statement_lowers_to_event() {
        let (runtime, lines) = runtime_with_capture();
        load(
            &runtime,
            r#"
            on ai.think (e) {
                print(e.payload.goal, e.payload.reply);
            }
            think "summarize", { reply: "my.reply" };
            think "plan";
            "#,
        );
        assert_eq!(
            *lines.lock(),
            vec!["summarize my.reply", "plan ai.think.result"]
        );
    }

    #[test]
    fn duplicate_declaration_is_an_error() {
        let runtime = Runtime::new(HubConfig::default());
        let program =
            cx_parser::parse("function f() { } function f() { }", None).expect("parse failed");
        let err = runtime.load(&program).unwrap_err();
        assert!(matches!(err, RuntimeError::Duplicate(name) if name == "f"));
    }
}
