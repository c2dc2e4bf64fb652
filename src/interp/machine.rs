//! The evaluation machine: one isolated execution of one snippet.
//!
//! A machine owns its global scope, its captured output, and its job queues
//! (promise microtasks and virtual timers). Evaluation runs the top-level
//! statements, then drains scheduled work — microtasks before timers — so a
//! snippet's asynchronous output is complete before the verifier compares
//! it. Fuel and job budgets bound runaway snippets; both surface as
//! `Timeout` faults.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interp::ast::*;
use crate::interp::builtins;
use crate::interp::parser;
use crate::interp::scope::Env;
use crate::interp::value::{
    inspect, stringify, Function, Job, JobQueue, PromiseInner, PromiseState, Reaction, Value,
};
use crate::interp::RuntimeError;
use crate::models::ErrorKind;

/// Operation budget per evaluation; exhaustion is a `Timeout` fault.
const FUEL: u64 = 1_000_000;
/// Scheduled-job budget per evaluation (microtasks + timer callbacks).
const MAX_JOBS: u64 = 100_000;

/// The result of evaluating one snippet: everything it printed, in order,
/// and the fault that ended it early, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub output: Vec<String>,
    pub failure: Option<RuntimeError>,
}

/// Non-local control flow during evaluation.
pub(crate) enum Signal {
    Error(RuntimeError),
    Throw(Value),
    Return(Value),
    Break,
    Continue,
}

impl From<RuntimeError> for Signal {
    fn from(err: RuntimeError) -> Self {
        Signal::Error(err)
    }
}

pub(crate) type Exec<T> = Result<T, Signal>;

struct Timer {
    due: u64,
    seq: u64,
    callback: Value,
    args: Vec<Value>,
}

pub struct Machine {
    global: Rc<Env>,
    output: Vec<String>,
    microtasks: JobQueue,
    timers: Vec<Timer>,
    /// Virtual clock, in milliseconds. Advanced to each timer's due time as
    /// it fires; never waits on the wall clock.
    clock: u64,
    timer_seq: u64,
    fuel: u64,
    jobs: u64,
}

impl Machine {
    pub fn new() -> Self {
        let global = Env::root();
        builtins::install(&global);
        Self {
            global,
            output: Vec::new(),
            microtasks: JobQueue::new(),
            timers: Vec::new(),
            clock: 0,
            timer_seq: 0,
            fuel: FUEL,
            jobs: 0,
        }
    }

    /// Evaluate a snippet in a fresh machine and capture its outcome.
    pub fn evaluate(source: &str) -> Evaluation {
        let mut machine = Machine::new();
        let failure = machine.exec(source).err();
        Evaluation {
            output: std::mem::take(&mut machine.output),
            failure,
        }
    }

    fn exec(&mut self, source: &str) -> Result<(), RuntimeError> {
        let program = parser::parse(source)?;
        let global = self.global.clone();
        if let Err(signal) = self.eval_stmts(&global, &program) {
            return Err(self.signal_to_error(signal));
        }
        self.drain()
    }

    fn signal_to_error(&self, signal: Signal) -> RuntimeError {
        match signal {
            Signal::Error(err) => err,
            Signal::Throw(value) => classify_thrown(&value),
            Signal::Return(_) => RuntimeError::syntax("Illegal return statement"),
            Signal::Break => RuntimeError::syntax("Illegal break statement"),
            Signal::Continue => RuntimeError::syntax("Illegal continue statement"),
        }
    }

    fn tick(&mut self) -> Exec<()> {
        if self.fuel == 0 {
            return Err(Signal::Error(RuntimeError::timeout(
                "evaluation budget exhausted",
            )));
        }
        self.fuel -= 1;
        Ok(())
    }

    // ============================================================
    // Output and scheduling, used by the builtins
    // ============================================================

    pub(crate) fn push_output(&mut self, text: &str) {
        for line in text.split('\n') {
            self.output.push(line.to_string());
        }
    }

    pub(crate) fn schedule_timer(&mut self, callback: Value, args: Vec<Value>, delay: u64) -> u64 {
        self.timer_seq += 1;
        self.timers.push(Timer {
            due: self.clock + delay,
            seq: self.timer_seq,
            callback,
            args,
        });
        self.timer_seq
    }

    /// Attach a reaction to a promise, or schedule it immediately when the
    /// promise has already settled.
    pub(crate) fn add_reaction(&mut self, source: Rc<RefCell<PromiseState>>, reaction: Reaction) {
        let inner = source.borrow().inner.clone();
        match inner {
            PromiseInner::Pending => source.borrow_mut().reactions.push(reaction),
            PromiseInner::Fulfilled(value) => self.microtasks.push_back(Job {
                reaction,
                payload: Ok(value),
            }),
            PromiseInner::Rejected(value) => self.microtasks.push_back(Job {
                reaction,
                payload: Err(value),
            }),
        }
    }

    pub(crate) fn resolve_promise(&mut self, target: &Rc<RefCell<PromiseState>>, value: Value) {
        if let Value::Promise(source) = &value {
            // Resolving with a promise adopts its eventual state.
            self.add_reaction(
                source.clone(),
                Reaction {
                    on_fulfilled: None,
                    on_rejected: None,
                    target: target.clone(),
                },
            );
            return;
        }
        let reactions = {
            let mut state = target.borrow_mut();
            if !matches!(state.inner, PromiseInner::Pending) {
                return;
            }
            state.inner = PromiseInner::Fulfilled(value.clone());
            std::mem::take(&mut state.reactions)
        };
        for reaction in reactions {
            self.microtasks.push_back(Job {
                reaction,
                payload: Ok(value.clone()),
            });
        }
    }

    pub(crate) fn reject_promise(&mut self, target: &Rc<RefCell<PromiseState>>, value: Value) {
        let reactions = {
            let mut state = target.borrow_mut();
            if !matches!(state.inner, PromiseInner::Pending) {
                return;
            }
            state.inner = PromiseInner::Rejected(value.clone());
            std::mem::take(&mut state.reactions)
        };
        for reaction in reactions {
            self.microtasks.push_back(Job {
                reaction,
                payload: Err(value.clone()),
            });
        }
    }

    // ============================================================
    // The job loop
    // ============================================================

    /// Run scheduled work until both queues are empty.
    fn drain(&mut self) -> Result<(), RuntimeError> {
        loop {
            if self.microtasks.is_empty() && self.timers.is_empty() {
                return Ok(());
            }
            if let Err(signal) = self.step_job() {
                return Err(self.signal_to_error(signal));
            }
        }
    }

    /// Run one scheduled job: the next microtask, else the earliest timer.
    fn step_job(&mut self) -> Exec<()> {
        self.jobs += 1;
        if self.jobs > MAX_JOBS {
            return Err(Signal::Error(RuntimeError::timeout(
                "asynchronous job budget exhausted",
            )));
        }
        if let Some(job) = self.microtasks.pop_front() {
            return self.run_reaction(job);
        }
        if let Some(timer) = self.pop_next_timer() {
            self.clock = self.clock.max(timer.due);
            self.call_value(&timer.callback, timer.args, "timer callback")?;
            return Ok(());
        }
        Err(Signal::Error(RuntimeError::timeout(
            "awaited work never settles",
        )))
    }

    fn pop_next_timer(&mut self) -> Option<Timer> {
        if self.timers.is_empty() {
            return None;
        }
        let mut best = 0;
        for (i, timer) in self.timers.iter().enumerate() {
            let current = &self.timers[best];
            if (timer.due, timer.seq) < (current.due, current.seq) {
                best = i;
            }
        }
        Some(self.timers.remove(best))
    }

    fn run_reaction(&mut self, job: Job) -> Exec<()> {
        let Job { reaction, payload } = job;
        match payload {
            Ok(value) => match reaction.on_fulfilled.clone() {
                Some(handler) => self.settle_with_handler(&handler, value, &reaction.target),
                None => {
                    self.resolve_promise(&reaction.target, value);
                    Ok(())
                }
            },
            Err(value) => match reaction.on_rejected.clone() {
                Some(handler) => self.settle_with_handler(&handler, value, &reaction.target),
                None => {
                    self.reject_promise(&reaction.target, value);
                    Ok(())
                }
            },
        }
    }

    fn settle_with_handler(
        &mut self,
        handler: &Value,
        payload: Value,
        target: &Rc<RefCell<PromiseState>>,
    ) -> Exec<()> {
        match self.call_value(handler, vec![payload], "promise handler") {
            Ok(result) => {
                self.resolve_promise(target, result);
                Ok(())
            }
            Err(signal) => match signal_thrown_value(&signal) {
                Some(thrown) => {
                    self.reject_promise(target, thrown);
                    Ok(())
                }
                None => Err(signal),
            },
        }
    }

    /// Suspend on a promise: run this machine's own scheduled work until it
    /// settles. Awaiting with nothing left to run can never settle and is a
    /// `Timeout` fault.
    fn await_promise(&mut self, promise: &Rc<RefCell<PromiseState>>) -> Exec<Value> {
        loop {
            let inner = promise.borrow().inner.clone();
            match inner {
                PromiseInner::Fulfilled(value) => return Ok(value),
                PromiseInner::Rejected(value) => return Err(Signal::Throw(value)),
                PromiseInner::Pending => self.step_job()?,
            }
        }
    }

    // ============================================================
    // Statements
    // ============================================================

    fn eval_stmts(&mut self, env: &Rc<Env>, stmts: &[Stmt]) -> Exec<()> {
        for stmt in stmts {
            self.eval_stmt(env, stmt)?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, env: &Rc<Env>, stmt: &Stmt) -> Exec<()> {
        self.tick()?;
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(env, expr)?;
                Ok(())
            }
            Stmt::Decl {
                mutable,
                pattern,
                init,
            } => {
                let value = match init {
                    Some(expr) => self.eval_expr(env, expr)?,
                    None => Value::Undefined,
                };
                self.bind_pattern(env, pattern, value, *mutable)
            }
            Stmt::Func { name, func } => {
                let value = Value::Function(Function::from_lit(func, env.clone()));
                env.declare(name, value, true).map_err(Signal::from)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(env, expr)?,
                    None => Value::Undefined,
                };
                Err(Signal::Return(value))
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(env, cond)?.truthy() {
                    let child = Env::child(env);
                    self.eval_stmts(&child, then)
                } else if let Some(otherwise) = otherwise {
                    self.eval_stmt(env, otherwise)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body } => {
                loop {
                    self.tick()?;
                    if !self.eval_expr(env, cond)?.truthy() {
                        break;
                    }
                    let child = Env::child(env);
                    match self.eval_stmts(&child, body) {
                        Ok(()) | Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                let for_env = Env::child(env);
                if let Some(init) = init {
                    self.eval_stmt(&for_env, init)?;
                }
                loop {
                    self.tick()?;
                    if let Some(cond) = cond {
                        if !self.eval_expr(&for_env, cond)?.truthy() {
                            break;
                        }
                    }
                    let child = Env::child(&for_env);
                    match self.eval_stmts(&child, body) {
                        Ok(()) | Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(other) => return Err(other),
                    }
                    if let Some(update) = update {
                        self.eval_expr(&for_env, update)?;
                    }
                }
                Ok(())
            }
            Stmt::ForOf {
                mutable,
                pattern,
                iter,
                body,
            } => {
                let iterable = self.eval_expr(env, iter)?;
                let items = iterable_items(&iterable).map_err(Signal::from)?;
                for item in items {
                    self.tick()?;
                    let child = Env::child(env);
                    self.bind_pattern(&child, pattern, item, *mutable)?;
                    match self.eval_stmts(&child, body) {
                        Ok(()) | Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::Block(stmts) => {
                let child = Env::child(env);
                self.eval_stmts(&child, stmts)
            }
            Stmt::Try {
                block,
                catch,
                finally,
            } => self.eval_try(env, block, catch.as_ref(), finally.as_deref()),
            Stmt::Throw(expr) => {
                let value = self.eval_expr(env, expr)?;
                Err(Signal::Throw(value))
            }
            Stmt::Break => Err(Signal::Break),
            Stmt::Continue => Err(Signal::Continue),
        }
    }

    fn eval_try(
        &mut self,
        env: &Rc<Env>,
        block: &[Stmt],
        catch: Option<&CatchClause>,
        finally: Option<&[Stmt]>,
    ) -> Exec<()> {
        let child = Env::child(env);
        let mut result = self.eval_stmts(&child, block);

        if let Err(signal) = &result {
            if let Some(thrown) = signal_thrown_value(signal) {
                if let Some(clause) = catch {
                    let catch_env = Env::child(env);
                    let bound = match &clause.param {
                        Some(param) => self.bind_pattern(&catch_env, param, thrown, true),
                        None => Ok(()),
                    };
                    result = match bound {
                        Ok(()) => self.eval_stmts(&catch_env, &clause.body),
                        Err(err) => Err(err),
                    };
                }
            }
        }

        if let Some(finally) = finally {
            let finally_env = Env::child(env);
            // A fault in the finally block wins over the try/catch outcome.
            self.eval_stmts(&finally_env, finally)?;
        }
        result
    }

    // ============================================================
    // Expressions
    // ============================================================

    fn eval_expr(&mut self, env: &Rc<Env>, expr: &Expr) -> Exec<Value> {
        self.tick()?;
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::string(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TplExpr::Lit(lit) => text.push_str(lit),
                        TplExpr::Expr(expr) => {
                            let value = self.eval_expr(env, expr)?;
                            text.push_str(&stringify(&value));
                        }
                    }
                }
                Ok(Value::string(text))
            }
            Expr::Ident(name) => env.lookup(name).ok_or_else(|| {
                Signal::Error(RuntimeError::reference(format!("{name} is not defined")))
            }),
            Expr::Array(items) => {
                let mut values = Vec::new();
                for item in items {
                    match item {
                        ArrayItem::Item(expr) => values.push(self.eval_expr(env, expr)?),
                        ArrayItem::Spread(expr) => {
                            let value = self.eval_expr(env, expr)?;
                            values.extend(iterable_items(&value).map_err(Signal::from)?);
                        }
                    }
                }
                Ok(Value::array(values))
            }
            Expr::Object(props) => {
                let object = crate::interp::value::ObjectData::with_props(Vec::new());
                for prop in props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            let value = self.eval_expr(env, value)?;
                            object.set(key, value);
                        }
                        ObjectProp::Shorthand(name) => {
                            let value = self.eval_expr(env, &Expr::Ident(name.clone()))?;
                            object.set(name, value);
                        }
                        ObjectProp::Spread(expr) => {
                            let value = self.eval_expr(env, expr)?;
                            if let Value::Object(source) = &value {
                                for (key, value) in source.entries() {
                                    object.set(&key, value);
                                }
                            }
                            // Spreading a non-object into an object literal
                            // contributes nothing.
                        }
                    }
                }
                Ok(Value::Object(object))
            }
            Expr::Func(lit) => Ok(Value::Function(Function::from_lit(lit, env.clone()))),
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                let callee_value = self.eval_expr(env, callee)?;
                if *optional && callee_value.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let args = self.eval_args(env, args)?;
                let label = callee_label(callee);
                self.call_value(&callee_value, args, &label)
            }
            Expr::New { ctor, args } => {
                let args = self.eval_args(env, args)?;
                self.construct(ctor, args)
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let object = self.eval_expr(env, object)?;
                if object.is_nullish() {
                    if *optional {
                        return Ok(Value::Undefined);
                    }
                    return Err(Signal::Error(RuntimeError::type_error(format!(
                        "Cannot read properties of {} (reading '{property}')",
                        inspect(&object)
                    ))));
                }
                Ok(builtins::get_property(&object, property))
            }
            Expr::Index { object, index } => {
                let object = self.eval_expr(env, object)?;
                let index = self.eval_expr(env, index)?;
                if object.is_nullish() {
                    return Err(Signal::Error(RuntimeError::type_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        inspect(&object),
                        stringify(&index)
                    ))));
                }
                Ok(index_value(&object, &index))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(env, operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(Signal::Error(RuntimeError::type_error(format!(
                            "cannot negate a {}",
                            other.type_of()
                        )))),
                    },
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(env, lhs)?;
                let rhs = self.eval_expr(env, rhs)?;
                apply_binary(*op, &lhs, &rhs).map_err(Signal::from)
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval_expr(env, lhs)?;
                match op {
                    LogicalOp::And => {
                        if lhs.truthy() {
                            self.eval_expr(env, rhs)
                        } else {
                            Ok(lhs)
                        }
                    }
                    LogicalOp::Or => {
                        if lhs.truthy() {
                            Ok(lhs)
                        } else {
                            self.eval_expr(env, rhs)
                        }
                    }
                }
            }
            Expr::Assign { target, op, value } => {
                let new_value = match op {
                    Some(op) => {
                        let current = self.eval_expr(env, target)?;
                        let rhs = self.eval_expr(env, value)?;
                        apply_binary(*op, &current, &rhs).map_err(Signal::from)?
                    }
                    None => self.eval_expr(env, value)?,
                };
                self.store(env, target, new_value.clone())?;
                Ok(new_value)
            }
            Expr::Cond {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(env, cond)?.truthy() {
                    self.eval_expr(env, then)
                } else {
                    self.eval_expr(env, otherwise)
                }
            }
            Expr::Await(expr) => {
                let value = self.eval_expr(env, expr)?;
                match value {
                    Value::Promise(promise) => self.await_promise(&promise),
                    other => Ok(other),
                }
            }
            Expr::TypeOf(operand) => {
                // `typeof missing` reports instead of faulting.
                if let Expr::Ident(name) = operand.as_ref() {
                    if env.lookup(name).is_none() {
                        return Ok(Value::string("undefined"));
                    }
                }
                let value = self.eval_expr(env, operand)?;
                Ok(Value::string(value.type_of()))
            }
        }
    }

    fn eval_args(&mut self, env: &Rc<Env>, args: &[Arg]) -> Exec<Vec<Value>> {
        let mut values = Vec::new();
        for arg in args {
            match arg {
                Arg::Item(expr) => values.push(self.eval_expr(env, expr)?),
                Arg::Spread(expr) => {
                    let value = self.eval_expr(env, expr)?;
                    values.extend(iterable_items(&value).map_err(Signal::from)?);
                }
            }
        }
        Ok(values)
    }

    fn store(&mut self, env: &Rc<Env>, target: &Expr, value: Value) -> Exec<()> {
        match target {
            Expr::Ident(name) => env.assign(name, value).map_err(Signal::from),
            Expr::Member {
                object, property, ..
            } => {
                let object = self.eval_expr(env, object)?;
                match object {
                    Value::Object(obj) => {
                        obj.set(property, value);
                        Ok(())
                    }
                    other => Err(Signal::Error(RuntimeError::type_error(format!(
                        "cannot set property '{property}' on a {}",
                        other.type_of()
                    )))),
                }
            }
            Expr::Index { object, index } => {
                let object = self.eval_expr(env, object)?;
                let index = self.eval_expr(env, index)?;
                match (&object, &index) {
                    (Value::Array(items), Value::Number(n)) if *n >= 0.0 => {
                        let i = *n as usize;
                        let mut items = items.borrow_mut();
                        if i >= items.len() {
                            items.resize(i + 1, Value::Undefined);
                        }
                        items[i] = value;
                        Ok(())
                    }
                    (Value::Object(obj), index) => {
                        obj.set(&stringify(index), value);
                        Ok(())
                    }
                    _ => Err(Signal::Error(RuntimeError::type_error(format!(
                        "cannot index a {} for assignment",
                        object.type_of()
                    )))),
                }
            }
            _ => Err(Signal::Error(RuntimeError::syntax(
                "Invalid assignment target",
            ))),
        }
    }

    // ============================================================
    // Calls, construction, and binding
    // ============================================================

    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        label: &str,
    ) -> Exec<Value> {
        self.tick()?;
        match callee {
            Value::Function(func) => {
                let func = func.clone();
                let call_env = Env::child(&func.env);
                let result = self
                    .bind_params(&call_env, &func.params, args)
                    .and_then(|()| self.run_body(&call_env, &func.body));
                if func.is_async {
                    match result {
                        Ok(value) => Ok(Value::Promise(PromiseState::fulfilled(value))),
                        Err(signal) => match signal_thrown_value(&signal) {
                            Some(thrown) => Ok(Value::Promise(PromiseState::rejected(thrown))),
                            None => Err(signal),
                        },
                    }
                } else {
                    result
                }
            }
            Value::Native(native) => builtins::call_native(self, *native, args),
            Value::Method(method) => builtins::call_method(self, &method.clone(), args),
            _ => Err(Signal::Error(RuntimeError::type_error(format!(
                "{label} is not a function"
            )))),
        }
    }

    fn run_body(&mut self, env: &Rc<Env>, body: &FuncBody) -> Exec<Value> {
        match body {
            FuncBody::Expr(expr) => self.eval_expr(env, expr),
            FuncBody::Block(stmts) => match self.eval_stmts(env, stmts) {
                Ok(()) => Ok(Value::Undefined),
                Err(Signal::Return(value)) => Ok(value),
                Err(other) => Err(other),
            },
        }
    }

    fn construct(&mut self, ctor: &str, args: Vec<Value>) -> Exec<Value> {
        match ctor {
            "Error" | "TypeError" | "RangeError" | "ReferenceError" | "SyntaxError" => {
                let message = args.first().map(stringify).unwrap_or_default();
                Ok(Value::object(vec![
                    ("name".to_string(), Value::string(ctor)),
                    ("message".to_string(), Value::string(message)),
                ]))
            }
            "Promise" => {
                let executor = args.into_iter().next().ok_or_else(|| {
                    Signal::Error(RuntimeError::type_error(
                        "Promise constructor expects an executor function",
                    ))
                })?;
                let promise = PromiseState::pending();
                let resolve = Value::Method(Rc::new(crate::interp::value::BoundMethod {
                    recv: Value::Promise(promise.clone()),
                    kind: crate::interp::value::MethodKind::PromiseResolveCap,
                }));
                let reject = Value::Method(Rc::new(crate::interp::value::BoundMethod {
                    recv: Value::Promise(promise.clone()),
                    kind: crate::interp::value::MethodKind::PromiseRejectCap,
                }));
                match self.call_value(&executor, vec![resolve, reject], "Promise executor") {
                    Ok(_) => {}
                    Err(signal) => match signal_thrown_value(&signal) {
                        Some(thrown) => self.reject_promise(&promise, thrown),
                        None => return Err(signal),
                    },
                }
                Ok(Value::Promise(promise))
            }
            other => Err(Signal::Error(RuntimeError::type_error(format!(
                "{other} is not a constructor"
            )))),
        }
    }

    fn bind_params(&mut self, env: &Rc<Env>, params: &[Param], args: Vec<Value>) -> Exec<()> {
        let mut args = args.into_iter();
        for param in params {
            if param.rest {
                let rest: Vec<Value> = args.by_ref().collect();
                self.bind_pattern(env, &param.pattern, Value::array(rest), true)?;
                break;
            }
            let mut value = args.next().unwrap_or(Value::Undefined);
            if matches!(value, Value::Undefined) {
                if let Some(default) = &param.default {
                    value = self.eval_expr(env, default)?;
                }
            }
            self.bind_pattern(env, &param.pattern, value, true)?;
        }
        Ok(())
    }

    fn bind_pattern(
        &mut self,
        env: &Rc<Env>,
        pattern: &Pattern,
        value: Value,
        mutable: bool,
    ) -> Exec<()> {
        match pattern {
            Pattern::Ident(name) => env.declare(name, value, mutable).map_err(Signal::from),
            Pattern::Array { elements, rest } => {
                let items = iterable_items(&value).map_err(Signal::from)?;
                for (i, slot) in elements.iter().enumerate() {
                    let Some(elem) = slot else { continue };
                    let mut picked = items.get(i).cloned().unwrap_or(Value::Undefined);
                    if matches!(picked, Value::Undefined) {
                        if let Some(default) = &elem.default {
                            picked = self.eval_expr(env, default)?;
                        }
                    }
                    self.bind_pattern(env, &elem.pattern, picked, mutable)?;
                }
                if let Some(rest) = rest {
                    let remaining: Vec<Value> =
                        items.iter().skip(elements.len()).cloned().collect();
                    self.bind_pattern(env, rest, Value::array(remaining), mutable)?;
                }
                Ok(())
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    return Err(Signal::Error(RuntimeError::type_error(format!(
                        "Cannot destructure {} as it has no properties",
                        inspect(&value)
                    ))));
                }
                let source = match &value {
                    Value::Object(obj) => Some(obj.clone()),
                    _ => None,
                };
                for prop in props {
                    let mut picked = source
                        .as_ref()
                        .and_then(|obj| obj.get(&prop.key))
                        .unwrap_or(Value::Undefined);
                    if matches!(picked, Value::Undefined) {
                        if let Some(default) = &prop.default {
                            picked = self.eval_expr(env, default)?;
                        }
                    }
                    self.bind_pattern(env, &prop.binding, picked, mutable)?;
                }
                if let Some(rest) = rest {
                    let taken: Vec<&String> = props.iter().map(|p| &p.key).collect();
                    let remaining = match &source {
                        Some(obj) => obj
                            .entries()
                            .into_iter()
                            .filter(|(key, _)| !taken.iter().any(|t| *t == key))
                            .collect(),
                        None => Vec::new(),
                    };
                    env.declare(rest, Value::object(remaining), mutable)
                        .map_err(Signal::from)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Free helpers
// ============================================================

/// The catchable value carried by a signal, if it is a fault. Budget
/// exhaustion is never catchable; it aborts the whole evaluation.
pub(crate) fn signal_thrown_value(signal: &Signal) -> Option<Value> {
    match signal {
        Signal::Throw(value) => Some(value.clone()),
        Signal::Error(err) if err.kind != ErrorKind::Timeout => Some(error_object(err)),
        _ => None,
    }
}

/// The error value a `catch` clause binds for an engine fault.
pub(crate) fn error_object(err: &RuntimeError) -> Value {
    Value::object(vec![
        ("name".to_string(), Value::string(err.kind.label())),
        ("message".to_string(), Value::string(err.message.clone())),
    ])
}

/// Classify an uncaught thrown value into the fault taxonomy, by the `name`
/// property of thrown error values.
fn classify_thrown(value: &Value) -> RuntimeError {
    if let Value::Object(obj) = value {
        let name = match obj.get("name") {
            Some(Value::Str(name)) => Some(name.as_ref().clone()),
            _ => None,
        };
        let message = match obj.get("message") {
            Some(Value::Str(message)) => message.as_ref().clone(),
            _ => inspect(value),
        };
        let kind = name
            .as_deref()
            .and_then(ErrorKind::from_label)
            .unwrap_or(ErrorKind::Type);
        return RuntimeError::new(kind, message);
    }
    RuntimeError::type_error(format!("Uncaught {}", inspect(value)))
}

/// The elements a value yields when spread, destructured, or iterated.
pub(crate) fn iterable_items(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        other => Err(RuntimeError::type_error(format!(
            "{} is not iterable",
            inspect(other)
        ))),
    }
}

fn index_value(object: &Value, index: &Value) -> Value {
    match (object, index) {
        (Value::Array(items), Value::Number(n)) if *n >= 0.0 => items
            .borrow()
            .get(*n as usize)
            .cloned()
            .unwrap_or(Value::Undefined),
        (Value::Str(s), Value::Number(n)) if *n >= 0.0 => s
            .chars()
            .nth(*n as usize)
            .map(|c| Value::string(c.to_string()))
            .unwrap_or(Value::Undefined),
        (Value::Object(obj), index) => obj.get(&stringify(index)).unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    use BinaryOp::*;
    match op {
        Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::string(format!(
                "{}{}",
                stringify(lhs),
                stringify(rhs)
            ))),
            _ => Err(RuntimeError::type_error(format!(
                "cannot add a {} and a {}",
                lhs.type_of(),
                rhs.type_of()
            ))),
        },
        Sub | Mul | Div | Rem => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op {
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                _ => a % b,
            })),
            _ => Err(RuntimeError::type_error(format!(
                "cannot apply `{}` to a {} and a {}",
                op_symbol(op),
                lhs.type_of(),
                rhs.type_of()
            ))),
        },
        Lt | LtEq | Gt | GtEq => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "cannot compare a {} and a {}",
                        lhs.type_of(),
                        rhs.type_of()
                    )))
                }
            };
            let result = match (op, ordering) {
                (_, None) => false,
                (Lt, Some(ord)) => ord == std::cmp::Ordering::Less,
                (LtEq, Some(ord)) => ord != std::cmp::Ordering::Greater,
                (Gt, Some(ord)) => ord == std::cmp::Ordering::Greater,
                (_, Some(ord)) => ord != std::cmp::Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        Eq => Ok(Value::Bool(lhs.loose_eq(rhs))),
        NotEq => Ok(Value::Bool(!lhs.loose_eq(rhs))),
        StrictEq => Ok(Value::Bool(lhs.strict_eq(rhs))),
        StrictNotEq => Ok(Value::Bool(!lhs.strict_eq(rhs))),
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::Eq => "==",
        BinaryOp::StrictEq => "===",
        BinaryOp::NotEq => "!=",
        BinaryOp::StrictNotEq => "!==",
    }
}

fn callee_label(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        _ => "expression".to_string(),
    }
}
