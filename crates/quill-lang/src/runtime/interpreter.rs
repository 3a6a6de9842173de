//! Tree-walking evaluator.
//!
//! Internally every step returns `Result<Value, Signal>` so that both a pending
//! `return` and a runtime error unwind through nested blocks with `?`. The
//! public entry points turn a leftover signal back into `Value::Return` or
//! `Value::Error`; only a function call consumes a `return`.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::builtins::{BuiltinRegistry, Output, RuntimeState};
use crate::error::RuntimeError;
use crate::runtime::environment::Environment;
use crate::runtime::value::{ForLoop, Function, HashPairs, NULL, Value};
use crate::syntax::ast::*;

/// Non-local exit in flight.
#[derive(Debug)]
enum Signal {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Self {
        debug!(error = %e, "runtime error raised");
        Signal::Error(e)
    }
}

type Eval = Result<Value, Signal>;

// ─── Interpreter ──────────────────────────────────────────────────────────────

pub struct Interpreter {
    registry: BuiltinRegistry,
    state: RuntimeState,
}

impl Interpreter {
    /// Standard builtins, `print` to stdout.
    pub fn new() -> Self {
        Self { registry: BuiltinRegistry::standard(), state: RuntimeState::default() }
    }

    pub fn with_registry(mut self, registry: BuiltinRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.state.output = output;
        self
    }

    /// Lines printed since the last call, when output is captured.
    pub fn take_output(&self) -> Vec<String> {
        self.state.output.take()
    }

    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    // ─── Entry points ────────────────────────────────────────────────────────

    /// Run a whole program. A top-level `return` ends the program with its value.
    pub fn eval_program(&self, program: &Program, env: &Environment) -> Value {
        debug!(statements = program.statements.len(), "evaluating program");
        match self.exec_statements(&program.statements, env) {
            Ok(v) | Err(Signal::Return(v)) => v,
            Err(Signal::Error(e)) => Value::Error(e),
        }
    }

    /// Run a block in `env`. A `return` inside comes back still wrapped.
    pub fn eval_block(&self, block: &BlockStatement, env: &Environment) -> Value {
        settle(self.exec_statements(&block.statements, env))
    }

    pub fn eval_statement(&self, stmt: &Statement, env: &Environment) -> Value {
        settle(self.exec(stmt, env))
    }

    pub fn eval_expression(&self, expr: &Expression, env: &Environment) -> Value {
        settle(self.eval(expr, env))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn exec_statements(&self, stmts: &[Statement], env: &Environment) -> Eval {
        let mut result = NULL;
        for stmt in stmts {
            result = self.exec(stmt, env)?;
        }
        Ok(result)
    }

    fn exec(&self, stmt: &Statement, env: &Environment) -> Eval {
        match stmt {
            Statement::Let(s) => {
                let value = self.eval(&s.value, env)?;
                env.define(&s.name.value, value)?;
                Ok(NULL)
            }
            Statement::Const(s) => {
                let value = self.eval(&s.value, env)?;
                env.define_const(&s.name.value, value)?;
                Ok(NULL)
            }
            Statement::Return(s) => {
                let value = self.eval(&s.value, env)?;
                Err(Signal::Return(value))
            }
            Statement::Expression(s) => self.eval(&s.expression, env),
            Statement::Block(b)      => self.exec_statements(&b.statements, env),
        }
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn eval(&self, expr: &Expression, env: &Environment) -> Eval {
        match expr {
            Expression::Identifier(id) => self.eval_identifier(id, env),
            Expression::Integer(lit)   => Ok(Value::Integer(lit.value)),
            Expression::String(lit)    => Ok(Value::Str(lit.value.clone())),
            Expression::Boolean(lit)   => Ok(Value::from_bool(lit.value)),
            Expression::Null(_)        => Ok(NULL),

            Expression::Prefix(e) => {
                let right = self.eval(&e.right, env)?;
                Ok(eval_prefix(e.operator, right)?)
            }
            Expression::Infix(e) => {
                let left = self.eval(&e.left, env)?;
                let right = self.eval(&e.right, env)?;
                Ok(eval_infix(e.operator, &left, &right)?)
            }
            Expression::Assign(e) => {
                let value = self.eval(&e.value, env)?;
                env.reassign(&e.name.value, value.clone())?;
                Ok(value)
            }
            Expression::If(e) => {
                let condition = self.eval(&e.condition, env)?;
                if condition.is_truthy() {
                    self.exec_statements(&e.consequence.statements, env)
                } else if let Some(alt) = &e.alternative {
                    self.exec_statements(&alt.statements, env)
                } else {
                    Ok(NULL)
                }
            }
            Expression::Function(lit) => Ok(Value::Function(Rc::new(Function {
                parameters: lit.parameters.clone(),
                body: Rc::clone(&lit.body),
                env: env.clone(),
            }))),
            Expression::Call(call) => {
                let callee = self.eval(&call.function, env)?;
                let args = self.eval_all(&call.arguments, env)?;
                self.apply(call, callee, args)
            }
            Expression::Array(lit) => Ok(Value::array(self.eval_all(&lit.elements, env)?)),
            Expression::Hash(lit) => {
                let mut pairs = HashPairs::new();
                for (k, v) in &lit.pairs {
                    let key = self.eval(k, env)?;
                    key.hash_key()?;
                    let value = self.eval(v, env)?;
                    pairs.insert(key, value)?;
                }
                Ok(Value::hash(pairs))
            }
            Expression::Index(e) => {
                let left = self.eval(&e.left, env)?;
                let index = self.eval(&e.index, env)?;
                Ok(eval_index(&left, &index)?)
            }
            Expression::For(e) => self.eval_for(e, env),
        }
    }

    fn eval_identifier(&self, id: &Identifier, env: &Environment) -> Eval {
        if let Some(v) = env.get(&id.value) {
            return Ok(v);
        }
        match self.registry.get(&id.value) {
            Some(b) => Ok(Value::Builtin(b)),
            None => Err(RuntimeError::IdentifierNotFound(id.value.clone()).into()),
        }
    }

    /// Left to right, stopping at the first failure.
    fn eval_all(&self, exprs: &[Expression], env: &Environment) -> Result<Vec<Value>, Signal> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    fn apply(&self, call: &CallExpression, callee: Value, args: Vec<Value>) -> Eval {
        match callee {
            Value::Function(func) => {
                if args.len() != func.parameters.len() {
                    return Err(RuntimeError::WrongArgumentCount {
                        name: call.function.to_string(),
                        expected: func.parameters.len().to_string(),
                        got: args.len(),
                    }.into());
                }
                trace!(function = %call.function, args = args.len(), "call");

                let scope = Environment::enclosed(&func.env);
                for (param, arg) in func.parameters.iter().zip(args) {
                    scope.define(&param.value, arg)?;
                }
                match self.exec_statements(&func.body.statements, &scope) {
                    Ok(v) | Err(Signal::Return(v)) => Ok(v),
                    Err(e) => Err(e),
                }
            }
            Value::Builtin(b) => {
                trace!(builtin = b.name, args = args.len(), "call");
                // a native handing back a signal value raises or unwraps it here
                match b.call(&args, &self.state)? {
                    Value::Error(e) => Err(e.into()),
                    Value::Return(v) => Ok(*v),
                    v => Ok(v),
                }
            }
            other => Err(RuntimeError::NotAFunction(other.type_name()).into()),
        }
    }

    /// Iterates a snapshot of the target taken before the first pass; every
    /// pass gets its own child scope holding the two loop names.
    fn eval_for(&self, e: &ForExpression, env: &Environment) -> Eval {
        let target = self.eval_identifier(&e.target, env)?;
        let entries: Vec<(Value, Value)> = match &target {
            Value::Array(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::Integer(i as i64), v.clone()))
                .collect(),
            Value::Hash(pairs) => pairs
                .borrow()
                .iter()
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect(),
            other => return Err(RuntimeError::ForTargetNotSupported(other.type_name()).into()),
        };

        for (n, (index, value)) in entries.into_iter().enumerate() {
            trace!(iteration = n, target = %e.target, "loop");
            let scope = Environment::enclosed(env);
            scope.define(&e.index.value, index)?;
            scope.define(&e.value.value, value)?;
            self.exec_statements(&e.body.statements, &scope)?;
        }

        Ok(Value::For(Rc::new(ForLoop {
            index: e.index.clone(),
            value: e.value.clone(),
            target: e.target.clone(),
            body: Rc::clone(&e.body),
            env: env.clone(),
        })))
    }
}

impl Default for Interpreter {
    fn default() -> Self { Self::new() }
}

fn settle(result: Eval) -> Value {
    match result {
        Ok(v) => v,
        Err(Signal::Return(v)) => Value::Return(Box::new(v)),
        Err(Signal::Error(e))  => Value::Error(e),
    }
}

// ─── Operators ────────────────────────────────────────────────────────────────

fn eval_prefix(op: PrefixOp, right: Value) -> Result<Value, RuntimeError> {
    match (op, right) {
        (PrefixOp::Not, v) => Ok(Value::from_bool(!v.is_truthy())),
        (PrefixOp::Neg, Value::Integer(n)) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or(RuntimeError::NegationOverflow(n)),
        (PrefixOp::Neg, other) => Err(RuntimeError::PrefixNotSupported {
            operator: op.as_str(),
            operand: other.type_name(),
        }),
    }
}

/// Dispatch on the pair of operand types. A same-type pair without the operator
/// is an unknown operator; a mixed pair is a type mismatch.
fn eval_infix(op: InfixOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let result = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => return eval_integer_infix(op, *a, *b),
        (Value::Str(a), Value::Str(b)) if op == InfixOp::Add => Some(Value::Str(format!("{a}{b}"))),
        (Value::Str(_), Value::Str(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Hash(_), Value::Hash(_))
        | (Value::Null, _)
        | (_, Value::Null) => match op {
            InfixOp::Eq    => Some(Value::from_bool(left == right)),
            InfixOp::NotEq => Some(Value::from_bool(left != right)),
            _ => None,
        },
        _ => None,
    };

    result.ok_or_else(|| {
        let (l, r) = (left.type_name(), right.type_name());
        if l == r {
            RuntimeError::UnknownOperator { left: l, operator: op.as_str(), right: r }
        } else {
            RuntimeError::TypeMismatch { left: l, operator: op.as_str(), right: r }
        }
    })
}

fn eval_integer_infix(op: InfixOp, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let checked = |r: Option<i64>| {
        r.map(Value::Integer)
            .ok_or(RuntimeError::IntegerOverflow { left: a, operator: op.as_str(), right: b })
    };
    match op {
        InfixOp::Add   => checked(a.checked_add(b)),
        InfixOp::Sub   => checked(a.checked_sub(b)),
        InfixOp::Mul   => checked(a.checked_mul(b)),
        InfixOp::Div if b == 0 => Err(RuntimeError::DivisionByZero),
        InfixOp::Div   => checked(a.checked_div(b)),
        InfixOp::Lt    => Ok(Value::from_bool(a < b)),
        InfixOp::Gt    => Ok(Value::from_bool(a > b)),
        InfixOp::Eq    => Ok(Value::from_bool(a == b)),
        InfixOp::NotEq => Ok(Value::from_bool(a != b)),
    }
}

/// Out-of-range array positions and absent hash keys both give `null`.
fn eval_index(left: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (left, index) {
        (Value::Array(items), Value::Integer(i)) => {
            let items = items.borrow();
            Ok(usize::try_from(*i).ok().and_then(|i| items.get(i)).cloned().unwrap_or(NULL))
        }
        (Value::Hash(pairs), key) => {
            let hk = key.hash_key()?;
            Ok(pairs.borrow().get(&hk).map_or(NULL, |p| p.value.clone()))
        }
        _ => Err(RuntimeError::IndexNotSupported { left: left.type_name(), index: index.type_name() }),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
