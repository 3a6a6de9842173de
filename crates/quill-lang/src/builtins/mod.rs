use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::runtime::value::Value;

pub mod collections;
pub mod core;

// ─── Runtime state ────────────────────────────────────────────────────────────

/// Where `print` writes.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    /// Lines are collected in memory; drained with `Interpreter::take_output`.
    Capture(Rc<RefCell<Vec<String>>>),
}

impl Output {
    pub fn capture() -> Self {
        Output::Capture(Rc::default())
    }

    /// A closed or failing stdout comes back as an `io::Error`.
    pub fn write_line(&self, line: String) -> io::Result<()> {
        match self {
            Output::Stdout       => write_line_to(&mut io::stdout().lock(), &line),
            Output::Capture(buf) => {
                buf.borrow_mut().push(line);
                Ok(())
            }
        }
    }

    /// Drain captured lines. Always empty for stdout.
    pub fn take(&self) -> Vec<String> {
        match self {
            Output::Stdout       => Vec::new(),
            Output::Capture(buf) => std::mem::take(&mut *buf.borrow_mut()),
        }
    }
}

fn write_line_to(out: &mut impl Write, line: &str) -> io::Result<()> {
    writeln!(out, "{line}")
}

/// Interpreter-level state passed to every builtin call.
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    pub output: Output,
}

// ─── Builtin ──────────────────────────────────────────────────────────────────

pub type BuiltinFn = fn(&[Value], &RuntimeState) -> Result<Value, RuntimeError>;

/// A native function value. Each one checks its own arguments.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Value], state: &RuntimeState) -> Result<Value, RuntimeError> {
        (self.func)(args, state)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

/// Name → native function table consulted after the environment chain.
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    builtins: Vec<Builtin>,
}

impl BuiltinRegistry {
    /// An empty table. Most callers want `standard()`.
    pub fn new() -> Self { Self { builtins: Vec::new() } }

    /// Add a native, replacing any existing one with the same name.
    pub fn register(&mut self, name: &'static str, func: BuiltinFn) {
        let builtin = Builtin { name, func };
        match self.builtins.iter_mut().find(|b| b.name == name) {
            Some(slot) => *slot = builtin,
            None => self.builtins.push(builtin),
        }
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.builtins.iter().find(|b| b.name == name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.iter().map(|b| b.name)
    }

    /// `len`, `append`, `remove`, `typeof`, `print`, `string`, `int`.
    pub fn standard() -> Self {
        let mut r = Self::new();
        collections::register(&mut r);
        core::register(&mut r);
        r
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self { Self::standard() }
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

pub(crate) fn check_argc(name: &str, args: &[Value], n: usize) -> Result<(), RuntimeError> {
    if args.len() != n {
        Err(RuntimeError::WrongArgumentCount {
            name: name.to_string(),
            expected: n.to_string(),
            got: args.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn not_supported(name: &'static str, v: &Value) -> RuntimeError {
    RuntimeError::ArgumentNotSupported { name, got: v.type_name() }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
