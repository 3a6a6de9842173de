pub mod builtins;
pub mod error;
pub mod runtime;
pub mod syntax;

pub use builtins::{Builtin, BuiltinFn, BuiltinRegistry, Output, RuntimeState};
pub use error::{Error, ErrorCode, RuntimeError};
pub use runtime::environment::Environment;
pub use runtime::interpreter::Interpreter;
pub use runtime::value::{HashKey, HashPairs, Value};
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};

use syntax::lexer::Lexer;
use syntax::parser::Parser;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Parse source text. Any diagnostic makes the whole parse fail, since a
/// program recovered from errors may be missing pieces.
pub fn parse(source: &str) -> Result<Program, Vec<Error>> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(parser.errors().to_vec())
    }
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// An interpreter plus one global environment that outlives each input, the
/// way a REPL threads bindings from line to line.
///
/// ```
/// use quill_lang::{Session, Value};
///
/// let session = Session::new();
/// session.eval("let double = fn(x) { x * 2 };").unwrap();
/// assert_eq!(session.eval("double(21)").unwrap(), Value::Integer(42));
/// ```
pub struct Session {
    interpreter: Interpreter,
    env: Environment,
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self { interpreter, env: Environment::new() }
    }

    /// Parse and evaluate one input against the session's globals. Runtime
    /// failures come back as `Ok(Value::Error(..))`; only parse failures are `Err`.
    pub fn eval(&self, source: &str) -> Result<Value, Vec<Error>> {
        let program = parse(source)?;
        Ok(self.interpreter.eval_program(&program, &self.env))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }
}

impl Default for Session {
    fn default() -> Self { Self::new() }
}
