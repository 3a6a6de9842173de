use thiserror::Error as ThisError;

/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // illegal character

    // Parser
    P001, // no prefix rule for token
    P002, // missing expected token
    P003, // integer literal out of range
    P004, // invalid assignment target
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
        }
    }
}

/// A parse-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}:{} — {}", self.code.as_str(), self.line, self.column, self.message)
    }
}

impl std::error::Error for Error {}

// ─────────────────────────────────────────────────────────────────────────────

/// Everything that can go wrong while evaluating. Carried as a value
/// (`Value::Error`) rather than unwound as a host-level fault.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RuntimeError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch { left: &'static str, operator: &'static str, right: &'static str },

    #[error("unknown operator: {left} {operator} {right}")]
    UnknownOperator { left: &'static str, operator: &'static str, right: &'static str },

    #[error("operator not supported: {operator}{operand}")]
    PrefixNotSupported { operator: &'static str, operand: &'static str },

    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    #[error("identifier already assigned: {0}")]
    AlreadyAssigned(String),

    #[error("cannot reassign constant: {0}")]
    ConstantReassign(String),

    #[error("wrong number of arguments to `{name}`: expected {expected}, got {got}")]
    WrongArgumentCount { name: String, expected: String, got: usize },

    #[error("argument to `{name}` not supported, got {got}")]
    ArgumentNotSupported { name: &'static str, got: &'static str },

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    #[error("index operator not supported: {left}[{index}]")]
    IndexNotSupported { left: &'static str, index: &'static str },

    #[error("not a function: {0}")]
    NotAFunction(&'static str),

    #[error("for loop not supported for: {0}")]
    ForTargetNotSupported(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow: {left} {operator} {right}")]
    IntegerOverflow { left: i64, operator: &'static str, right: i64 },

    #[error("integer overflow: -({0})")]
    NegationOverflow(i64),

    #[error("output failed: {0}")]
    OutputFailed(String),
}
