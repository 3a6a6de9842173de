//! Syntax tree produced by the parser and walked by the interpreter.
//!
//! Every node keeps the token it was built from, and `Display` re-serialises a
//! node to canonical source-like text: infix and prefix expressions are fully
//! parenthesised so the printed form shows exactly how the parser grouped them.

use std::fmt;
use std::rc::Rc;

use crate::syntax::token::Token;

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        self.statements.first().map_or("", Statement::token_literal)
    }
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Statement {
    /// `let x = 5;`
    Let(LetStatement),
    /// `const PI = 3;`
    Const(LetStatement),
    /// `return x;`
    Return(ReturnStatement),
    /// An expression in statement position, e.g. a call.
    Expression(ExpressionStatement),
    /// `{ ... }`
    Block(BlockStatement),
}

impl Statement {
    pub fn token(&self) -> &Token {
        match self {
            Statement::Let(s) | Statement::Const(s) => &s.token,
            Statement::Return(s)     => &s.token,
            Statement::Expression(s) => &s.token,
            Statement::Block(s)      => &s.token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }
}

/// Shared by `let` and `const`; the enclosing `Statement` variant says which.
#[derive(Debug, Clone)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Expression,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    /// The opening `{`.
    pub token: Token,
    pub statements: Vec<Statement>,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Integer(IntegerLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Null(Token),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    Assign(AssignExpression),
    If(IfExpression),
    Function(FunctionLiteral),
    Call(CallExpression),
    Array(ArrayLiteral),
    Hash(HashLiteral),
    Index(IndexExpression),
    For(ForExpression),
}

impl Expression {
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(e) => &e.token,
            Expression::Integer(e)    => &e.token,
            Expression::String(e)     => &e.token,
            Expression::Boolean(e)    => &e.token,
            Expression::Null(t)       => t,
            Expression::Prefix(e)     => &e.token,
            Expression::Infix(e)      => &e.token,
            Expression::Assign(e)     => &e.token,
            Expression::If(e)         => &e.token,
            Expression::Function(e)   => &e.token,
            Expression::Call(e)       => &e.token,
            Expression::Array(e)      => &e.token,
            Expression::Hash(e)       => &e.token,
            Expression::Index(e)      => &e.token,
            Expression::For(e)        => &e.token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl Identifier {
    pub fn new(token: Token) -> Self {
        let value = token.literal.clone();
        Self { token, value }
    }
}

#[derive(Debug, Clone)]
pub struct IntegerLiteral {
    pub token: Token,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct StringLiteral {
    pub token: Token,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct BooleanLiteral {
    pub token: Token,
    pub value: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
    Neg,
}

impl PrefixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrefixExpression {
    pub token: Token,
    pub operator: PrefixOp,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Add, Sub, Mul, Div,
    Lt, Gt,
    Eq, NotEq,
}

impl InfixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfixOp::Add   => "+",
            InfixOp::Sub   => "-",
            InfixOp::Mul   => "*",
            InfixOp::Div   => "/",
            InfixOp::Lt    => "<",
            InfixOp::Gt    => ">",
            InfixOp::Eq    => "==",
            InfixOp::NotEq => "!=",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct InfixExpression {
    /// The operator token.
    pub token: Token,
    pub left: Box<Expression>,
    pub operator: InfixOp,
    pub right: Box<Expression>,
}

/// `name = value`. Only plain identifiers are assignable.
#[derive(Debug, Clone)]
pub struct AssignExpression {
    pub token: Token,
    pub name: Identifier,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct IfExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

/// Body is reference counted so that every closure built from this literal
/// shares it instead of copying the subtree.
#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: Rc<BlockStatement>,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    /// The `(` token.
    pub token: Token,
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub token: Token,
    pub elements: Vec<Expression>,
}

/// Pairs in source order.
#[derive(Debug, Clone)]
pub struct HashLiteral {
    pub token: Token,
    pub pairs: Vec<(Expression, Expression)>,
}

#[derive(Debug, Clone)]
pub struct IndexExpression {
    /// The `[` token.
    pub token: Token,
    pub left: Box<Expression>,
    pub index: Box<Expression>,
}

/// `for index, value in target { body }`
#[derive(Debug, Clone)]
pub struct ForExpression {
    pub token: Token,
    pub index: Identifier,
    pub value: Identifier,
    pub target: Identifier,
    pub body: Rc<BlockStatement>,
}

// ─── Re-serialisation ────────────────────────────────────────────────────────

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.statements, "\n")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let(s)        => write!(f, "let {} = {};", s.name, s.value),
            Statement::Const(s)      => write!(f, "const {} = {};", s.name, s.value),
            Statement::Return(s)     => write!(f, "return {};", s.value),
            Statement::Expression(s) => write!(f, "{}", s.expression),
            Statement::Block(b)      => f.write_str(&braced(b)),
        }
    }
}

/// Statements only; callers add the braces.
impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.statements, " ")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(e) => write!(f, "{e}"),
            Expression::Integer(e)    => write!(f, "{}", e.value),
            Expression::String(e)     => write!(f, "\"{}\"", e.value),
            Expression::Boolean(e)    => write!(f, "{}", e.value),
            Expression::Null(_)       => f.write_str("null"),
            Expression::Prefix(e)     => write!(f, "({}{})", e.operator.as_str(), e.right),
            Expression::Infix(e)      => write!(f, "({} {} {})", e.left, e.operator, e.right),
            Expression::Assign(e)     => write!(f, "{} = {}", e.name, e.value),
            Expression::If(e) => {
                write!(f, "if {} {}", e.condition, braced(&e.consequence))?;
                if let Some(alt) = &e.alternative {
                    write!(f, " else {}", braced(alt))?;
                }
                Ok(())
            }
            Expression::Function(e) => {
                f.write_str("fn(")?;
                write_joined(f, &e.parameters, ", ")?;
                write!(f, ") {}", braced(&e.body))
            }
            Expression::Call(e) => {
                write!(f, "{}(", e.function)?;
                write_joined(f, &e.arguments, ", ")?;
                f.write_str(")")
            }
            Expression::Array(e) => {
                f.write_str("[")?;
                write_joined(f, &e.elements, ", ")?;
                f.write_str("]")
            }
            Expression::Hash(e) => {
                f.write_str("{")?;
                for (i, (k, v)) in e.pairs.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Expression::Index(e) => write!(f, "({}[{}])", e.left, e.index),
            Expression::For(e) => {
                write!(f, "for {}, {} in {} {}", e.index, e.value, e.target, braced(&e.body))
            }
        }
    }
}

pub(crate) fn braced(block: &BlockStatement) -> String {
    if block.statements.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {block} }}")
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 { f.write_str(sep)?; }
        write!(f, "{item}")?;
    }
    Ok(())
}
