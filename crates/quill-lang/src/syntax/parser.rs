//! Pratt parser.
//!
//! Each token kind may own a prefix rule (how to start an expression with it)
//! and an infix rule with a binding precedence (how to extend an expression
//! already built to its left). `parse_expression` climbs while the upcoming
//! token binds tighter than the caller's minimum.
//!
//! The parser never aborts: a failed statement records a diagnostic, the
//! cursor resynchronises, and parsing carries on. Callers must check
//! `errors()` before trusting the returned `Program`.

use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, ErrorCode};
use crate::syntax::ast::*;
use crate::syntax::lexer::Lexer;
use crate::syntax::token::{Token, TokenKind};

type ParseResult<T> = Result<T, Error>;

type PrefixRule<'a> = fn(&mut Parser<'a>) -> ParseResult<Expression>;
type InfixRule<'a> = fn(&mut Parser<'a>, Expression) -> ParseResult<Expression>;

/// Binding power, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,      // =
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x) a[i]
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    peek: Token,
    errors: Vec<Error>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self { lexer, cur, peek, errors: Vec::new() }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Diagnostics as plain human-readable strings, in the order they were found.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => program.statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.next_token();
        }

        debug!(statements = program.statements.len(), errors = self.errors.len(), "parsed program");
        program
    }

    // ─── Rule tables ─────────────────────────────────────────────────────────

    fn prefix_rule(kind: TokenKind) -> Option<PrefixRule<'a>> {
        let rule: PrefixRule<'a> = match kind {
            TokenKind::Ident    => Self::parse_identifier,
            TokenKind::Int      => Self::parse_integer_literal,
            TokenKind::String   => Self::parse_string_literal,
            TokenKind::True
            | TokenKind::False  => Self::parse_boolean,
            TokenKind::Null     => Self::parse_null,
            TokenKind::Bang
            | TokenKind::Minus  => Self::parse_prefix_expression,
            TokenKind::LParen   => Self::parse_grouped_expression,
            TokenKind::If       => Self::parse_if_expression,
            TokenKind::Function => Self::parse_function_literal,
            TokenKind::LSquare  => Self::parse_array_literal,
            TokenKind::LCurly   => Self::parse_hash_literal,
            TokenKind::For      => Self::parse_for_expression,
            _ => return None,
        };
        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<(Precedence, InfixRule<'a>)> {
        let entry: (Precedence, InfixRule<'a>) = match kind {
            TokenKind::Equal
            | TokenKind::NotEqual    => (Precedence::Equals, Self::parse_infix_expression),
            TokenKind::LessThan
            | TokenKind::GreaterThan => (Precedence::LessGreater, Self::parse_infix_expression),
            TokenKind::Plus
            | TokenKind::Minus       => (Precedence::Sum, Self::parse_infix_expression),
            TokenKind::Asterisk
            | TokenKind::Slash       => (Precedence::Product, Self::parse_infix_expression),
            TokenKind::LParen        => (Precedence::Call, Self::parse_call_expression),
            TokenKind::LSquare       => (Precedence::Call, Self::parse_index_expression),
            TokenKind::Assign        => (Precedence::Assign, Self::parse_assign_expression),
            _ => return None,
        };
        Some(entry)
    }

    fn precedence_of(kind: TokenKind) -> Precedence {
        Self::infix_rule(kind).map_or(Precedence::Lowest, |(p, _)| p)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.cur.kind {
            TokenKind::Let    => self.parse_let_statement().map(Statement::Let),
            TokenKind::Const  => self.parse_let_statement().map(Statement::Const),
            TokenKind::Return => self.parse_return_statement(),
            _                 => self.parse_expression_statement(),
        }
    }

    /// `let`/`const` share one grammar: `<kw> <ident> = <expr> [;]`.
    fn parse_let_statement(&mut self) -> ParseResult<LetStatement> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier::new(self.cur.clone());
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(LetStatement { token, name, value })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur.clone();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Return(ReturnStatement { token, value }))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Expression(ExpressionStatement { token, expression }))
    }

    /// Called with `cur` on `{`. Collects statements up to the matching `}` or
    /// end of input, recovering per statement.
    fn parse_block_statement(&mut self) -> BlockStatement {
        let token = self.cur.clone();
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_is(TokenKind::RCurly) && !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => {
                    statements.push(stmt);
                    self.next_token();
                }
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                    // a `}` here closes this block; leave it for the loop test
                    if !self.cur_is(TokenKind::RCurly) {
                        self.next_token();
                    }
                }
            }
        }

        BlockStatement { token, statements }
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let prefix = Self::prefix_rule(self.cur.kind).ok_or_else(|| self.no_prefix_rule())?;
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some((_, infix)) = Self::infix_rule(self.peek.kind) else {
                return Ok(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }

        Ok(left)
    }

    fn parse_identifier(&mut self) -> ParseResult<Expression> {
        Ok(Expression::Identifier(Identifier::new(self.cur.clone())))
    }

    fn parse_integer_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let value = token.literal.parse::<i64>().map_err(|_| {
            Error::new(ErrorCode::P003, token.line, token.column,
                format!("could not parse `{}` as integer", token.literal))
        })?;
        Ok(Expression::Integer(IntegerLiteral { token, value }))
    }

    fn parse_string_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let value = token.literal.clone();
        Ok(Expression::String(StringLiteral { token, value }))
    }

    fn parse_boolean(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let value = token.is(TokenKind::True);
        Ok(Expression::Boolean(BooleanLiteral { token, value }))
    }

    fn parse_null(&mut self) -> ParseResult<Expression> {
        Ok(Expression::Null(self.cur.clone()))
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let operator = if token.is(TokenKind::Bang) { PrefixOp::Not } else { PrefixOp::Neg };
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix(PrefixExpression { token, operator, right: Box::new(right) }))
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(expr)
    }

    /// `if <cond> { ... } [else { ... }]`; the usual `if (cond)` form is just a
    /// grouped condition.
    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::LCurly)?;
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LCurly)?;
            Some(self.parse_block_statement())
        } else {
            None
        };

        Ok(Expression::If(IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenKind::LCurly)?;
        let body = Rc::new(self.parse_block_statement());
        Ok(Expression::Function(FunctionLiteral { token, parameters, body }))
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Ok(params);
        }

        self.expect_peek(TokenKind::Ident)?;
        params.push(Identifier::new(self.cur.clone()));
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            params.push(Identifier::new(self.cur.clone()));
        }
        self.expect_peek(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let elements = self.parse_expression_list(TokenKind::RSquare)?;
        Ok(Expression::Array(ArrayLiteral { token, elements }))
    }

    /// `{ <expr>: <expr>, ... }`, possibly empty.
    fn parse_hash_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RCurly) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_is(TokenKind::RCurly) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }
        self.expect_peek(TokenKind::RCurly)?;

        Ok(Expression::Hash(HashLiteral { token, pairs }))
    }

    /// `for <ident>, <ident> in <ident> { ... }`. The target must be a plain name.
    fn parse_for_expression(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::Ident)?;
        let index = Identifier::new(self.cur.clone());
        self.expect_peek(TokenKind::Comma)?;
        self.expect_peek(TokenKind::Ident)?;
        let value = Identifier::new(self.cur.clone());
        self.expect_peek(TokenKind::In)?;
        self.expect_peek(TokenKind::Ident)?;
        let target = Identifier::new(self.cur.clone());
        self.expect_peek(TokenKind::LCurly)?;
        let body = Rc::new(self.parse_block_statement());
        Ok(Expression::For(ForExpression { token, index, value, target, body }))
    }

    // ─── Infix rules ─────────────────────────────────────────────────────────

    fn parse_infix_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let operator = match token.kind {
            TokenKind::Plus        => InfixOp::Add,
            TokenKind::Minus       => InfixOp::Sub,
            TokenKind::Asterisk    => InfixOp::Mul,
            TokenKind::Slash       => InfixOp::Div,
            TokenKind::LessThan    => InfixOp::Lt,
            TokenKind::GreaterThan => InfixOp::Gt,
            TokenKind::Equal       => InfixOp::Eq,
            TokenKind::NotEqual    => InfixOp::NotEq,
            _ => return Err(self.unexpected("infix operator")),
        };
        // right operand binds at this operator's own level → left associative
        let precedence = Self::precedence_of(token.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix(InfixExpression {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_call_expression(&mut self, function: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Ok(Expression::Call(CallExpression { token, function: Box::new(function), arguments }))
    }

    fn parse_index_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RSquare)?;
        Ok(Expression::Index(IndexExpression { token, left: Box::new(left), index: Box::new(index) }))
    }

    /// `name = value`, right associative.
    fn parse_assign_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let name = match left {
            Expression::Identifier(name) => name,
            other => {
                return Err(Error::new(ErrorCode::P004, token.line, token.column,
                    format!("invalid assignment target `{other}`, expected identifier")));
            }
        };
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(Expression::Assign(AssignExpression { token, name, value: Box::new(value) }))
    }

    /// Comma separated expressions up to `end`; `cur` sits on the opening token.
    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(list)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    fn peek_precedence(&self) -> Precedence {
        Self::precedence_of(self.peek.kind)
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    /// Advance onto the peek token if it has the expected kind.
    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.next_token();
            Ok(())
        } else {
            let tok = &self.peek;
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected next token to be `{}`, found `{}`", kind, tok.kind),
            ))
        }
    }

    fn no_prefix_rule(&self) -> Error {
        let tok = &self.cur;
        if tok.is(TokenKind::Illegal) {
            return Error::new(ErrorCode::L001, tok.line, tok.column,
                format!("illegal character `{}`", tok.literal));
        }
        Error::new(ErrorCode::P001, tok.line, tok.column,
            format!("no prefix parse rule for `{}` found", tok.kind))
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = &self.cur;
        Error::new(ErrorCode::P001, tok.line, tok.column,
            format!("expected {}, found `{}`", expected, tok.kind))
    }

    /// Skip to the end of the broken statement: a `;`, a closing `}`, or just
    /// before the next statement keyword or end of input.
    fn synchronize(&mut self) {
        loop {
            if self.cur_is(TokenKind::Semicolon) || self.cur_is(TokenKind::RCurly) || self.cur_is(TokenKind::Eof) {
                return;
            }
            if self.peek_is(TokenKind::Eof) || self.peek_is(TokenKind::RCurly) || self.peek.kind.starts_statement() {
                return;
            }
            self.next_token();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Program {
        let mut parser = Parser::new(Lexer::new(src));
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parse errors for {src:?}: {:#?}", parser.errors());
        program
    }

    fn parse_errs(src: &str) -> Vec<Error> {
        let mut parser = Parser::new(Lexer::new(src));
        parser.parse_program();
        assert!(!parser.errors().is_empty(), "expected parse errors for {src:?}");
        parser.errors().to_vec()
    }

    fn single_expr(src: &str) -> Expression {
        let mut program = parse(src);
        assert_eq!(program.statements.len(), 1, "expected one statement in {src:?}");
        match program.statements.remove(0) {
            Statement::Expression(s) => s.expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    // ── statements ───────────────────────────────────────────────────────────

    #[test]
    fn let_statements() {
        let p = parse("let x = 5; let y = true; let foobar = y;");
        assert_eq!(p.statements.len(), 3);
        let names: Vec<_> = p.statements.iter().map(|s| match s {
            Statement::Let(l) => l.name.value.clone(),
            other => panic!("expected let, got {other:?}"),
        }).collect();
        assert_eq!(names, vec!["x", "y", "foobar"]);
        assert_eq!(p.to_string(), "let x = 5;\nlet y = true;\nlet foobar = y;");
    }

    #[test]
    fn const_statement() {
        let p = parse("const PI = 3");
        match &p.statements[0] {
            Statement::Const(c) => {
                assert_eq!(c.name.value, "PI");
                assert_eq!(c.token.kind, TokenKind::Const);
            }
            other => panic!("expected const, got {other:?}"),
        }
        assert_eq!(p.to_string(), "const PI = 3;");
    }

    #[test]
    fn semicolons_are_optional() {
        let p = parse("let a = 1\nlet b = 2\na + b");
        assert_eq!(p.statements.len(), 3);
    }

    #[test]
    fn return_statements() {
        let p = parse("return 5; return 10; return add(15);");
        assert_eq!(p.statements.len(), 3);
        assert!(p.statements.iter().all(|s| matches!(s, Statement::Return(_))));
        assert_eq!(p.statements[2].to_string(), "return add(15);");
    }

    #[test]
    fn token_literals() {
        let p = parse("let x = 5; return x; x + 1");
        assert_eq!(p.token_literal(), "let");
        assert_eq!(p.statements[1].token_literal(), "return");
        assert_eq!(p.statements[2].token_literal(), "x");
    }

    // ── literals ─────────────────────────────────────────────────────────────

    #[test]
    fn identifier_expression() {
        match single_expr("foobar;") {
            Expression::Identifier(id) => {
                assert_eq!(id.value, "foobar");
                assert_eq!(id.token.literal, "foobar");
            }
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn integer_literal() {
        assert!(matches!(single_expr("5;"), Expression::Integer(IntegerLiteral { value: 5, .. })));
    }

    #[test]
    fn string_literal() {
        match single_expr(r#""hello world";"#) {
            Expression::String(s) => assert_eq!(s.value, "hello world"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn boolean_and_null_literals() {
        assert!(matches!(single_expr("true"), Expression::Boolean(BooleanLiteral { value: true, .. })));
        assert!(matches!(single_expr("false"), Expression::Boolean(BooleanLiteral { value: false, .. })));
        assert!(matches!(single_expr("null"), Expression::Null(_)));
    }

    // ── operators ────────────────────────────────────────────────────────────

    #[test]
    fn prefix_expressions() {
        for (src, op, rendered) in [("!5;", PrefixOp::Not, "(!5)"), ("-15;", PrefixOp::Neg, "(-15)"), ("!true", PrefixOp::Not, "(!true)")] {
            let expr = single_expr(src);
            match &expr {
                Expression::Prefix(p) => assert_eq!(p.operator, op),
                other => panic!("expected prefix, got {other:?}"),
            }
            assert_eq!(expr.to_string(), rendered);
        }
    }

    #[test]
    fn infix_expressions() {
        let cases = [
            ("5 + 5;", InfixOp::Add),
            ("5 - 5;", InfixOp::Sub),
            ("5 * 5;", InfixOp::Mul),
            ("5 / 5;", InfixOp::Div),
            ("5 > 5;", InfixOp::Gt),
            ("5 < 5;", InfixOp::Lt),
            ("5 == 5;", InfixOp::Eq),
            ("5 != 5;", InfixOp::NotEq),
            ("true == false", InfixOp::Eq),
        ];
        for (src, op) in cases {
            match single_expr(src) {
                Expression::Infix(i) => assert_eq!(i.operator, op, "{src}"),
                other => panic!("expected infix for {src}, got {other:?}"),
            }
        }
        assert_eq!(single_expr("5 + 5;").to_string(), "(5 + 5)");
    }

    #[test]
    fn operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)\n((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ("true", "true"),
            ("3 > 5 == false", "((3 > 5) == false)"),
            ("3 < 5 == true", "((3 < 5) == true)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            ("add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))", "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))"),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            ("add(a * b[2], b[1], 2 * [1, 2][1])", "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))"),
            ("x = 1 + 2", "x = (1 + 2)"),
            ("x = y = 5", "x = y = 5"),
            ("null == x", "(null == x)"),
        ];
        for (src, expected) in cases {
            assert_eq!(parse(src).to_string(), expected, "source: {src}");
        }
    }

    // ── compound expressions ─────────────────────────────────────────────────

    #[test]
    fn if_expression() {
        match single_expr("if (x < y) { x }") {
            Expression::If(i) => {
                assert_eq!(i.condition.to_string(), "(x < y)");
                assert_eq!(i.consequence.statements.len(), 1);
                assert!(i.alternative.is_none());
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn if_else_expression() {
        let expr = single_expr("if (x < y) { x } else { y }");
        match &expr {
            Expression::If(i) => assert_eq!(i.alternative.as_ref().map(|b| b.statements.len()), Some(1)),
            other => panic!("expected if, got {other:?}"),
        }
        assert_eq!(expr.to_string(), "if (x < y) { x } else { y }");
    }

    #[test]
    fn if_without_parens() {
        assert_eq!(single_expr("if x { 1 }").to_string(), "if x { 1 }");
    }

    #[test]
    fn function_literal() {
        let expr = single_expr("fn(x, y) { x + y; }");
        match &expr {
            Expression::Function(f) => {
                let params: Vec<_> = f.parameters.iter().map(|p| p.value.as_str()).collect();
                assert_eq!(params, vec!["x", "y"]);
                assert_eq!(f.body.statements.len(), 1);
            }
            other => panic!("expected function, got {other:?}"),
        }
        assert_eq!(expr.to_string(), "fn(x, y) { (x + y) }");
    }

    #[test]
    fn function_parameter_lists() {
        for (src, count) in [("fn() {};", 0), ("fn(x) {};", 1), ("fn(x, y, z) {};", 3)] {
            match single_expr(src) {
                Expression::Function(f) => assert_eq!(f.parameters.len(), count, "{src}"),
                other => panic!("expected function, got {other:?}"),
            }
        }
        assert_eq!(single_expr("fn() {}").to_string(), "fn() {}");
    }

    #[test]
    fn call_expression() {
        let expr = single_expr("add(1, 2 * 3, 4 + 5);");
        match &expr {
            Expression::Call(c) => {
                assert_eq!(c.function.to_string(), "add");
                assert_eq!(c.arguments.len(), 3);
            }
            other => panic!("expected call, got {other:?}"),
        }
        assert_eq!(expr.to_string(), "add(1, (2 * 3), (4 + 5))");
    }

    #[test]
    fn call_on_function_literal() {
        assert_eq!(single_expr("fn(x) { x }(5)").to_string(), "fn(x) { x }(5)");
    }

    #[test]
    fn array_literal() {
        let expr = single_expr("[1, 2 * 2, 3 + 3]");
        match &expr {
            Expression::Array(a) => assert_eq!(a.elements.len(), 3),
            other => panic!("expected array, got {other:?}"),
        }
        assert_eq!(expr.to_string(), "[1, (2 * 2), (3 + 3)]");
        assert_eq!(single_expr("[]").to_string(), "[]");
    }

    #[test]
    fn index_expression() {
        match single_expr("myArray[1 + 1]") {
            Expression::Index(i) => {
                assert_eq!(i.left.to_string(), "myArray");
                assert_eq!(i.index.to_string(), "(1 + 1)");
            }
            other => panic!("expected index, got {other:?}"),
        }
    }

    #[test]
    fn hash_literal_string_keys() {
        match single_expr(r#"{"one": 1, "two": 2, "three": 3}"#) {
            Expression::Hash(h) => {
                let rendered: Vec<_> = h.pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                assert_eq!(rendered, vec![r#""one"=1"#, r#""two"=2"#, r#""three"=3"#]);
            }
            other => panic!("expected hash, got {other:?}"),
        }
    }

    #[test]
    fn hash_literal_mixed_keys_and_expressions() {
        let expr = single_expr(r#"{1: 0 + 1, true: "t", "x": 10 - 8}"#);
        assert_eq!(expr.to_string(), r#"{1: (0 + 1), true: "t", "x": (10 - 8)}"#);
    }

    #[test]
    fn empty_hash_literal() {
        match single_expr("{}") {
            Expression::Hash(h) => assert!(h.pairs.is_empty()),
            other => panic!("expected hash, got {other:?}"),
        }
    }

    #[test]
    fn for_expression() {
        let expr = single_expr("for i, v in items { print(v) }");
        match &expr {
            Expression::For(f) => {
                assert_eq!(f.index.value, "i");
                assert_eq!(f.value.value, "v");
                assert_eq!(f.target.value, "items");
                assert_eq!(f.body.statements.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        }
        assert_eq!(expr.to_string(), "for i, v in items { print(v) }");
    }

    #[test]
    fn assign_expression() {
        match single_expr("total = total + 1;") {
            Expression::Assign(a) => {
                assert_eq!(a.name.value, "total");
                assert_eq!(a.value.to_string(), "(total + 1)");
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_block_is_accepted() {
        let p = parse("if (x) { 1");
        assert_eq!(p.statements.len(), 1);
    }

    // ── diagnostics ──────────────────────────────────────────────────────────

    #[test]
    fn let_missing_identifier() {
        let errs = parse_errs("let = 5;");
        assert_eq!(errs[0].code, ErrorCode::P002);
        assert_eq!(errs[0].message, "expected next token to be `IDENT`, found `=`");
    }

    #[test]
    fn let_missing_assign() {
        let errs = parse_errs("let x 5;");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "expected next token to be `=`, found `INT`");
        assert_eq!((errs[0].line, errs[0].column), (1, 7));
    }

    #[test]
    fn missing_prefix_rule() {
        let errs = parse_errs("let x = ;");
        assert_eq!(errs[0].code, ErrorCode::P001);
        assert!(errs[0].message.contains("`;`"), "{}", errs[0].message);
    }

    #[test]
    fn return_requires_expression() {
        let errs = parse_errs("return;");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn illegal_character() {
        let errs = parse_errs("let x = @;");
        assert_eq!(errs[0].code, ErrorCode::L001);
        assert_eq!(errs[0].message, "illegal character `@`");
    }

    #[test]
    fn integer_out_of_range() {
        let errs = parse_errs("99999999999999999999");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    #[test]
    fn invalid_assignment_target() {
        let errs = parse_errs("1 + x = 5");
        assert_eq!(errs[0].code, ErrorCode::P004);
        let errs = parse_errs("a[0] = 1");
        assert_eq!(errs[0].code, ErrorCode::P004);
    }

    #[test]
    fn for_target_must_be_identifier() {
        let errs = parse_errs("for i, v in [1, 2] { i }");
        assert_eq!(errs[0].code, ErrorCode::P002);
        assert!(errs[0].message.contains("IDENT"));
    }

    #[test]
    fn unclosed_call_arguments() {
        let errs = parse_errs("add(1, 2");
        assert_eq!(errs[0].message, "expected next token to be `)`, found `EOF`");
    }

    #[test]
    fn hash_missing_colon() {
        let errs = parse_errs(r#"{"a" 1}"#);
        assert_eq!(errs[0].message, "expected next token to be `:`, found `INT`");
    }

    #[test]
    fn display_includes_code_and_position() {
        let errs = parse_errs("let 5");
        assert_eq!(errs[0].to_string(), "[P002] 1:5 — expected next token to be `IDENT`, found `INT`");
    }

    #[test]
    fn recovery_keeps_parsing_later_statements() {
        let mut parser = Parser::new(Lexer::new("let x 5; let y = 10; let = 3; y"));
        let program = parser.parse_program();
        assert_eq!(parser.errors().len(), 2);
        let rendered: Vec<_> = program.statements.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["let y = 10;", "y"]);
        assert_eq!(parser.error_messages().len(), 2);
    }

    #[test]
    fn recovery_inside_function_body() {
        let mut parser = Parser::new(Lexer::new("let f = fn(x) { let = 1; x + 1 }; f(2)"));
        let program = parser.parse_program();
        assert_eq!(parser.errors().len(), 1);
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.statements[0].to_string(), "let f = fn(x) { (x + 1) };");
    }

    #[test]
    fn stray_closing_brace() {
        let mut parser = Parser::new(Lexer::new("} let a = 1;"));
        let program = parser.parse_program();
        assert_eq!(parser.errors().len(), 1);
        assert_eq!(program.statements.len(), 1);
    }
}
