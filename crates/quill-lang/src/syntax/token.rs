use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    // Literals
    Ident,
    Int,
    String,

    // Keywords
    Let,
    Const,
    Function,
    Return,
    True,
    False,
    If,
    Else,
    For,
    In,
    Null,

    // Operators
    Assign,     // =
    Equal,      // ==
    NotEqual,   // !=
    Plus,       // +
    Minus,      // -
    Bang,       // !
    Asterisk,   // *
    Slash,      // /
    LessThan,   // <
    GreaterThan, // >

    // Punctuation
    Comma,      // ,
    Semicolon,  // ;
    Colon,      // :
    LParen,     // (
    RParen,     // )
    LCurly,     // {
    RCurly,     // }
    LSquare,    // [
    RSquare,    // ]
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Illegal     => "ILLEGAL",
            Self::Eof         => "EOF",
            Self::Ident       => "IDENT",
            Self::Int         => "INT",
            Self::String      => "STRING",
            Self::Let         => "let",
            Self::Const       => "const",
            Self::Function    => "fn",
            Self::Return      => "return",
            Self::True        => "true",
            Self::False       => "false",
            Self::If          => "if",
            Self::Else        => "else",
            Self::For         => "for",
            Self::In          => "in",
            Self::Null        => "null",
            Self::Assign      => "=",
            Self::Equal       => "==",
            Self::NotEqual    => "!=",
            Self::Plus        => "+",
            Self::Minus       => "-",
            Self::Bang        => "!",
            Self::Asterisk    => "*",
            Self::Slash       => "/",
            Self::LessThan    => "<",
            Self::GreaterThan => ">",
            Self::Comma       => ",",
            Self::Semicolon   => ";",
            Self::Colon       => ":",
            Self::LParen      => "(",
            Self::RParen      => ")",
            Self::LCurly      => "{",
            Self::RCurly      => "}",
            Self::LSquare     => "[",
            Self::RSquare     => "]",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Let | Self::Const | Self::Function | Self::Return | Self::True | Self::False
            | Self::If | Self::Else | Self::For | Self::In | Self::Null
        )
    }

    /// Tokens that can only begin a statement; used by the parser to resynchronise.
    pub fn starts_statement(&self) -> bool {
        matches!(self, Self::Let | Self::Const | Self::Return)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an identifier run to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: &str) -> TokenKind {
    match s {
        "fn"     => TokenKind::Function,
        "let"    => TokenKind::Let,
        "const"  => TokenKind::Const,
        "return" => TokenKind::Return,
        "true"   => TokenKind::True,
        "false"  => TokenKind::False,
        "if"     => TokenKind::If,
        "else"   => TokenKind::Else,
        "for"    => TokenKind::For,
        "in"     => TokenKind::In,
        "null"   => TokenKind::Null,
        _        => TokenKind::Ident,
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text of the token (empty for `Eof`).
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, literal: literal.into(), line, column }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
