use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

/// Single-cursor scanner. Never fails: characters it does not recognise come
/// back as `Illegal` tokens and the parser turns them into diagnostics.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0, line: 1, column: 1, finished: false }
    }

    /// Drain the stream. The returned vector always ends with exactly one `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.is(TokenKind::Eof);
            tokens.push(tok);
            if done { break; }
        }
        tokens
    }

    /// Produce the next token. Once the input is exhausted every call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let col = self.column;

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", line, col);
        }

        let start = self.pos;
        let ch = self.advance();

        let kind = match ch {
            b'{' => TokenKind::LCurly,
            b'}' => TokenKind::RCurly,
            b'[' => TokenKind::LSquare,
            b']' => TokenKind::RSquare,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Asterisk,
            b'/' => TokenKind::Slash,
            b'<' => TokenKind::LessThan,
            b'>' => TokenKind::GreaterThan,

            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::Equal }
                else { TokenKind::Assign }
            }
            b'!' => {
                if self.peek() == b'=' { self.advance(); TokenKind::NotEqual }
                else { TokenKind::Bang }
            }

            b'"' => {
                let text = self.read_string();
                return Token::new(TokenKind::String, text, line, col);
            }
            b'0'..=b'9' => {
                self.read_while(|b| b.is_ascii_digit());
                TokenKind::Int
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.read_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                keyword_or_ident(&self.source[start..self.pos])
            }

            _ => {
                // take the whole scalar value so the literal is valid UTF-8
                while !self.is_at_end() && !self.source.is_char_boundary(self.pos) {
                    self.pos += 1;
                }
                TokenKind::Illegal
            }
        };

        Token::new(kind, &self.source[start..self.pos], line, col)
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source.as_bytes()[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        // continuation bytes share the column of their lead byte
        else if ch & 0xC0 != 0x80 { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source.as_bytes()[self.pos] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.is_at_end() && pred(self.peek()) {
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Text up to the closing quote, verbatim. An unterminated string runs to
    /// end of input.
    fn read_string(&mut self) -> String {
        let start = self.pos;
        self.read_while(|b| b != b'"');
        let text = self.source[start..self.pos].to_string();
        if !self.is_at_end() {
            self.advance(); // closing "
        }
        text
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token up to and including the first `Eof`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let tok = self.next_token();
        if tok.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(tok)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
