use crate::ast::{Expr, Program, Stmt};
use crate::lexer::{Lexer, Precedence, Token, TokenKind};
use lim_source::{Source, SyntaxError};
use log::debug;
use std::mem;

mod expr;
mod stmt;

type PrefixParseFn<'a> = fn(&mut Parser<'a>) -> Option<Expr>;
type InfixParseFn<'a> = fn(&mut Parser<'a>, Expr) -> Option<Expr>;

/// Two-token window over a [`Lexer`].
///
/// `EndOfLine` tokens never become `current` or `peek`; instead [`TokenCursor::peek_on_new_line`]
/// tells whether at least one newline separates the two tokens.
pub struct TokenCursor<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    peek_on_new_line: bool,
}

impl<'a> TokenCursor<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let (current, _) = Self::pull(&mut lexer);
        let (peek, peek_on_new_line) = Self::pull(&mut lexer);
        Self {
            lexer,
            current,
            peek,
            peek_on_new_line,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn peek(&self) -> &Token {
        &self.peek
    }

    pub fn peek_on_new_line(&self) -> bool {
        self.peek_on_new_line
    }

    pub fn advance(&mut self) {
        let (next, new_line) = Self::pull(&mut self.lexer);
        self.current = mem::replace(&mut self.peek, next);
        self.peek_on_new_line = new_line;
    }

    /// Returns the next significant token and whether a newline was skipped to reach it.
    fn pull(lexer: &mut Lexer<'a>) -> (Token, bool) {
        let mut new_line = false;
        loop {
            let token = lexer.next_token();
            if token.kind != TokenKind::EndOfLine {
                return (token, new_line);
            }
            new_line = true;
        }
    }
}

pub struct Parser<'a> {
    cursor: TokenCursor<'a>,
    /// Source code
    source: &'a Source<'a>,
    /// Number of open `(` / `[` groups. Newlines only end an expression outside of groups.
    group_depth: u32,
    /// Set when an illegal token is reached. The lexer already reported it.
    halted: bool,
    /// Offset of the last `}` consumed by [`Parser::parse_block`].
    last_block_end: Option<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self {
            cursor: TokenCursor::new(Lexer::new(source)),
            source,
            group_depth: 0,
            halted: false,
            last_block_end: None,
        }
    }
}

impl<'a> Parser<'a> {
    /// Parses the whole source.
    /// Errors are accumulated in `source.errors`; the program must not be evaluated unless
    /// `source.has_no_errors()`.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.at_end() {
            if self.current_is(TokenKind::Semicolon) {
                self.next();
                continue;
            }
            match self.parse_terminated_stmt() {
                Some(stmt) => statements.push(stmt),
                None => {
                    self.synchronize();
                }
            }
            self.next();
        }

        debug!(
            "parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.source.errors.len()
        );
        Program { statements }
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        self.cursor.current()
    }

    fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    fn next(&mut self) {
        self.cursor.advance();
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_end(&self) -> bool {
        self.halted || matches!(self.current().kind, TokenKind::Eof | TokenKind::Illegal)
    }

    fn peek_precedence(&self) -> Precedence {
        self.peek().kind.precedence()
    }

    /// Returns `true` if the statement ending at the current token may stop here.
    fn peek_ends_statement(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.cursor.peek_on_new_line()
    }

    /// Returns `true` if a newline separates the current expression from the peek token.
    fn peek_breaks_expr(&self) -> bool {
        self.group_depth == 0 && self.cursor.peek_on_new_line()
    }

    /// Eats the peek token if it is of kind `kind`. Raises an error otherwise.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next();
            Some(())
        } else {
            self.unexpected_peek(&describe_kind(kind));
            None
        }
    }

    /// Eats an identifier and returns its name.
    fn expect_ident(&mut self) -> Option<String> {
        self.expect_peek(TokenKind::Ident)?;
        Some(self.current().literal.clone())
    }

    /// Runs `f` inside a `(` / `[` group, where newlines do not end expressions.
    fn in_group<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        self.group_depth += 1;
        let result = f(self);
        self.group_depth -= 1;
        result
    }

    /// Consumes the statement separator following a statement.
    fn parse_terminated_stmt(&mut self) -> Option<Stmt> {
        let stmt = self.parse_stmt()?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next();
        } else if !self.current_is(TokenKind::RBrace) && !self.peek_ends_statement() {
            self.unexpected_peek("end of statement");
            return None;
        }
        Some(stmt)
    }

    /// Skips the rest of a broken statement, keeping `{ }` pairs balanced.
    /// Returns `true` if it stopped on the `}` closing the enclosing block.
    fn synchronize(&mut self) -> bool {
        self.group_depth = 0;
        let mut depth = 0usize;
        loop {
            if self.at_end() {
                return false;
            }
            match self.current().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => depth -= 1,
                TokenKind::RBrace if self.last_block_end != Some(self.current().span.start) => {
                    return true
                }
                _ => {}
            }
            if depth == 0 && self.peek_ends_statement() {
                return false;
            }
            self.next();
        }
    }

    /// Raises an "expected ..., found ..." error on the peek token.
    fn unexpected_peek(&mut self, expected: &str) {
        let token = self.peek().clone();
        self.error_at(
            &token,
            format!("expected {}, found {}", expected, describe_token(&token)),
        );
    }

    /// Raises an "expected ..., found ..." error on the current token.
    fn unexpected_current(&mut self, expected: &str) {
        let token = self.current().clone();
        self.error_at(
            &token,
            format!("expected {}, found {}", expected, describe_token(&token)),
        );
    }

    fn error_at(&mut self, token: &Token, message: impl ToString) {
        if self.halted {
            return;
        }
        if token.kind == TokenKind::Illegal {
            self.halted = true;
            return;
        }
        self.source
            .errors
            .add_error(SyntaxError::new(message, token.span.clone()))
    }
}

fn describe_kind(kind: TokenKind) -> String {
    if kind.is_symbol() {
        format!("`{}`", kind)
    } else {
        kind.to_string()
    }
}

fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Ident | TokenKind::Int => format!("{} `{}`", token.kind, token.literal),
        kind => describe_kind(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_skips_newlines() {
        let source = "a\n\nb c".into();
        let mut cursor = TokenCursor::new(Lexer::new(&source));
        assert_eq!(cursor.current().literal, "a");
        assert_eq!(cursor.peek().literal, "b");
        assert!(cursor.peek_on_new_line());

        cursor.advance();
        assert_eq!(cursor.current().literal, "b");
        assert_eq!(cursor.peek().literal, "c");
        assert!(!cursor.peek_on_new_line());

        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.current().kind, TokenKind::Eof);
        assert_eq!(cursor.peek().kind, TokenKind::Eof);
    }

    #[test]
    fn test_empty_program() {
        let source = "\n ; \n".into();
        let program = Parser::new(&source).parse_program();
        assert!(source.has_no_errors());
        assert!(program.statements.is_empty());
    }
}
