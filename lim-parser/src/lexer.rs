use lim_source::{Source, SyntaxError};
use log::debug;
use logos::Logos;
use std::{fmt, ops::Range};

#[derive(Debug, Logos, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // literals
    // A digit run glued to letters (`889dal`) is rejected here and reported by `Lexer`.
    #[regex("[0-9][0-9A-Za-z_]*", |lex| lex.slice().bytes().all(|b| b.is_ascii_digit()))]
    Int,
    // The closing quote is optional so that an unterminated string stops at end of input.
    #[regex(r#""[^"]*"?"#, |lex| lex.slice().len() > 1 && lex.slice().ends_with('"'))]
    Str,

    // identifiers
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // keywords
    #[token("int")]
    KwInt,
    #[token("bool")]
    KwBool,
    #[token("string")]
    KwString,
    #[token("float")]
    KwFloat,
    #[token("fn")]
    Fn,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("const")]
    Const,
    #[token("struct")]
    Struct,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // unary operators
    #[token("!")]
    Bang,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    // - assignment
    #[token("=")]
    Assign,
    #[token(":=")]
    Define,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    AsteriskAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    // - equality
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    // - ordering
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    // - logic
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("&")]
    BitAnd,
    #[token("|")]
    BitOr,

    // punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Period,
    #[token("->")]
    Arrow,

    /// Newlines end statements, so they are tokens rather than whitespace.
    #[token("\n")]
    EndOfLine,

    /// Never returned by [`Lexer::next_token`].
    #[token("/*", block_comment)]
    BlockComment,

    // misc
    #[regex(r"[ \t\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[error]
    Illegal,

    /// Only generated by [`Lexer`] once the input is exhausted.
    Eof,
}

/// Consumes a block comment up to and including the closing `*/`, or up to end of input.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let len = match lex.remainder().find("*/") {
        Some(end) => end + 2,
        None => lex.remainder().len(),
    };
    lex.bump(len);
    true
}

/// Binding power of infix operators, from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `==` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/` `%`
    Product,
    /// `-x` `!x`
    Prefix,
    /// `f(x)`
    Call,
    /// `a[i]`
    Index,
}

impl TokenKind {
    /// Returns the precedence of the token when used as an infix operator.
    /// Tokens that cannot continue an expression return [`Precedence::Lowest`].
    pub fn precedence(&self) -> Precedence {
        match self {
            TokenKind::Or => Precedence::LogicalOr,
            TokenKind::And => Precedence::LogicalAnd,
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
            TokenKind::LParen => Precedence::Call,
            TokenKind::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }

    /// The source text of the token, or a short description for tokens without fixed text.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Int => "integer literal",
            TokenKind::Str => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::KwInt => "int",
            TokenKind::KwBool => "bool",
            TokenKind::KwString => "string",
            TokenKind::KwFloat => "float",
            TokenKind::Fn => "fn",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Return => "return",
            TokenKind::Const => "const",
            TokenKind::Struct => "struct",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Bang => "!",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Assign => "=",
            TokenKind::Define => ":=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::AsteriskAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::BitAnd => "&",
            TokenKind::BitOr => "|",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Period => ".",
            TokenKind::Arrow => "->",
            TokenKind::EndOfLine => "end of line",
            TokenKind::BlockComment => "comment",
            TokenKind::Illegal => "illegal token",
            TokenKind::Eof => "end of input",
        }
    }

    /// Returns `true` if the token has fixed source text (keywords, operators, punctuation).
    pub fn is_symbol(&self) -> bool {
        !matches!(
            self,
            TokenKind::Int
                | TokenKind::Str
                | TokenKind::Ident
                | TokenKind::EndOfLine
                | TokenKind::BlockComment
                | TokenKind::Illegal
                | TokenKind::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text of the token. String literals do not include their quotes.
    pub literal: String,
    /// Byte range in the source.
    pub span: Range<usize>,
    /// 1-based line the token starts on.
    pub line: usize,
}

/// Pull-based lexer over a [`Source`].
///
/// Lexical errors are reported into `source.errors` and surface as [`TokenKind::Illegal`] tokens.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    source: &'a Source<'a>,
    line: usize,
    line_start: usize,
    /// Offset up to which newlines have been counted.
    scanned: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self {
            inner: TokenKind::lexer(source.content),
            source,
            line: 1,
            line_start: 0,
            scanned: 0,
        }
    }

    /// 1-based number of the line the lexer is on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Byte offset at which the current line starts.
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    /// Returns the next token. Once the input is exhausted, keeps returning [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        loop {
            let kind = match self.inner.next() {
                Some(kind) => kind,
                None => {
                    let end = self.source.content.len();
                    self.track_lines(end);
                    return Token {
                        kind: TokenKind::Eof,
                        literal: String::new(),
                        span: end..end,
                        line: self.line,
                    };
                }
            };
            let span = self.inner.span();
            self.track_lines(span.start);
            let line = self.line;
            self.track_lines(span.end);

            let slice = self.source.content.get(span.clone()).unwrap_or_default();
            let literal = match kind {
                TokenKind::BlockComment => continue,
                TokenKind::Illegal => {
                    self.report_illegal(slice, span.clone());
                    slice
                }
                TokenKind::Str => &slice[1..slice.len() - 1],
                _ => slice,
            };

            return Token {
                kind,
                literal: literal.to_string(),
                span,
                line,
            };
        }
    }

    fn report_illegal(&self, slice: &str, span: Range<usize>) {
        let message = match slice.chars().next() {
            Some('"') => "unterminated string literal".to_string(),
            Some(c) if c.is_ascii_digit() => format!(
                "an identifier cannot start with a number, found `{}`",
                slice
            ),
            _ => format!("illegal character `{}`", slice),
        };
        debug!("line {}: {}", self.line, message);
        self.source.errors.add_error(SyntaxError::new(message, span));
    }

    fn track_lines(&mut self, offset: usize) {
        if offset <= self.scanned {
            return;
        }
        let scanned = &self.source.content[self.scanned..offset];
        for (i, _) in scanned.match_indices('\n') {
            self.line += 1;
            self.line_start = self.scanned + i + 1;
        }
        self.scanned = offset;
    }
}
