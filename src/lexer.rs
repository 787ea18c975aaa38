//! Indentation-sensitive tokenizer for WireState source text.
//!
//! Leading whitespace on non-blank lines defines a scope level: a wider
//! line pushes one level and emits [`TokenKind::Indent`], a narrower line
//! pops levels emitting one [`TokenKind::Dedent`] each and must land on a
//! width that is already open. Tabs in leading whitespace expand to a
//! fixed width of 2. Blank lines and `#` comment lines produce no tokens
//! and do not affect indentation.

use std::fmt::{Display, Formatter, Result as FmtResult};

use enum_display::EnumDisplay;
use thiserror::Error;

use crate::diag::{Position, Span, SpannedError};

const TAB_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, EnumDisplay)]
pub enum TokenKind {
    /// State, machine, or event name; may contain interior spaces.
    #[display("Ident({0})")]
    Ident(String),

    #[display("StringLit({0})")]
    StringLit(String),

    /// `@include`, `@machine`, `@use`; carries the word after `@`.
    #[display("@{0}")]
    Directive(String),

    /// Trailing `*` (initial), `?` (transient), `!` (final), `&` (parallel).
    #[display("Marker({0})")]
    Marker(char),

    #[display("->")]
    Arrow,

    #[display(",")]
    Comma,

    #[display(":")]
    Colon,

    #[display("Indent")]
    Indent,

    #[display("Dedent")]
    Dedent,

    #[display("Newline")]
    Newline,

    #[display("EOF")]
    Eof,
}

#[derive(Debug, Error)]
pub enum LexErrorKind {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),

    #[error("Inconsistent indentation: width {0} matches no open block")]
    InconsistentIndent(usize),

    #[error("Invalid escape sequence: {0}")]
    InvalidEscapeSequence(String),

    #[error("Unterminated string literal")]
    UnterminatedString,
}

pub type LexError = SpannedError<LexErrorKind>;
pub use LexErrorKind as LEK;

impl LexErrorKind {
    pub fn at(self, span: Span) -> LexError {
        LexError::new(self, span)
    }
}

/// Characters that close out a state identifier line.
fn is_marker(ch: char) -> bool {
    matches!(ch, '*' | '?' | '!' | '&')
}

pub struct Lexer<'a> {
    source: &'a str,
}

struct LineLexer<'a> {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    line_offset: usize,
    tokens: &'a mut Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source }
    }

    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut indents: Vec<usize> = vec![0];
        let mut offset = 0usize;
        let mut last_pos = Position {
            offset: 0,
            line: 1,
            column: 1,
        };

        for (line_idx, raw) in self.source.split('\n').enumerate() {
            let line_no = line_idx + 1;
            let raw_chars = raw.chars().count();
            let content = raw.strip_suffix('\r').unwrap_or(raw);
            let chars: Vec<char> = content.chars().collect();

            let mut width = 0usize;
            let mut body = 0usize;
            while body < chars.len() {
                match chars[body] {
                    ' ' => width += 1,
                    '\t' => width += TAB_WIDTH,
                    _ => break,
                }
                body += 1;
            }

            if body == chars.len() || chars[body] == '#' {
                offset += raw_chars + 1;
                continue;
            }

            let line_start = Position {
                offset,
                line: line_no,
                column: 1,
            };
            let body_pos = Position {
                offset: offset + body,
                line: line_no,
                column: body + 1,
            };
            let current = *indents.last().unwrap_or(&0);
            if width > current {
                indents.push(width);
                tokens.push(Token {
                    kind: TokenKind::Indent,
                    span: Span::new(line_start, body_pos),
                });
            } else if width < current {
                while let Some(&open) = indents.last()
                    && open > width
                {
                    indents.pop();
                    tokens.push(Token {
                        kind: TokenKind::Dedent,
                        span: Span::new(line_start, body_pos),
                    });
                }
                if *indents.last().unwrap_or(&0) != width {
                    return Err(LEK::InconsistentIndent(width).at(Span::new(line_start, body_pos)));
                }
            }

            let mut line_lexer = LineLexer {
                chars,
                idx: body,
                line: line_no,
                line_offset: offset,
                tokens: &mut tokens,
            };
            line_lexer.run()?;
            last_pos = line_lexer.pos();

            tokens.push(Token {
                kind: TokenKind::Newline,
                span: Span::new(last_pos, last_pos),
            });

            offset += raw_chars + 1;
        }

        while indents.len() > 1 {
            indents.pop();
            tokens.push(Token {
                kind: TokenKind::Dedent,
                span: Span::new(last_pos, last_pos),
            });
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(last_pos, last_pos),
        });

        Ok(tokens)
    }
}

impl LineLexer<'_> {
    fn pos(&self) -> Position {
        Position {
            offset: self.line_offset + self.idx,
            line: self.line,
            column: self.idx + 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    /// A marker character closes out the line when nothing but blanks
    /// follow it; anywhere else it is ordinary identifier text.
    fn closes_line(&self, at: usize) -> bool {
        self.chars[at + 1..]
            .iter()
            .all(|ch| matches!(ch, ' ' | '\t'))
    }

    fn push(&mut self, kind: TokenKind, start: Position) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos()),
        });
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(ch) = self.peek() {
            let start = self.pos();
            match ch {
                ' ' | '\t' => {
                    self.idx += 1;
                }
                '"' => self.lex_string_lit(start)?,
                '@' => {
                    self.idx += 1;
                    let mut word = String::new();
                    while let Some(ch) = self.peek()
                        && ch.is_alphabetic()
                    {
                        word.push(ch);
                        self.idx += 1;
                    }
                    if word.is_empty() {
                        return Err(
                            LEK::UnexpectedCharacter('@').at(Span::new(start, self.pos()))
                        );
                    }
                    self.push(TokenKind::Directive(word), start);
                }
                ',' => {
                    self.idx += 1;
                    self.push(TokenKind::Comma, start);
                }
                ':' => {
                    self.idx += 1;
                    self.push(TokenKind::Colon, start);
                }
                '-' if self.peek_at(1) == Some('>') => {
                    self.idx += 2;
                    self.push(TokenKind::Arrow, start);
                }
                ch if is_marker(ch) && self.closes_line(self.idx) => {
                    self.idx += 1;
                    self.push(TokenKind::Marker(ch), start);
                }
                ch if ch.is_control() => {
                    return Err(LEK::UnexpectedCharacter(ch).at(Span::new(start, self.pos())));
                }
                _ => self.lex_ident(start)?,
            }
        }
        Ok(())
    }

    fn lex_ident(&mut self, start: Position) -> Result<(), LexError> {
        let mut text = String::new();
        let mut end = self.idx;
        while let Some(ch) = self.peek() {
            match ch {
                ',' | ':' | '"' => break,
                '-' if self.peek_at(1) == Some('>') => break,
                ch if is_marker(ch) && self.closes_line(self.idx) => break,
                ch if ch.is_control() && ch != '\t' => {
                    return Err(
                        LEK::UnexpectedCharacter(ch).at(Span::new(self.pos(), self.pos()))
                    );
                }
                ch => {
                    text.push(ch);
                    self.idx += 1;
                    if !matches!(ch, ' ' | '\t') {
                        end = self.idx;
                    }
                }
            }
        }
        let end_pos = Position {
            offset: self.line_offset + end,
            line: self.line,
            column: end + 1,
        };
        self.tokens.push(Token {
            kind: TokenKind::Ident(text.trim().to_string()),
            span: Span::new(start, end_pos),
        });
        Ok(())
    }

    fn lex_string_lit(&mut self, start: Position) -> Result<(), LexError> {
        self.idx += 1; // consume opening quote
        let mut buf = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return Err(LEK::UnterminatedString.at(Span::new(start, self.pos())));
            };
            self.idx += 1;

            match ch {
                '"' => break,
                '\\' => {
                    let Some(esc) = self.peek() else {
                        return Err(LEK::UnterminatedString.at(Span::new(start, self.pos())));
                    };
                    self.idx += 1;
                    let unescaped = match esc {
                        'n' => '\n',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        _ => {
                            return Err(LEK::InvalidEscapeSequence(format!("\\{esc}"))
                                .at(Span::new(start, self.pos())));
                        }
                    };
                    buf.push(unescaped);
                }
                _ => buf.push(ch),
            }
        }

        self.push(TokenKind::StringLit(buf), start);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/t_lexer.rs"]
mod tests;
