//! Recursive-descent parser: token stream → [`Scope`].
//!
//! Body lines are classified by lookahead before the line's `Newline`:
//! an arrow makes the line a transition, a colon without an arrow makes
//! it an event protocol, anything else is a state.

use std::path::Path;

use crate::lexer::{Token, TokenKind, TokenKind as TK};
use crate::tree::{
    EventProtocol, Import, Node, NodeId, NodeKind, Scope, StateKind, Transition, UseDirective,
};

mod errors;

pub use errors::ParseError;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    curr_token: &'a Token,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            curr_token: &tokens[0],
        }
    }

    /// Parses one source file. When the file has no `@machine` header,
    /// its body becomes a single implicit machine named after the file
    /// stem.
    pub fn parse(&mut self, file: &Path) -> Result<Scope, ParseError> {
        let mut scope = Scope::new(file.to_path_buf());

        while self.curr_token.kind != TK::Eof {
            match &self.curr_token.kind {
                TK::Directive(name) if name == "include" => self.parse_import(&mut scope)?,
                TK::Directive(name) if name == "machine" => self.parse_machine(&mut scope)?,
                TK::Directive(name) => {
                    return Err(ParseError::DirectiveNotAllowed(
                        name.clone(),
                        self.curr_token.span,
                    ));
                }
                TK::Ident(_) if scope.machines.is_empty() => {
                    self.parse_implicit_machine(&mut scope, file)?;
                }
                _ => {
                    return Err(ParseError::ExpectedTopLevelItem(self.curr_token.clone()));
                }
            }
        }

        Ok(scope)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
            self.curr_token = &self.tokens[self.pos];
        }
    }

    fn consume(&mut self, expected: &TokenKind) -> Result<(), ParseError> {
        if self.curr_token.kind == *expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::ExpectedToken(
                expected.clone(),
                self.curr_token.clone(),
            ))
        }
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        if let TK::Ident(name) = &self.curr_token.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::ExpectedIdent(self.curr_token.clone()))
        }
    }

    fn parse_string_lit(&mut self) -> Result<String, ParseError> {
        if let TK::StringLit(value) = &self.curr_token.kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(ParseError::ExpectedStringLit(self.curr_token.clone()))
        }
    }

    /// True when `target` appears before the end of the current line.
    fn line_contains(&self, target: &TokenKind) -> bool {
        for token in &self.tokens[self.pos..] {
            if token.kind == *target {
                return true;
            }
            if matches!(token.kind, TK::Newline | TK::Eof) {
                return false;
            }
        }
        false
    }

    fn parse_import(&mut self, scope: &mut Scope) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        self.advance(); // @include
        let file = self.parse_string_lit()?;
        self.consume(&TK::Newline)?;
        scope.imports.push(Import {
            file,
            resolved_file: None,
            span,
        });
        Ok(())
    }

    fn parse_machine(&mut self, scope: &mut Scope) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        self.advance(); // @machine
        let id = self.parse_ident()?;
        self.consume(&TK::Newline)?;

        let machine = scope.add_node(Node::new(id, NodeKind::Machine, None, span));
        scope.machines.push(machine);

        if self.curr_token.kind == TK::Indent {
            self.advance();
            self.parse_state_body(scope, machine)?;
            self.consume(&TK::Dedent)?;
        }
        Ok(())
    }

    fn parse_implicit_machine(&mut self, scope: &mut Scope, file: &Path) -> Result<(), ParseError> {
        let id = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "machine".to_string());
        let machine = scope.add_node(Node::new(id, NodeKind::Machine, None, self.curr_token.span));
        scope.machines.push(machine);
        self.parse_state_body(scope, machine)
    }

    fn parse_state_body(&mut self, scope: &mut Scope, parent: NodeId) -> Result<(), ParseError> {
        loop {
            match &self.curr_token.kind {
                TK::Dedent | TK::Eof => return Ok(()),
                TK::Directive(name) if name == "use" => self.parse_use(scope, parent)?,
                TK::Directive(name) => {
                    return Err(ParseError::DirectiveNotAllowed(
                        name.clone(),
                        self.curr_token.span,
                    ));
                }
                TK::Ident(_) => {
                    if self.line_contains(&TK::Arrow) {
                        self.parse_transition(scope, parent)?;
                    } else if self.line_contains(&TK::Colon) {
                        self.parse_event_protocol(scope, parent)?;
                    } else {
                        self.parse_state(scope, parent)?;
                    }
                }
                _ => {
                    return Err(ParseError::ExpectedStateBodyItem(self.curr_token.clone()));
                }
            }
        }
    }

    fn parse_use(&mut self, scope: &mut Scope, parent: NodeId) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        self.advance(); // @use
        let machine_id = self.parse_ident()?;
        self.consume(&TK::Newline)?;

        let node = scope.node_mut(parent);
        if node.use_directive.is_some() {
            return Err(ParseError::DuplicateUseDirective(span));
        }
        node.use_directive = Some(UseDirective {
            machine_id,
            resolved: None,
            span,
        });
        Ok(())
    }

    fn parse_state(&mut self, scope: &mut Scope, parent: NodeId) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        let id = self.parse_ident()?;

        let mut kind = StateKind::Atomic;
        let mut initial = false;
        if let TK::Marker(marker) = self.curr_token.kind {
            match marker {
                '*' => initial = true,
                '?' => kind = StateKind::Transient,
                '!' => kind = StateKind::Final,
                '&' => kind = StateKind::Parallel,
                _ => {}
            }
            self.advance();
        }
        self.consume(&TK::Newline)?;

        let mut node = Node::new(id, NodeKind::State(kind), Some(parent), span);
        node.initial = initial;
        let state = scope.add_node(node);
        scope.node_mut(parent).states.push(state);

        if self.curr_token.kind == TK::Indent {
            self.advance();
            self.parse_state_body(scope, state)?;
            self.consume(&TK::Dedent)?;
        }
        Ok(())
    }

    fn parse_transition(&mut self, scope: &mut Scope, parent: NodeId) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        let event = self.parse_event_list()?;
        self.consume(&TK::Arrow)?;
        let target = self.parse_target()?;

        let guard = if self.curr_token.kind == TK::Colon {
            self.advance();
            Some(self.parse_opaque_text())
        } else {
            None
        };
        self.consume(&TK::Newline)?;

        scope.node_mut(parent).transitions.push(Transition {
            event,
            target,
            guard,
            resolved: None,
            span,
        });
        Ok(())
    }

    fn parse_event_protocol(&mut self, scope: &mut Scope, parent: NodeId) -> Result<(), ParseError> {
        let span = self.curr_token.span;
        let event = self.parse_event_list()?;
        self.consume(&TK::Colon)?;

        let payload = if let TK::StringLit(value) = &self.curr_token.kind {
            let value = value.clone();
            self.advance();
            Some(value)
        } else {
            None
        };
        self.consume(&TK::Newline)?;

        scope.node_mut(parent).event_protocols.push(EventProtocol {
            event,
            payload,
            span,
        });
        Ok(())
    }

    fn parse_event_list(&mut self) -> Result<String, ParseError> {
        let mut events = vec![self.parse_ident()?];
        while self.curr_token.kind == TK::Comma {
            self.advance();
            events.push(self.parse_ident()?);
        }
        Ok(events.join(","))
    }

    /// A target path is one identifier run, except that a line-closing
    /// `*` wildcard lexes as a marker token and is glued back on here.
    fn parse_target(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match &self.curr_token.kind {
                TK::Ident(name) => {
                    text.push_str(name);
                    self.advance();
                }
                TK::Marker(marker) => {
                    text.push(*marker);
                    self.advance();
                }
                _ => break,
            }
        }
        if text.is_empty() {
            return Err(ParseError::ExpectedTarget(self.curr_token.clone()));
        }
        Ok(text)
    }

    /// Guard/action annotation text: everything up to the end of the
    /// line, kept opaque.
    fn parse_opaque_text(&mut self) -> String {
        let mut text = String::new();
        loop {
            match &self.curr_token.kind {
                TK::Newline | TK::Eof | TK::Indent | TK::Dedent => break,
                TK::Ident(name) => text.push_str(name),
                TK::StringLit(value) => {
                    text.push('"');
                    text.push_str(value);
                    text.push('"');
                }
                TK::Directive(name) => {
                    text.push('@');
                    text.push_str(name);
                }
                TK::Marker(marker) => text.push(*marker),
                TK::Arrow => text.push_str("->"),
                TK::Comma => text.push(','),
                TK::Colon => text.push(':'),
            }
            self.advance();
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
#[path = "../tests/t_parse.rs"]
mod tests;
