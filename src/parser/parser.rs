//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the `parse` entry point.
//! The parser pulls tokens from a `TokenStream` with one token of lookahead
//! and dispatches through lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//!
//! Malformed input never aborts the parse. Each failed statement is recorded
//! as an `Error` and parsing resumes at the next token.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::ast::Program,
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::TokenStream,
        tokens::{Token, TokenKind},
    },
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_stmt,
};

/// Deepest expression nesting accepted before the parser gives up on an
/// expression with a `NestingTooDeep` diagnostic. Nested operands and
/// folded operators both count, so the height of any parsed tree stays
/// below this and parsing, rendering and dropping it fit a default thread
/// stack.
pub const MAX_NESTING_DEPTH: usize = 100;

/// The main parser structure that maintains parsing state.
///
/// A parser is single-pass: construct it, call `parse_program` once, then
/// read `errors`.
pub struct Parser {
    /// Source of tokens, pulled on demand
    tokens: Box<dyn TokenStream>,
    /// The token being parsed
    current: Token,
    /// One token of lookahead
    peek: Token,
    /// Diagnostics in encounter order
    errors: Vec<Error>,
    /// Number of `parse_expr` calls currently on the stack
    depth: usize,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
}

impl Parser {
    /// Creates a new Parser, registers the handler tables and primes the
    /// `current` and `peek` tokens.
    pub fn new(tokens: impl TokenStream + 'static) -> Self {
        let mut tokens: Box<dyn TokenStream> = Box::new(tokens);
        let current = tokens.next_token();
        let peek = tokens.next_token();

        let mut parser = Parser {
            tokens,
            current,
            peek,
            errors: Vec::new(),
            depth: 0,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
        };
        create_token_lookups(&mut parser);
        parser
    }

    /// Parses statements until EOF.
    ///
    /// Always advances at least one token per statement, so malformed input
    /// cannot stall the loop.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.current_token_is(TokenKind::EOF) {
            match parse_stmt(self) {
                Ok(stmt) => program.statements.push(stmt),
                Err(error) => {
                    self.record_error(error);
                    // The failed statement owns its terminator
                    if self.peek_token_is(TokenKind::Semicolon) {
                        self.next_token();
                    }
                }
            }
            self.next_token();
        }

        program
    }

    /// Diagnostics collected so far, in encounter order.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.to_string()).collect()
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    fn record_error(&mut self, error: Error) {
        debug!(error = %error, position = error.get_position().0, "recorded parse error");
        self.errors.push(error);
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn current_token_is(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    pub fn peek_token(&self) -> &Token {
        &self.peek
    }

    pub fn peek_token_kind(&self) -> TokenKind {
        self.peek.kind
    }

    pub fn peek_token_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    /// Shifts the lookahead window by one token.
    pub fn next_token(&mut self) {
        let next = self.tokens.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    /// Advances if the peek token has the expected kind and returns the new
    /// current token. Otherwise leaves the cursor alone and returns an
    /// `UnexpectedToken` error located at the peek token.
    pub fn expect_peek(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        if self.peek_token_is(expected_kind) {
            self.next_token();
            Ok(self.current.clone())
        } else {
            Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    expected: expected_kind,
                    actual: self.peek.kind,
                },
                self.peek.span.start.clone(),
            ))
        }
    }

    /// Enters one level of expression nesting, failing once the nesting
    /// reaches `MAX_NESTING_DEPTH`. The error is located at the current
    /// token.
    pub fn enter_nesting(&mut self) -> Result<(), Error> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::new(
                ErrorImpl::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                },
                self.current.span.start.clone(),
            ));
        }

        self.depth += 1;
        Ok(())
    }

    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// Unwinds nesting to a depth saved with `nesting_depth`.
    pub fn restore_nesting(&mut self, depth: usize) {
        self.depth = depth;
    }

    /// Binding power of the peek token, `Lowest` if it is not an operator.
    pub fn peek_precedence(&self) -> BindingPower {
        self.precedence_of(self.peek.kind)
    }

    /// Binding power of the current token, `Lowest` if it is not an operator.
    pub fn current_precedence(&self) -> BindingPower {
        self.precedence_of(self.current.kind)
    }

    fn precedence_of(&self, kind: TokenKind) -> BindingPower {
        self.binding_power_lookup
            .get(&kind)
            .copied()
            .unwrap_or(BindingPower::Lowest)
    }

    /// Returns a reference to the statement lookup table.
    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Returns a reference to the NUD (null denotation) lookup table.
    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    /// Returns a reference to the LED (left denotation) lookup table.
    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    /// Returns a reference to the binding power lookup table.
    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    ///
    /// # Arguments
    ///
    /// * `kind` - The token kind to register
    /// * `binding_power` - The precedence/binding power for this operator
    /// * `led_fn` - The handler function for this infix operator
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// Does not touch the binding power table, so a token can be both a
    /// prefix and an infix operator (`-`).
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }
}

/// Parses a token stream into a Program.
///
/// This is the main entry point for parsing. It builds a parser, parses all
/// statements until EOF and hands back the collected diagnostics. A
/// non-empty error list means the program may be missing statements.
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse(tokens: impl TokenStream + 'static) -> (Program, Vec<Error>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();

    debug!(
        statements = program.len(),
        errors = parser.errors().len(),
        "finished parsing"
    );

    (program, parser.into_errors())
}
