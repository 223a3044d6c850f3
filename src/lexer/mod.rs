//! Lexical analysis module.
//!
//! Converts source text into tokens for the parser:
//!
//! - Tokenization using an ordered table of anchored regex patterns
//! - Recognition of keywords, identifiers, integer literals and operators
//! - Token position tracking for error reporting
//! - Comments and whitespace handling
//!
//! The parser only depends on the `TokenStream` trait, so any token source
//! can feed it.

pub mod lexer;
pub mod tokens;
