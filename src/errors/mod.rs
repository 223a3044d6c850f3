//! Error types and error handling.
//!
//! - Error structures with source position information
//! - Specific error variants for the lexing and parsing phases
//! - Error names and suggestions used when rendering diagnostics

pub mod errors;
