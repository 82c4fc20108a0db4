//! Turtle decoding.
//!
//! The [`Lexer`] shares its character scanning with the N-Triples lexer. The
//! [`Parser`] keeps the prefix table and base IRI of the document, and hands
//! out the triples of each statement one by one.
pub mod lexing;
pub mod parsing;

pub use lexing::{Lexer, Token};
pub use parsing::Parser;
