mod error;
mod lexer;

#[cfg(test)]
mod token_test;

pub use error::{ParseError, Position, Span, offset_to_position};
pub use lexer::{Token, Tokenizer};
