//! Parser for JSON-with-comments configuration documents.
//!
//! Accepts plain JSON plus `//` and `/* */` comments, unquoted keys,
//! single-quoted strings, trailing commas, and `+`/leading-`.` numbers.

mod error;
mod grammar;

pub use error::ParseError;

/// Parse a configuration document into a JSON value.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid document.
pub fn parse_document(input: &str) -> Result<serde_json::Value, ParseError> {
    use winnow::Parser;
    grammar::parse_document
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
