mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedLogic;

/// Parse a DSL input string into a [`ParsedLogic`].
///
/// # Errors
///
/// Returns [`ParseError`] with the line and column where parsing stopped if
/// the input is not valid DSL syntax.
pub fn parse(input: &str) -> Result<ParsedLogic, ParseError> {
    use winnow::Parser;
    grammar::parse_logic
        .parse(input)
        .map_err(|e| ParseError::at(input, e.offset(), e.inner().to_string()))
}
