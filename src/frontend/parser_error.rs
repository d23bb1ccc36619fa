use crate::frontend::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorKind {
    /// A word the lexer could not classify, or a token with no meaning here.
    InvalidToken,
    /// `do`, `end` or `else` outside of the construct that owns it.
    NoContext,
    /// Input ended while a closing keyword was still expected.
    UnexpectedEof,
    UnknownMacro,
    UnknownArray,
    MalformedArray,
    MalformedDef,
    /// Control flow, array access or a non-leaf macro inside a condition.
    InvalidCondition,
    IntegerOutOfRange,
    DuplicateArray,
    /// Declared arrays no longer fit in the array region.
    ArrayTooLarge,
}

/// A parsing error with source location.
///
/// `line` is 1-based. `token` holds the text of the offending token; for EOF
/// errors it is the text of the token that opened the unterminated construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub message: String,
    pub line: usize,
    pub token: String,
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, message: impl Into<String>, token: &Token) -> Self {
        ParserError {
            kind,
            message: message.into(),
            line: token.line,
            token: token.to_string(),
        }
    }
}

impl std::fmt::Display for ParserError {
    /// Formats as `line N: message` for CLI-friendly diagnostics.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParserError {}
