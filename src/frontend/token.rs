use serde::{Deserialize, Serialize};

/// Classification of a whitespace-delimited source word.
///
/// The set is fixed at compile time: keywords map to their own kind through
/// [`TokenKind::keyword`], everything else is decided by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Invalid,
    Symbol,
    Integer,

    // Stack operations
    Pop,
    Dup,
    Over,
    Swap,

    // Arithmetic
    Add,
    Sub,

    // Comparison
    Eq,
    Neq,
    Gt,
    Lt,

    // Logic
    Or,
    And,

    // I/O
    Print,
    DbgPrint,

    // Control flow
    While,
    If,
    Else,
    Do,
    End,

    // Definitions
    Def,
    Array,

    // Array access (`?name`, `!name`)
    ArrayGet,
    ArraySet,
}

impl TokenKind {
    /// Looks up a word in the keyword table.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "pop" => TokenKind::Pop,
            "dup" => TokenKind::Dup,
            "over" => TokenKind::Over,
            "swap" => TokenKind::Swap,

            "add" => TokenKind::Add,
            "sub" => TokenKind::Sub,

            "eq" => TokenKind::Eq,
            "neq" => TokenKind::Neq,
            "gt" => TokenKind::Gt,
            "lt" => TokenKind::Lt,

            "or" => TokenKind::Or,
            "and" => TokenKind::And,

            "print" => TokenKind::Print,
            "dbgprint" => TokenKind::DbgPrint,

            "while" => TokenKind::While,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,

            "def" => TokenKind::Def,
            "array" => TokenKind::Array,

            _ => return None,
        };
        Some(kind)
    }

    /// Returns true for keywords that open or close a block.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            TokenKind::While
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Do
                | TokenKind::End
                | TokenKind::Def
                | TokenKind::Array
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Invalid => "invalid",
            TokenKind::Symbol => "symbol",
            TokenKind::Integer => "integer",
            TokenKind::Pop => "pop",
            TokenKind::Dup => "dup",
            TokenKind::Over => "over",
            TokenKind::Swap => "swap",
            TokenKind::Add => "add",
            TokenKind::Sub => "sub",
            TokenKind::Eq => "eq",
            TokenKind::Neq => "neq",
            TokenKind::Gt => "gt",
            TokenKind::Lt => "lt",
            TokenKind::Or => "or",
            TokenKind::And => "and",
            TokenKind::Print => "print",
            TokenKind::DbgPrint => "dbgprint",
            TokenKind::While => "while",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Do => "do",
            TokenKind::End => "end",
            TokenKind::Def => "def",
            TokenKind::Array => "array",
            TokenKind::ArrayGet => "array-get",
            TokenKind::ArraySet => "array-set",
        };
        write!(f, "{}", name)
    }
}

/// A lexed word with its 1-based source line.
///
/// For `ArrayGet`/`ArraySet` the sigil is already stripped from `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::ArrayGet => write!(f, "?{}", self.text),
            TokenKind::ArraySet => write!(f, "!{}", self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}
