use crate::frontend::token::{Token, TokenKind};

/// Line-oriented lexer.
///
/// Words are split on whitespace and classified in this order: keyword,
/// symbol, `?name` array read, `!name` array write, integer literal. Anything
/// else becomes `TokenKind::Invalid` and is reported by the parser, which has
/// the surrounding context for a better diagnostic.
///
/// Lines whose first non-whitespace character is `;` are comments.
pub struct Lexer<'src> {
    source: &'src str,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer { source }
    }

    pub fn tokenize(&self) -> Vec<Token> {
        let mut tokens = Vec::new();

        for (index, line) in self.source.lines().enumerate() {
            let line_number = index + 1;
            if line.trim_start().starts_with(';') {
                continue;
            }

            for word in line.split_whitespace() {
                tokens.push(classify(word, line_number));
            }
        }

        log::trace!("lexed {} tokens", tokens.len());
        tokens
    }
}

fn classify(word: &str, line: usize) -> Token {
    if let Some(kind) = TokenKind::keyword(word) {
        return Token::new(kind, word, line);
    }

    if is_name(word) {
        return Token::new(TokenKind::Symbol, word, line);
    }

    if let Some(name) = word.strip_prefix('?').filter(|name| is_name(name)) {
        return Token::new(TokenKind::ArrayGet, name, line);
    }

    if let Some(name) = word.strip_prefix('!').filter(|name| is_name(name)) {
        return Token::new(TokenKind::ArraySet, name, line);
    }

    if word.bytes().all(|b| b.is_ascii_digit()) {
        return Token::new(TokenKind::Integer, word, line);
    }

    Token::new(TokenKind::Invalid, word, line)
}

/// `[A-Za-z][A-Za-z0-9_]*`
fn is_name(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}
