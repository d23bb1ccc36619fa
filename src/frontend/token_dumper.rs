use std::io::{self, Write};

use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const RED: &'static str = "\x1b[31m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, tokens: &[Token]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_to(&mut out, tokens)
    }

    pub fn write_to(&self, out: &mut impl Write, tokens: &[Token]) -> io::Result<()> {
        for token in tokens {
            let colr = if self.color { self.color(token.kind) } else { "" };
            let reset = if self.color { Self::RESET } else { "" };
            writeln!(
                out,
                "[{:02}] {}{:<8} {}{}",
                token.line,
                colr,
                self.category(token.kind),
                token,
                reset
            )?;
        }
        Ok(())
    }

    fn category(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Invalid => "INVALID",
            Symbol => "SYMBOL",
            Integer => "INT",
            ArrayGet | ArraySet => "ARRAY",
            While | If | Else | Do | End | Def | Array => "BLOCK",
            _ => "OP",
        }
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Invalid => Self::RED,
            Symbol => Self::YEL,
            Integer => Self::CYN,
            ArrayGet | ArraySet => Self::GRN,
            While | If | Else | Do | End | Def | Array => Self::MAG,
            _ => Self::RESET,
        }
    }
}
