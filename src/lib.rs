//! # bfcat
//!
//! Compiles a small stack-based concatenative language to tape-machine text
//! (Brainfuck plus a `?` debug-print command).
//!
//! ```text
//! source --Lexer--> tokens --Parser--> Program --Codegen--> tape code
//! ```
//!
//! Macros are expanded by the parser and arrays are laid out at parse time,
//! so the code generator only ever sees a flat instruction tree.

pub mod codegen;
pub mod frontend;
pub mod lang;
pub mod runtime;

use crate::codegen::{Codegen, CodegenError, CodegenOptions};
use crate::frontend::{Lexer, Parser, ParserError};
use crate::lang::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Parse(ParserError),
    Codegen(CodegenError),
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::Parse(err) => err.line,
            CompileError::Codegen(err) => err.line(),
        }
    }

    /// Stage name used as the CLI message prefix.
    pub fn stage(&self) -> &'static str {
        match self {
            CompileError::Parse(_) => "parse",
            CompileError::Codegen(_) => "codegen",
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Parse(err) => write!(f, "{}", err),
            CompileError::Codegen(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(err) => Some(err),
            CompileError::Codegen(err) => Some(err),
        }
    }
}

impl From<ParserError> for CompileError {
    fn from(err: ParserError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<CodegenError> for CompileError {
    fn from(err: CodegenError) -> Self {
        CompileError::Codegen(err)
    }
}

/// Lexes and parses `source` into an expanded program.
pub fn parse(source: &str) -> Result<Program, ParserError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse()
}

/// Lowers an already parsed program.
pub fn generate(program: &Program, options: &CodegenOptions) -> Result<String, CodegenError> {
    Codegen::new(program, *options).emit()
}

pub fn compile(source: &str, options: &CodegenOptions) -> Result<String, CompileError> {
    let program = parse(source)?;
    Ok(generate(&program, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ParserErrorKind;

    #[test]
    fn test_compile_simple() {
        let code = compile("3 4 add dbgprint", &CodegenOptions::default()).unwrap();
        assert_eq!(code, "+++>\n++++>\n<[-<+>]\n<?[-]");
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let err = compile("frob", &CodegenOptions::default()).unwrap_err();
        assert_eq!(err.stage(), "parse");
        assert_eq!(err.line(), 1);
        match err {
            CompileError::Parse(inner) => assert_eq!(inner.kind, ParserErrorKind::UnknownMacro),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_codegen_error_is_wrapped() {
        let err = compile("\n\nadd", &CodegenOptions::default()).unwrap_err();
        assert_eq!(err.stage(), "codegen");
        assert_eq!(err.line(), 3);
        assert!(err.to_string().contains("insufficient elements for `add`"));
    }

    #[test]
    fn test_generate_from_decoded_program() {
        let program = parse("def two 2 end two two add dbgprint").unwrap();
        let decoded = Program::from_bytes(&program.to_bytes().unwrap()).unwrap();
        let options = CodegenOptions::default();
        assert_eq!(
            generate(&decoded, &options).unwrap(),
            compile("def two 2 end two two add dbgprint", &options).unwrap()
        );
    }
}
