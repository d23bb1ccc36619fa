use crate::frontend::parser_error::{ParserError, ParserErrorKind};
use crate::frontend::token::{Token, TokenKind};
use crate::lang::{ARRAY_REGION_LIMIT, ArrayMode, ArraySpec, Instruction, Intrinsic, Program};

/// Single-pass recursive-descent parser.
///
/// The parser consumes the lexer's tokens and produces a `Program`:
/// - `body`: the top-level instruction tree
/// - `macros`: every `def` seen, in any block
/// - `arrays`: every `array` declaration with its static tape offset
///
/// Notes:
/// - Macro references are spliced into the current block when they are parsed,
///   so a macro must be defined before its first use.
/// - `?name`/`!name` must refer to an array declared earlier in the file.
/// - The first error aborts parsing.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    program: Program,
    /// Open instruction blocks. The last one receives parsed instructions.
    blocks: Vec<Vec<Instruction>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            program: Program::new(),
            blocks: vec![Vec::new()],
        }
    }

    /// Returns the current token without consuming it.
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consumes the current token. Callers have already seen it via `current`.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    /// Consumes the current token, or reports EOF on behalf of `opener`.
    fn expect_any(&mut self, opener: &Token, expected: &str) -> Result<Token, ParserError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            None => Err(self.eof(opener, expected)),
        }
    }

    fn eof(&self, opener: &Token, expected: &str) -> ParserError {
        ParserError::new(
            ParserErrorKind::UnexpectedEof,
            format!(
                "unexpected EOF, expecting '{}' for '{}' opened at line {}",
                expected, opener, opener.line
            ),
            opener,
        )
    }

    fn block(&mut self) -> &mut Vec<Instruction> {
        // `blocks` always holds the top-level block while parsing.
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Parses the whole token sequence.
    pub fn parse(mut self) -> Result<Program, ParserError> {
        while self.pos < self.tokens.len() {
            self.parse_once()?;
        }

        let mut program = self.program;
        program.body = self.blocks.pop().unwrap_or_default();
        log::debug!(
            "parsed {} top-level instructions, {} macros, {} arrays ({} cells)",
            program.body.len(),
            program.macros.len(),
            program.arrays.len(),
            program.total_array_offset
        );
        Ok(program)
    }

    /// Parses one construct starting at the current token and appends the
    /// result to the current block.
    fn parse_once(&mut self) -> Result<(), ParserError> {
        let token = match self.current() {
            Some(token) => token.clone(),
            None => return Ok(()),
        };

        match token.kind {
            TokenKind::While => self.parse_while(),
            TokenKind::If => self.parse_if(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Array => self.parse_array(),

            TokenKind::Symbol => {
                self.pos += 1;
                let body = self.expand_macro(&token)?;
                self.block().extend(body);
                Ok(())
            }

            TokenKind::Do | TokenKind::End | TokenKind::Else => Err(ParserError::new(
                ParserErrorKind::NoContext,
                format!("invalid token '{}', it has no context", token.text),
                &token,
            )),

            TokenKind::Integer => {
                self.pos += 1;
                let value = integer(&token)?;
                self.block().push(Instruction::PushInt(value));
                Ok(())
            }

            TokenKind::ArrayGet | TokenKind::ArraySet => {
                self.pos += 1;
                let instruction = self.array_op(&token)?;
                self.block().push(instruction);
                Ok(())
            }

            kind => match intrinsic(kind) {
                Some(op) => {
                    self.pos += 1;
                    self.block().push(Instruction::Intrinsic {
                        op,
                        line: token.line,
                    });
                    Ok(())
                }
                None => Err(ParserError::new(
                    ParserErrorKind::InvalidToken,
                    format!("invalid token '{}'", token.text),
                    &token,
                )),
            },
        }
    }

    /// Parses instructions into a fresh block until one of `terminators`.
    ///
    /// Returns the block and the consumed terminator.
    fn parse_block(
        &mut self,
        opener: &Token,
        terminators: &[TokenKind],
    ) -> Result<(Vec<Instruction>, Token), ParserError> {
        self.blocks.push(Vec::new());

        loop {
            match self.current() {
                None => return Err(self.eof(opener, "end")),
                Some(token) if terminators.contains(&token.kind) => break,
                Some(_) => self.parse_once()?,
            }
        }

        let terminator = self.expect_any(opener, "end")?;
        let block = self.blocks.pop().unwrap_or_default();
        Ok((block, terminator))
    }

    /// Collects condition instructions up to and including `do`.
    ///
    /// Only integer literals, intrinsics and macros made of those are allowed.
    fn parse_condition(&mut self, opener: &Token) -> Result<Vec<Instruction>, ParserError> {
        let mut condition = Vec::new();

        loop {
            let token = self.expect_any(opener, "do")?;

            match token.kind {
                TokenKind::Do => break,
                TokenKind::Integer => condition.push(Instruction::PushInt(integer(&token)?)),
                TokenKind::Symbol => {
                    let body = self.expand_macro(&token)?;
                    if !body.iter().all(Instruction::is_leaf) {
                        return Err(ParserError::new(
                            ParserErrorKind::InvalidCondition,
                            format!(
                                "macro '{}' cannot be used in a {} condition at line {}, \
                                 its body contains control flow or array access",
                                token.text, opener.text, token.line
                            ),
                            &token,
                        ));
                    }
                    condition.extend(body);
                }
                kind => match intrinsic(kind) {
                    Some(op) => condition.push(Instruction::Intrinsic {
                        op,
                        line: token.line,
                    }),
                    None => {
                        let what = if kind.is_control() {
                            "block keyword"
                        } else {
                            "token"
                        };
                        return Err(ParserError::new(
                            ParserErrorKind::InvalidCondition,
                            format!(
                                "invalid {} '{}' in a {} condition at line {}",
                                what, token, opener.text, token.line
                            ),
                            &token,
                        ));
                    }
                },
            }
        }

        Ok(condition)
    }

    /// ```text
    /// while <condition> do <body> end
    /// ```
    fn parse_while(&mut self) -> Result<(), ParserError> {
        let while_tok = self.advance();
        let condition = self.parse_condition(&while_tok)?;
        let (body, _) = self.parse_block(&while_tok, &[TokenKind::End])?;

        self.block().push(Instruction::While {
            condition,
            body,
            line: while_tok.line,
        });
        Ok(())
    }

    /// ```text
    /// if <condition> do <if-body> [else <else-body>] end
    /// ```
    fn parse_if(&mut self) -> Result<(), ParserError> {
        let if_tok = self.advance();
        let condition = self.parse_condition(&if_tok)?;
        let (if_body, terminator) =
            self.parse_block(&if_tok, &[TokenKind::Else, TokenKind::End])?;

        let else_body = if terminator.kind == TokenKind::Else {
            self.parse_block(&terminator, &[TokenKind::End])?.0
        } else {
            Vec::new()
        };

        self.block().push(Instruction::Branch {
            condition,
            if_body,
            else_body,
            line: if_tok.line,
        });
        Ok(())
    }

    /// ```text
    /// def <name> <body...> end
    /// ```
    ///
    /// Registers the body in the macro table; nothing is appended to the
    /// current block.
    fn parse_def(&mut self) -> Result<(), ParserError> {
        let def_tok = self.advance();
        let name = self.expect_any(&def_tok, "end")?;
        if name.kind != TokenKind::Symbol {
            return Err(ParserError::new(
                ParserErrorKind::MalformedDef,
                format!(
                    "expecting a symbol after 'def' at line {} but found {} '{}'",
                    def_tok.line, name.kind, name
                ),
                &name,
            ));
        }

        let (body, _) = self.parse_block(&def_tok, &[TokenKind::End])?;

        log::debug!("macro '{}' = {} instructions", name.text, body.len());
        if self.program.macros.insert(name.text.clone(), body).is_some() {
            log::warn!("line {}: redefining macro '{}'", name.line, name.text);
        }
        Ok(())
    }

    /// ```text
    /// array <name> <size> end
    /// ```
    fn parse_array(&mut self) -> Result<(), ParserError> {
        let array_tok = self.advance();
        let malformed = |found: &Token, expected: &str| {
            ParserError::new(
                ParserErrorKind::MalformedArray,
                format!(
                    "an array must follow the pattern \"array <array-name> <array-size> end\"; \
                     at line {} expecting {} but found {} '{}'",
                    array_tok.line, expected, found.kind, found
                ),
                found,
            )
        };

        let name = self.expect_any(&array_tok, "end")?;
        if name.kind != TokenKind::Symbol {
            return Err(malformed(&name, "<array-name>"));
        }

        let size_tok = self.expect_any(&array_tok, "end")?;
        if size_tok.kind != TokenKind::Integer {
            return Err(malformed(&size_tok, "<array-size>"));
        }
        let size = match size_tok.text.parse::<usize>() {
            Ok(size) if size > 0 => size,
            _ => return Err(malformed(&size_tok, "a positive <array-size>")),
        };

        let end = self.expect_any(&array_tok, "end")?;
        if end.kind != TokenKind::End {
            return Err(malformed(&end, "'end'"));
        }

        if self.program.arrays.contains_key(&name.text) {
            return Err(ParserError::new(
                ParserErrorKind::DuplicateArray,
                format!("array '{}' is already declared", name.text),
                &name,
            ));
        }

        let offset = self.program.total_array_offset;
        let total = match offset.checked_add(size) {
            Some(total) if total <= ARRAY_REGION_LIMIT => total,
            _ => {
                return Err(ParserError::new(
                    ParserErrorKind::ArrayTooLarge,
                    format!(
                        "array '{}' of {} cells does not fit: {} cells already declared, \
                         the array region holds at most {}",
                        name.text, size, offset, ARRAY_REGION_LIMIT
                    ),
                    &size_tok,
                ));
            }
        };

        let spec = ArraySpec { size, offset };
        self.program.total_array_offset = total;
        log::debug!("array '{}' at cells {}..{}", name.text, spec.offset, spec.offset + size);
        self.program.arrays.insert(name.text, spec);
        Ok(())
    }

    fn expand_macro(&self, name: &Token) -> Result<Vec<Instruction>, ParserError> {
        self.program.macros.get(&name.text).cloned().ok_or_else(|| {
            ParserError::new(
                ParserErrorKind::UnknownMacro,
                format!("unknown macro '{}' at line {}", name.text, name.line),
                name,
            )
        })
    }

    fn array_op(&self, token: &Token) -> Result<Instruction, ParserError> {
        if !self.program.arrays.contains_key(&token.text) {
            return Err(ParserError::new(
                ParserErrorKind::UnknownArray,
                format!("unknown array '{}' at line {}", token.text, token.line),
                token,
            ));
        }

        let mode = if token.kind == TokenKind::ArrayGet {
            ArrayMode::Get
        } else {
            ArrayMode::Set
        };

        Ok(Instruction::ArrayOp {
            name: token.text.clone(),
            mode,
            line: token.line,
        })
    }
}

fn integer(token: &Token) -> Result<u8, ParserError> {
    token.text.parse::<u8>().map_err(|_| {
        ParserError::new(
            ParserErrorKind::IntegerOutOfRange,
            format!(
                "integer literal {} does not fit in a tape cell (0..=255)",
                token.text
            ),
            token,
        )
    })
}

fn intrinsic(kind: TokenKind) -> Option<Intrinsic> {
    let op = match kind {
        TokenKind::Pop => Intrinsic::Pop,
        TokenKind::Dup => Intrinsic::Dup,
        TokenKind::Over => Intrinsic::Over,
        TokenKind::Swap => Intrinsic::Swap,
        TokenKind::Add => Intrinsic::Add,
        TokenKind::Sub => Intrinsic::Sub,
        TokenKind::Eq => Intrinsic::Eq,
        TokenKind::Neq => Intrinsic::Neq,
        TokenKind::Gt => Intrinsic::Gt,
        TokenKind::Lt => Intrinsic::Lt,
        TokenKind::Or => Intrinsic::Or,
        TokenKind::And => Intrinsic::And,
        TokenKind::Print => Intrinsic::Print,
        TokenKind::DbgPrint => Intrinsic::DbgPrint,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Program {
        Parser::new(Lexer::new(source).tokenize())
            .parse()
            .unwrap()
    }

    fn parse_err(source: &str) -> ParserError {
        Parser::new(Lexer::new(source).tokenize())
            .parse()
            .unwrap_err()
    }

    fn op(op: Intrinsic, line: usize) -> Instruction {
        Instruction::Intrinsic { op, line }
    }

    #[test]
    fn test_arithmetic() {
        let program = parse("3 4 add dbgprint");
        assert_eq!(
            program.body,
            vec![
                Instruction::PushInt(3),
                Instruction::PushInt(4),
                op(Intrinsic::Add, 1),
                op(Intrinsic::DbgPrint, 1),
            ]
        );
        assert!(program.macros.is_empty());
        assert_eq!(program.total_array_offset, 0);
    }

    #[test]
    fn test_while() {
        let program = parse("5\nwhile dup 0 gt do\n  1 sub\nend\ndbgprint");
        assert_eq!(program.body.len(), 3);
        match &program.body[1] {
            Instruction::While {
                condition,
                body,
                line,
            } => {
                assert_eq!(*line, 2);
                assert_eq!(
                    condition,
                    &vec![
                        op(Intrinsic::Dup, 2),
                        Instruction::PushInt(0),
                        op(Intrinsic::Gt, 2)
                    ]
                );
                assert_eq!(body, &vec![Instruction::PushInt(1), op(Intrinsic::Sub, 3)]);
            }
            other => panic!("expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_if_without_else() {
        let program = parse("1 if dup do print end");
        match &program.body[1] {
            Instruction::Branch {
                condition,
                if_body,
                else_body,
                ..
            } => {
                assert_eq!(condition, &vec![op(Intrinsic::Dup, 1)]);
                assert_eq!(if_body, &vec![op(Intrinsic::Print, 1)]);
                assert!(else_body.is_empty());
            }
            other => panic!("expected Branch, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else() {
        let program = parse("if 1 do 2 pop else 3 pop end");
        match &program.body[0] {
            Instruction::Branch {
                if_body, else_body, ..
            } => {
                assert_eq!(if_body[0], Instruction::PushInt(2));
                assert_eq!(else_body[0], Instruction::PushInt(3));
            }
            other => panic!("expected Branch, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let program = parse("1 while dup do if 1 do 0 pop end 1 sub end");
        match &program.body[1] {
            Instruction::While { body, .. } => {
                assert!(matches!(body[0], Instruction::Branch { .. }));
                assert_eq!(body.len(), 3);
            }
            other => panic!("expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_is_spliced() {
        let program = parse("def incr 1 add end\n5 incr incr");
        assert_eq!(
            program.body,
            vec![
                Instruction::PushInt(5),
                Instruction::PushInt(1),
                op(Intrinsic::Add, 1),
                Instruction::PushInt(1),
                op(Intrinsic::Add, 1),
            ]
        );
        assert!(program.macros.contains_key("incr"));
    }

    #[test]
    fn test_macro_with_loop_spliced_into_body() {
        let program = parse("def drain while dup do 1 sub end end\n3 if 1 do drain end");
        match &program.body[1] {
            Instruction::Branch { if_body, .. } => {
                assert!(matches!(if_body[0], Instruction::While { .. }));
            }
            other => panic!("expected Branch, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_defined_inside_block_is_global() {
        let program = parse("if 1 do def two 2 end end two");
        assert_eq!(program.body.last(), Some(&Instruction::PushInt(2)));
    }

    #[test]
    fn test_leaf_macro_in_condition() {
        let program = parse("def positive dup 0 gt end\n3 while positive do 1 sub end");
        match &program.body[1] {
            Instruction::While { condition, .. } => assert_eq!(condition.len(), 3),
            other => panic!("expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_control_macro_in_condition_rejected() {
        let err = parse_err("def spin while 0 do end end\nwhile spin do end");
        assert_eq!(err.kind, ParserErrorKind::InvalidCondition);
        assert_eq!(err.line, 2);
        assert_eq!(err.token, "spin");
    }

    #[test]
    fn test_array_offsets_accumulate() {
        let program = parse("array a 3 end\narray b 4 end\narray c 1 end");
        assert_eq!(program.arrays["a"], ArraySpec { size: 3, offset: 0 });
        assert_eq!(program.arrays["b"], ArraySpec { size: 4, offset: 3 });
        assert_eq!(program.arrays["c"], ArraySpec { size: 1, offset: 7 });
        assert_eq!(program.total_array_offset, 8);
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_array_region_limit() {
        let program = parse(&format!("array a {} end", ARRAY_REGION_LIMIT));
        assert_eq!(program.total_array_offset, ARRAY_REGION_LIMIT);

        let err = parse_err("array a 40000 end 1 dbgprint");
        assert_eq!(err.kind, ParserErrorKind::ArrayTooLarge);
        assert_eq!(err.token, "40000");

        let err = parse_err(&format!("array a {} end\narray b 1 end", ARRAY_REGION_LIMIT));
        assert_eq!(err.kind, ParserErrorKind::ArrayTooLarge);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_array_size_sum_does_not_overflow() {
        let err = parse_err(&format!("array a {} end array b 1 end", usize::MAX));
        assert_eq!(err.kind, ParserErrorKind::ArrayTooLarge);

        let err = parse_err(&format!("array a 8 end array b {} end", usize::MAX));
        assert_eq!(err.kind, ParserErrorKind::ArrayTooLarge);
        assert!(err.message.contains("8 cells already declared"));
    }

    #[test]
    fn test_array_ops() {
        let program = parse("array counter 1 end 0 0 !counter 0 ?counter");
        assert_eq!(
            program.body[2],
            Instruction::ArrayOp {
                name: "counter".to_string(),
                mode: ArrayMode::Set,
                line: 1
            }
        );
        assert_eq!(
            program.body[4],
            Instruction::ArrayOp {
                name: "counter".to_string(),
                mode: ArrayMode::Get,
                line: 1
            }
        );
    }

    #[test]
    fn test_unknown_macro() {
        let err = parse_err("1\nfoo");
        assert_eq!(err.kind, ParserErrorKind::UnknownMacro);
        assert_eq!(err.line, 2);
        assert_eq!(err.token, "foo");
        assert!(err.to_string().contains("unknown macro 'foo'"));
    }

    #[test]
    fn test_forward_macro_reference_rejected() {
        let err = parse_err("1 twice\ndef twice dup add end");
        assert_eq!(err.kind, ParserErrorKind::UnknownMacro);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_recursive_macro_rejected() {
        let err = parse_err("def loop loop end");
        assert_eq!(err.kind, ParserErrorKind::UnknownMacro);
    }

    #[test]
    fn test_unknown_array() {
        let err = parse_err("0 ?nothing");
        assert_eq!(err.kind, ParserErrorKind::UnknownArray);
        assert_eq!(err.token, "?nothing");
    }

    #[test]
    fn test_stray_keywords_have_no_context() {
        for source in ["end", "1 do", "else"] {
            let err = parse_err(source);
            assert_eq!(err.kind, ParserErrorKind::NoContext, "{}", source);
        }
    }

    #[test]
    fn test_invalid_token() {
        let err = parse_err("1\n2 +");
        assert_eq!(err.kind, ParserErrorKind::InvalidToken);
        assert_eq!(err.line, 2);
        assert_eq!(err.token, "+");
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = parse_err("256");
        assert_eq!(err.kind, ParserErrorKind::IntegerOutOfRange);
        assert_eq!(parse("255").body, vec![Instruction::PushInt(255)]);
    }

    #[test]
    fn test_nested_control_in_condition_rejected() {
        let err = parse_err("while while 1 do end do end");
        assert_eq!(err.kind, ParserErrorKind::InvalidCondition);
        let err = parse_err("array a 1 end\nif 0 ?a do end");
        assert_eq!(err.kind, ParserErrorKind::InvalidCondition);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_eof_in_condition() {
        let err = parse_err("while 1");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedEof);
        assert!(err.message.contains("'do'"));
        assert_eq!(err.token, "while");
    }

    #[test]
    fn test_eof_in_body() {
        let err = parse_err("1\nif 1 do\n2 pop");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedEof);
        assert_eq!(err.line, 2);

        let err = parse_err("if 1 do else 2 pop");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedEof);
        assert_eq!(err.token, "else");

        let err = parse_err("def x 1");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_def_requires_symbol() {
        let err = parse_err("def 12 end");
        assert_eq!(err.kind, ParserErrorKind::MalformedDef);
        let err = parse_err("def dup 1 end");
        assert_eq!(err.kind, ParserErrorKind::MalformedDef);
    }

    #[test]
    fn test_malformed_arrays() {
        assert_eq!(parse_err("array 3 end").kind, ParserErrorKind::MalformedArray);
        assert_eq!(parse_err("array a b end").kind, ParserErrorKind::MalformedArray);
        assert_eq!(parse_err("array a 0 end").kind, ParserErrorKind::MalformedArray);
        assert_eq!(parse_err("array a 2 3").kind, ParserErrorKind::MalformedArray);
        assert_eq!(parse_err("array a 2").kind, ParserErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_duplicate_array() {
        let err = parse_err("array a 1 end\narray a 2 end");
        assert_eq!(err.kind, ParserErrorKind::DuplicateArray);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_macro_redefinition_replaces_body() {
        let program = parse("def v 1 end def v 2 end v");
        assert_eq!(program.body, vec![Instruction::PushInt(2)]);
    }

    #[test]
    fn test_empty_program() {
        let program = parse("; nothing here\n");
        assert!(program.body.is_empty());
    }
}
