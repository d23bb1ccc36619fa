use std::fmt::Display;

use crate::codegen::codegen_error::CodegenError;
use crate::codegen::lowering;
use crate::codegen::options::{BranchCheck, CodegenOptions};
use crate::codegen::stack_effect::{self, require};
use crate::lang::{ArrayMode, Instruction, Program};

/// Lowers a parsed program to tape-machine text.
///
/// The generator simulates the stack depth (`dp`): the number of live values
/// sitting in consecutive cells right after the array region. The tape
/// pointer always rests on the first free cell, `total_array_offset + dp`,
/// and every cell from there on is zero between instructions.
pub struct Codegen<'p> {
    program: &'p Program,
    options: CodegenOptions,
    /// Emitted lines, joined with newlines at the end.
    out: Vec<String>,
    dp: usize,
}

impl<'p> Codegen<'p> {
    pub fn new(program: &'p Program, options: CodegenOptions) -> Self {
        Codegen {
            program,
            options,
            out: Vec::new(),
            dp: 0,
        }
    }

    pub fn emit(mut self) -> Result<String, CodegenError> {
        let program = self.program;

        if program.total_array_offset > 0 {
            self.comment(format_args!(
                "array region of {} cells",
                program.total_array_offset
            ));
            self.out.push(">".repeat(program.total_array_offset));
        }

        self.emit_block(&program.body)?;

        let code = self.out.join("\n");
        log::debug!(
            "emitted {} bytes of tape code, final depth {}",
            code.len(),
            self.dp
        );
        Ok(code)
    }

    fn comment(&mut self, text: impl Display) {
        if self.options.debug_symbols {
            self.out.push(format!(";; {}", text));
        }
    }

    fn emit_block(&mut self, block: &[Instruction]) -> Result<(), CodegenError> {
        for instruction in block {
            self.emit_once(instruction)?;
        }
        Ok(())
    }

    fn emit_once(&mut self, instruction: &Instruction) -> Result<(), CodegenError> {
        match instruction {
            Instruction::PushInt(value) => {
                self.comment(instruction);
                self.out.push(format!("{}>", "+".repeat(*value as usize)));
                self.dp += 1;
            }

            Instruction::Intrinsic { op, line } => {
                self.comment(instruction);
                self.dp = stack_effect::apply(*op, self.dp, *line)?;
                self.out.push(lowering::intrinsic(*op));
            }

            Instruction::ArrayOp { name, mode, line } => {
                self.comment(instruction);
                self.emit_array_op(name, *mode, *line)?;
            }

            Instruction::While {
                condition,
                body,
                line,
            } => self.emit_while(condition, body, *line)?,

            Instruction::Branch {
                condition,
                if_body,
                else_body,
                line,
            } => self.emit_branch(condition, if_body, else_body, *line)?,
        }

        Ok(())
    }

    fn emit_array_op(&mut self, name: &str, mode: ArrayMode, line: usize) -> Result<(), CodegenError> {
        let spec = self
            .program
            .arrays
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::UnknownArray {
                name: name.to_string(),
                line,
            })?;
        let pointer = self.program.total_array_offset + self.dp;

        match mode {
            ArrayMode::Get => {
                require(&format!("?{}", name), 1, self.dp, line)?;
                self.out.push(lowering::array_get(&spec, pointer));
            }
            ArrayMode::Set => {
                require(&format!("!{}", name), 2, self.dp, line)?;
                self.out.push(lowering::array_set(&spec, pointer));
                self.dp -= 2;
            }
        }
        Ok(())
    }

    /// Emits a condition and checks it left exactly one value above `start`.
    fn emit_condition(
        &mut self,
        construct: &'static str,
        condition: &[Instruction],
        line: usize,
        start: usize,
    ) -> Result<(), CodegenError> {
        self.emit_block(condition)?;
        if self.dp != start + 1 {
            return Err(CodegenError::InvalidCondition {
                construct,
                line,
                produced: self.dp as isize - start as isize,
            });
        }
        Ok(())
    }

    fn check_balanced(&self, construct: &'static str, line: usize, start: usize) -> Result<(), CodegenError> {
        if self.dp != start {
            return Err(CodegenError::UnbalancedBlock {
                construct,
                line,
                start,
                end: self.dp,
            });
        }
        Ok(())
    }

    /// ```text
    /// <condition> <[[-] <body> <condition> <]
    /// ```
    ///
    /// The condition cell becomes the body's first free cell, so it is
    /// cleared on entry to keep the scratch area zeroed.
    fn emit_while(
        &mut self,
        condition: &[Instruction],
        body: &[Instruction],
        line: usize,
    ) -> Result<(), CodegenError> {
        let start = self.dp;

        self.comment(format_args!("while at line {}: condition", line));
        self.emit_condition("while", condition, line, start)?;
        self.comment("loop body");
        self.out.push("<[[-]".to_string());
        self.dp -= 1;

        self.emit_block(body)?;
        self.check_balanced("while loop", line, start)?;

        self.comment("loop condition checking");
        self.emit_condition("while", condition, line, start)?;
        self.out.push("<]".to_string());
        self.dp -= 1;
        self.comment(format_args!("end while at line {}", line));

        self.check_balanced("while loop", line, start)
    }

    /// Without `else`:
    ///
    /// ```text
    /// <condition> <[[-] <if-body> ]
    /// ```
    ///
    /// With `else`, a flag in the cell after the condition selects the else
    /// arm; the if arm clears it before running:
    ///
    /// ```text
    /// <condition> +<[[-]>-< <if-body> ]>[-< <else-body> >]<
    /// ```
    fn emit_branch(
        &mut self,
        condition: &[Instruction],
        if_body: &[Instruction],
        else_body: &[Instruction],
        line: usize,
    ) -> Result<(), CodegenError> {
        let start = self.dp;

        self.comment(format_args!("if at line {}: condition", line));
        self.emit_condition("if", condition, line, start)?;
        self.dp -= 1;

        if else_body.is_empty() {
            self.comment("if body");
            self.out.push("<[[-]".to_string());
            self.emit_block(if_body)?;
            self.check_arm(line, start)?;
            self.out.push("]".to_string());
        } else {
            self.comment("if body");
            self.out.push("+<[[-]>-<".to_string());
            self.emit_block(if_body)?;
            self.check_arm(line, start)?;
            let after_if = self.dp;

            self.comment("else body");
            self.out.push("]>[-<".to_string());
            self.dp = start;
            self.emit_block(else_body)?;
            self.check_arm(line, start)?;
            self.out.push(">]<".to_string());

            if self.options.branch_check == BranchCheck::Unchecked {
                self.dp = after_if;
            }
        }

        self.comment(format_args!("end if at line {}", line));
        Ok(())
    }

    fn check_arm(&self, line: usize, start: usize) -> Result<(), CodegenError> {
        match self.options.branch_check {
            BranchCheck::Strict => self.check_balanced("if statement", line, start),
            BranchCheck::Unchecked => Ok(()),
        }
    }
}
