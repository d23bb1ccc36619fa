//! Interpreter for the emitted tape code.
//!
//! Understands the eight classic commands plus `?`, which reports the current
//! cell as `[dp=N] V`. A `;` starts a comment that runs to the end of the
//! line. Whitespace is skipped; anything else is rejected before execution
//! starts.

use std::io::{Read, Write};

use crate::runtime::runtime_error::{
    Location, RuntimeError, pointer_out_of_bounds, unmatched_bracket,
};

pub const TAPE_LENGTH: usize = 30_000;

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub tape_length: usize,
    pub max_steps: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            tape_length: TAPE_LENGTH,
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Right,
    Left,
    Inc,
    Dec,
    Output,
    Input,
    Debug,
    /// Jump past the matching `]` when the cell is zero.
    Open(usize),
    /// Jump back past the matching `[` when the cell is nonzero.
    Close(usize),
}

pub struct Machine {
    cells: Vec<u8>,
    pointer: usize,
    config: MachineConfig,
    steps: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        Machine {
            cells: vec![0; config.tape_length],
            pointer: 0,
            config,
            steps: 0,
        }
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
        self.pointer = 0;
        self.steps = 0;
    }

    /// Runs `code` on a fresh tape.
    ///
    /// `,` reads one byte from `input` and leaves the cell unchanged at end of
    /// input.
    pub fn run<R: Read, W: Write>(
        &mut self,
        code: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), RuntimeError> {
        let (commands, locations) = load(code)?;
        self.reset();
        log::debug!("running {} tape commands", commands.len());

        let mut ip = 0;
        while ip < commands.len() {
            self.check_limits()?;

            match commands[ip] {
                Command::Right => {
                    if self.pointer + 1 >= self.cells.len() {
                        return Err(pointer_out_of_bounds(false, self.cells.len(), locations[ip]));
                    }
                    self.pointer += 1;
                }
                Command::Left => {
                    if self.pointer == 0 {
                        return Err(pointer_out_of_bounds(true, self.cells.len(), locations[ip]));
                    }
                    self.pointer -= 1;
                }
                Command::Inc => {
                    self.cells[self.pointer] = self.cells[self.pointer].wrapping_add(1);
                }
                Command::Dec => {
                    self.cells[self.pointer] = self.cells[self.pointer].wrapping_sub(1);
                }
                Command::Output => {
                    output.write_all(&[self.cells[self.pointer]])?;
                }
                Command::Input => {
                    let mut byte = [0u8; 1];
                    if input.read(&mut byte)? == 1 {
                        self.cells[self.pointer] = byte[0];
                    }
                }
                Command::Debug => {
                    writeln!(output, "[dp={}] {}", self.pointer, self.cells[self.pointer])?;
                }
                Command::Open(target) => {
                    if self.cells[self.pointer] == 0 {
                        ip = target;
                    }
                }
                Command::Close(target) => {
                    if self.cells[self.pointer] != 0 {
                        ip = target;
                    }
                }
            }
            ip += 1;
        }

        output.flush()?;
        log::debug!("finished after {} steps", self.steps);
        Ok(())
    }

    /// Runs `code` with no input and returns everything it wrote.
    pub fn run_capture(&mut self, code: &str) -> Result<Vec<u8>, RuntimeError> {
        let mut output = Vec::new();
        self.run(code, &mut std::io::empty(), &mut output)?;
        Ok(output)
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::new(&format!(
                    "execution step limit exceeded ({})",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Decodes tape code and pairs up brackets.
fn load(code: &str) -> Result<(Vec<Command>, Vec<Location>), RuntimeError> {
    let mut commands = Vec::new();
    let mut locations = Vec::new();
    let mut open = Vec::new();

    for (line_index, line) in code.lines().enumerate() {
        for (column_index, ch) in line.chars().enumerate() {
            let location = Location {
                line: line_index + 1,
                column: column_index + 1,
            };

            let command = match ch {
                ';' => break,
                c if c.is_whitespace() => continue,
                '>' => Command::Right,
                '<' => Command::Left,
                '+' => Command::Inc,
                '-' => Command::Dec,
                '.' => Command::Output,
                ',' => Command::Input,
                '?' => Command::Debug,
                '[' => {
                    open.push(commands.len());
                    Command::Open(0)
                }
                ']' => {
                    let start = open.pop().ok_or_else(|| unmatched_bracket(']', location))?;
                    commands[start] = Command::Open(commands.len());
                    Command::Close(start)
                }
                other => {
                    return Err(RuntimeError::new(&format!("unknown instruction '{}'", other))
                        .at(location));
                }
            };

            commands.push(command);
            locations.push(location);
        }
    }

    if let Some(&start) = open.last() {
        return Err(unmatched_bracket('[', locations[start]));
    }

    Ok((commands, locations))
}
