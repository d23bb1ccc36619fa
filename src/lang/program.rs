use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::instruction::Instruction;

/// Largest total size of the array region, in cells. The working stack uses
/// the rest of a 30000-cell tape.
pub const ARRAY_REGION_LIMIT: usize = 16_384;

/// Static placement of a named array on the tape.
///
/// Arrays are laid out contiguously from cell 0 in declaration order, so
/// `offset` is the sum of the sizes declared before this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySpec {
    pub size: usize,
    pub offset: usize,
}

/// Parsed program, frozen once the parser hands it over.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Top-level instructions, macros already spliced.
    pub body: Vec<Instruction>,
    /// Macro name -> recorded body.
    pub macros: HashMap<String, Vec<Instruction>>,
    /// Array name -> placement.
    pub arrays: HashMap<String, ArraySpec>,
    /// Total size of the array region. The working stack starts here.
    pub total_array_offset: usize,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the program with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decodes a program written by [`Program::to_bytes`]. An array region
    /// past [`ARRAY_REGION_LIMIT`] is rejected as a bad encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        let program: Program = postcard::from_bytes(bytes)?;
        if program.total_array_offset > ARRAY_REGION_LIMIT {
            return Err(postcard::Error::DeserializeBadEncoding);
        }
        Ok(program)
    }
}
