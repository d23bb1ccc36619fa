//! # bfcat instruction tree
//!
//! Produced by the parser and consumed by the code generator.
//!
//! ## Documentation conventions
//!
//! - Stack effects are written as `( before -- after )`.
//! - The top of the stack is the rightmost element.

pub mod instruction;
pub mod program;

pub use instruction::{ArrayMode, Instruction, Intrinsic};
pub use program::{ARRAY_REGION_LIMIT, ArraySpec, Program};
