//! # Tape code generation
//!
//! Turns a [`Program`](crate::lang::Program) into tape-machine text while
//! tracking the stack depth at compile time.

pub mod codegen_error;
pub mod cursor;
pub mod emit;
pub mod lowering;
pub mod options;
pub mod stack_effect;

pub use codegen_error::CodegenError;
pub use emit::Codegen;
pub use options::{BranchCheck, CodegenOptions};
