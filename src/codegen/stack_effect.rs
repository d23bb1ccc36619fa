use crate::codegen::codegen_error::CodegenError;
use crate::lang::Intrinsic;

/// Returns (pops, pushes) for an intrinsic.
///
/// `pops` is also the minimum depth the intrinsic needs; `dup` and `over`
/// read without consuming but still count their inputs here.
pub fn effect(op: Intrinsic) -> (usize, usize) {
    use Intrinsic::*;
    match op {
        Pop => (1, 0),
        Dup => (1, 2),
        Over => (2, 3),
        Swap => (2, 2),

        Add | Sub => (2, 1),
        Eq | Neq | Gt | Lt => (2, 1),
        Or | And => (2, 1),

        Print | DbgPrint => (1, 0),
    }
}

/// Fails unless `depth` holds at least `needed` values.
pub fn require(
    op: &str,
    needed: usize,
    depth: usize,
    line: usize,
) -> Result<(), CodegenError> {
    if depth < needed {
        return Err(CodegenError::InsufficientElements {
            op: op.to_string(),
            needed,
            found: depth,
            line,
        });
    }
    Ok(())
}

/// Applies an intrinsic to a simulated depth.
pub fn apply(op: Intrinsic, depth: usize, line: usize) -> Result<usize, CodegenError> {
    let (pops, pushes) = effect(op);
    require(op.name(), pops, depth, line)?;
    Ok(depth - pops + pushes)
}
