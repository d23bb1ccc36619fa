#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// An intrinsic or array access ran with fewer live values than it needs.
    InsufficientElements {
        op: String,
        needed: usize,
        found: usize,
        line: usize,
    },
    /// A loop or branch body changed the stack depth.
    UnbalancedBlock {
        construct: &'static str,
        line: usize,
        start: usize,
        end: usize,
    },
    /// A `while`/`if` condition did not leave exactly one value.
    InvalidCondition {
        construct: &'static str,
        line: usize,
        produced: isize,
    },
    /// Array access to a name with no declared placement.
    UnknownArray { name: String, line: usize },
}

impl CodegenError {
    pub fn line(&self) -> usize {
        match self {
            CodegenError::InsufficientElements { line, .. }
            | CodegenError::UnbalancedBlock { line, .. }
            | CodegenError::InvalidCondition { line, .. }
            | CodegenError::UnknownArray { line, .. } => *line,
        }
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::InsufficientElements {
                op,
                needed,
                found,
                line,
            } => write!(
                f,
                "line {}: insufficient elements for `{}`, expecting {} but {} found",
                line, op, needed, found
            ),
            CodegenError::UnbalancedBlock {
                construct,
                line,
                start,
                end,
            } => {
                write!(
                    f,
                    "line {}: {} starts with SP={} but ends with SP={}",
                    line, construct, start, end
                )?;
                write!(f, "\n  hint: a block body must leave the stack as deep as it found it")
            }
            CodegenError::InvalidCondition {
                construct,
                line,
                produced,
            } => {
                write!(
                    f,
                    "line {}: {} condition must push exactly one value but changed the stack by {}",
                    line, construct, produced
                )
            }
            CodegenError::UnknownArray { name, line } => {
                write!(f, "line {}: unknown array '{}'", line, name)
            }
        }
    }
}

impl std::error::Error for CodegenError {}
