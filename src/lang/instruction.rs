use serde::{Deserialize, Serialize};

/// Built-in stack operation lowered to a fixed tape micro-program.
///
/// Stack effects are written as `( before -- after )`, left element pushed
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    /// `( x -- )`
    Pop,
    /// `( x -- x x )`
    Dup,
    /// `( y x -- y x y )`
    Over,
    /// `( y x -- x y )`
    Swap,
    /// `( y x -- y+x )`, wrapping.
    Add,
    /// `( y x -- y-x )`, wrapping.
    Sub,
    /// `( y x -- y==x )`
    Eq,
    /// `( y x -- y!=x )`
    Neq,
    /// `( y x -- y>x )`
    Gt,
    /// `( y x -- y<x )`
    Lt,
    /// `( y x -- y|x )` normalized to 0/1.
    Or,
    /// `( y x -- y&x )` normalized to 0/1.
    And,
    /// `( x -- )`, writes the byte with `.`.
    Print,
    /// `( x -- )`, writes with the interpreter-specific `?`.
    DbgPrint,
}

impl Intrinsic {
    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Pop => "pop",
            Intrinsic::Dup => "dup",
            Intrinsic::Over => "over",
            Intrinsic::Swap => "swap",
            Intrinsic::Add => "add",
            Intrinsic::Sub => "sub",
            Intrinsic::Eq => "eq",
            Intrinsic::Neq => "neq",
            Intrinsic::Gt => "gt",
            Intrinsic::Lt => "lt",
            Intrinsic::Or => "or",
            Intrinsic::And => "and",
            Intrinsic::Print => "print",
            Intrinsic::DbgPrint => "dbgprint",
        }
    }
}

impl std::fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayMode {
    /// `?name`: `( index -- value )`
    Get,
    /// `!name`: `( index value -- )`
    Set,
}

/// A node of the instruction tree.
///
/// Macros are already spliced in and array names are known to exist by the
/// time a tree reaches the code generator. `line` fields carry the source line
/// of the originating token for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Push a byte literal.
    ///
    /// Stack effect: `( -- n )`
    PushInt(u8),

    Intrinsic {
        op: Intrinsic,
        line: usize,
    },

    ArrayOp {
        name: String,
        mode: ArrayMode,
        line: usize,
    },

    /// `while <condition> do <body> end`
    ///
    /// The condition is re-evaluated after every iteration and may only hold
    /// `PushInt` and `Intrinsic` nodes.
    While {
        condition: Vec<Instruction>,
        body: Vec<Instruction>,
        line: usize,
    },

    /// `if <condition> do <if_body> [else <else_body>] end`
    ///
    /// `else_body` is empty when there is no `else`.
    Branch {
        condition: Vec<Instruction>,
        if_body: Vec<Instruction>,
        else_body: Vec<Instruction>,
        line: usize,
    },
}

impl Instruction {
    /// True for nodes allowed inside a `while`/`if` condition.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Instruction::PushInt(_) | Instruction::Intrinsic { .. })
    }
}

impl std::fmt::Display for Instruction {
    /// Short one-line description, used for `;;` debug comments.
    ///
    /// Never contains tape command characters.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::PushInt(n) => write!(f, "push {}", n),
            Instruction::Intrinsic { op, .. } => write!(f, "{}", op),
            Instruction::ArrayOp {
                name,
                mode: ArrayMode::Get,
                ..
            } => write!(f, "get {}", name),
            Instruction::ArrayOp {
                name,
                mode: ArrayMode::Set,
                ..
            } => write!(f, "set {}", name),
            Instruction::While { line, .. } => write!(f, "while at line {}", line),
            Instruction::Branch { line, .. } => write!(f, "if at line {}", line),
        }
    }
}
