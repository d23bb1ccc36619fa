/// How `if`/`else` arms are checked for depth neutrality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchCheck {
    /// Every arm must leave the depth where the condition found it.
    #[default]
    Strict,
    /// No assertion. The depth after the `if` arm is carried forward, which
    /// produces a broken tape layout when the arms are not neutral.
    Unchecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodegenOptions {
    /// Emit `;;` comment lines describing each instruction.
    pub debug_symbols: bool,
    pub branch_check: BranchCheck,
}

impl CodegenOptions {
    pub fn with_debug_symbols(mut self) -> Self {
        self.debug_symbols = true;
        self
    }

    pub fn with_branch_check(mut self, branch_check: BranchCheck) -> Self {
        self.branch_check = branch_check;
        self
    }
}
