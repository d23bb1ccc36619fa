/// Builds a tape micro-program while tracking the pointer.
///
/// Cells are addressed relative to where the pointer stood when the cursor
/// was created, so `go(-1)` is the top of the stack and `go(0)` the first
/// free cell. Every loop closes on the cell it was opened on.
#[derive(Debug, Default)]
pub struct Cursor {
    at: isize,
    loops: Vec<isize>,
    code: String,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pointer position relative to the start.
    pub fn position(&self) -> isize {
        self.at
    }

    pub fn go(&mut self, cell: isize) -> &mut Self {
        let step = if cell > self.at { '>' } else { '<' };
        for _ in 0..(cell - self.at).unsigned_abs() {
            self.code.push(step);
        }
        self.at = cell;
        self
    }

    pub fn inc(&mut self, times: usize) -> &mut Self {
        self.repeat('+', times)
    }

    pub fn dec(&mut self, times: usize) -> &mut Self {
        self.repeat('-', times)
    }

    fn repeat(&mut self, ch: char, times: usize) -> &mut Self {
        for _ in 0..times {
            self.code.push(ch);
        }
        self
    }

    /// Zeroes the current cell.
    pub fn clear(&mut self) -> &mut Self {
        self.code.push_str("[-]");
        self
    }

    pub fn open(&mut self) -> &mut Self {
        self.loops.push(self.at);
        self.code.push('[');
        self
    }

    /// Returns to the cell the innermost loop was opened on and closes it.
    pub fn close(&mut self) -> &mut Self {
        if let Some(cell) = self.loops.pop() {
            self.go(cell);
        }
        self.code.push(']');
        self
    }

    pub fn output(&mut self) -> &mut Self {
        self.code.push('.');
        self
    }

    pub fn debug_output(&mut self) -> &mut Self {
        self.code.push('?');
        self
    }

    /// Adds `src` into every cell of `dsts`, leaving `src` at zero.
    pub fn drain_into(&mut self, src: isize, dsts: &[isize]) -> &mut Self {
        self.go(src).open().dec(1);
        for &dst in dsts {
            self.go(dst).inc(1);
        }
        self.close()
    }

    /// Subtracts `src` from `dst`, leaving `src` at zero.
    pub fn drain_sub(&mut self, src: isize, dst: isize) -> &mut Self {
        self.go(src).open().dec(1).go(dst).dec(1).close()
    }

    pub fn finish(self) -> String {
        debug_assert!(self.loops.is_empty(), "unclosed loop in micro-program");
        self.code
    }
}
