/// Source position in tape code, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug)]
pub struct RuntimeError {
    pub message: String,
    pub location: Option<Location>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: {}", self.message)?;

        if let Some(location) = self.location {
            write!(f, " (line {}, column {})", location.line, location.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    pub fn new(msg: &str) -> Self {
        RuntimeError {
            message: msg.to_string(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::new(&format!("i/o failure: {}", err))
    }
}

pub fn unmatched_bracket(bracket: char, location: Location) -> RuntimeError {
    RuntimeError::new(&format!("unmatched '{}'", bracket)).at(location)
}

pub fn pointer_out_of_bounds(left: bool, tape_length: usize, location: Location) -> RuntimeError {
    let side = if left { "left" } else { "right" };
    RuntimeError::new(&format!(
        "pointer moved past the {} end of the {}-cell tape",
        side, tape_length
    ))
    .at(location)
}
