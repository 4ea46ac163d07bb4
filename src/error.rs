use std::fmt;

/// Builds an `InternalError` pointing at the call site.
/// Internal errors mark broken kernel invariants, never bad user input.
#[macro_export]
macro_rules! internal_error {
    () => {
        Err($crate::error::InternalError {
            file: file!(),
            line: line!(),
            what: "unreachable state",
        })
    };
    ($what:expr) => {
        Err($crate::error::InternalError {
            file: file!(),
            line: line!(),
            what: $what,
        })
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalError {
    pub file: &'static str,
    pub line: u32,
    pub what: &'static str,
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error originated at {}:{}: {}", self.file, self.line, self.what)
    }
}

impl std::error::Error for InternalError {}

pub type BoxedErrorTrait = Box<(dyn std::error::Error + 'static)>;
