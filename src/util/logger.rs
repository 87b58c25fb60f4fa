use std::fmt::{Debug, Display, Formatter};

use super::Log;

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Severity order of this log level; higher means more verbose.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<TL: Display> Log<TL> {
    /// Trace a chart transition (predict/scan/complete) if this log's level
    /// is at least [`Log::Success`].
    pub fn log_transition<T: Debug>(&self, what: &str, column: usize, detail: &T) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Success(()).order() {
            println!("[{}; {}] column {}: {:?}", self, what, column, detail);
        }
        #[cfg(not(debug_assertions))]
        let _ = (what, column, detail);
    }

    /// Trace a normalisation rewrite pass if this log's level is at least
    /// [`Log::Verbose`].
    pub fn log_rewrite(&self, pass: &str, before: &str, after: &str) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Verbose(()).order() {
            println!("[{}; normalise:{}] {} -> {}", self, pass, before, after);
        }
        #[cfg(not(debug_assertions))]
        let _ = (pass, before, after);
    }
}
