use std::fmt::Display;

/// Console logger shared by every phase.
///
/// Everything goes to stderr so that stdout stays free for reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger {
    verbose: u8,
    quiet: bool,
}

impl Logger {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        // Quiet wins over any verbosity.
        let verbose = if quiet { 0 } else { verbose };
        Self { verbose, quiet }
    }

    /// Logger that prints nothing.
    pub fn silent() -> Self {
        Self::new(0, true)
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("Warning: {message}");
        }
    }

    pub fn verbose(&self, level: u8, message: impl Display) {
        if !self.quiet && self.verbose >= level {
            eprintln!("{message}");
        }
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn level(&self) -> u8 {
        self.verbose
    }
}
