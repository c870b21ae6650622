//! Logging and output control
//!
//! This module provides the [`Logger`] for controlling output verbosity.
//! It supports quiet, normal, and verbose modes and is cloned into every
//! component that reports progress. Secrets are never printed; callers log
//! token lengths, not token contents.

#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("🐛 DEBUG: {}", message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("📝 {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("ℹ️  {}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("✅ {}", message);
        }
    }

    /// Warnings print even in quiet mode.
    pub fn warning(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new_quiet()
    }
}
