use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process state used by the interpreter.
///
/// The environment contains:
/// - `current_dir`: the working directory for command execution; changed only
///   by `cd` and inherited by every child process spawned afterwards.
/// - `should_exit`: a flag that the interactive loop checks to know when to
///   terminate; set by `exit` and by a failed `poweroff` image replacement.
///
/// Note: fields are public for simplicity to keep the crate small.
#[derive(Debug, Clone)]
pub struct Environment {
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// `current_dir` is initialized from `std::env::current_dir()` and the
    /// `should_exit` flag to `false`.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            should_exit: false,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;

    #[test]
    fn test_new_environment_does_not_request_exit() {
        let env = Environment::new();
        assert!(!env.should_exit);
    }

    #[test]
    fn test_new_environment_captures_an_absolute_directory() {
        let _lock = crate::testutil::lock_current_dir();
        let env = Environment::new();
        assert!(env.current_dir.is_absolute());
    }
}
