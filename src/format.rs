//! Optional formatting pass over finished unit text.
//!
//! Formatting is best effort. A formatter that is missing, fails, or exits
//! non-zero leaves the raw text in place, so nothing downstream may depend
//! on it having run.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable naming the formatter binary (`off` disables it).
pub const FORMATTER_ENV: &str = "JSONNETFMT";

/// Default formatter binary looked up on `PATH`.
pub const DEFAULT_FORMATTER: &str = "jsonnetfmt";

/// A text-to-text formatting pass.
///
/// Implementations must be idempotent on their own output.
pub trait Formatter {
    /// Return the formatted text, or `None` to keep the input unchanged.
    fn format(&self, source: &str) -> Option<String>;
}

/// Formatter that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _source: &str) -> Option<String> {
        None
    }
}

/// Runs `jsonnetfmt -` as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct JsonnetFmt {
    program: Option<PathBuf>,
}

impl JsonnetFmt {
    /// Use a specific formatter binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: Some(program.into()) }
    }

    /// A formatter that is never invoked.
    pub fn disabled() -> Self {
        Self { program: None }
    }

    /// Look up [`DEFAULT_FORMATTER`] on `PATH`.
    pub fn discover() -> Self {
        match which::which(DEFAULT_FORMATTER) {
            Ok(program) => Self::new(program),
            Err(_) => {
                tracing::debug!(formatter = DEFAULT_FORMATTER, "formatter not found, output stays unformatted");
                Self::disabled()
            }
        }
    }

    /// Configure from [`FORMATTER_ENV`], falling back to [`Self::discover`].
    pub fn from_env() -> Self {
        match std::env::var(FORMATTER_ENV) {
            Ok(value) if value == "off" => Self::disabled(),
            Ok(value) if !value.is_empty() => Self::new(value),
            _ => Self::discover(),
        }
    }

    /// Whether a formatter binary is configured.
    pub fn is_enabled(&self) -> bool {
        self.program.is_some()
    }

    fn run(&self, program: &Path, source: &str) -> std::io::Result<Option<String>> {
        let mut child = Command::new(program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Feed stdin from a separate thread so a full stdout pipe cannot
        // block the write.
        let mut stdin = child.stdin.take();
        let input = source.as_bytes().to_vec();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            if let Some(stdin) = stdin.as_mut() {
                stdin.write_all(&input)?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        let fed = writer.join().unwrap_or_else(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "formatter input thread panicked"))
        });
        fed?;

        if !output.status.success() {
            return Ok(None);
        }
        match String::from_utf8(output.stdout) {
            Ok(text) if !text.trim().is_empty() || source.trim().is_empty() => Ok(Some(text)),
            _ => Ok(None),
        }
    }
}

impl Formatter for JsonnetFmt {
    fn format(&self, source: &str) -> Option<String> {
        let program = self.program.as_ref()?;
        match self.run(program, source) {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                tracing::warn!(formatter = %program.display(), "formatter rejected input, keeping raw text");
                None
            }
            Err(e) => {
                tracing::warn!(formatter = %program.display(), error = %e, "formatter failed, keeping raw text");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_keeps_text() {
        assert!(NoopFormatter.format("{}").is_none());
    }

    #[test]
    fn test_disabled_keeps_text() {
        let fmt = JsonnetFmt::disabled();
        assert!(!fmt.is_enabled());
        assert!(fmt.format("{ a: 1 }").is_none());
    }

    #[test]
    fn test_missing_binary_keeps_text() {
        let fmt = JsonnetFmt::new("/nonexistent/bin/jsonnetfmt-missing");
        assert!(fmt.is_enabled());
        assert!(fmt.format("{ a: 1 }").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_binary_keeps_text() {
        let fmt = JsonnetFmt::new("false");
        assert!(fmt.format("{ a: 1 }").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_pass_replaces_text() {
        // `cat -` echoes its input, which is trivially idempotent.
        let fmt = JsonnetFmt::new("cat");
        assert_eq!(fmt.format("{ a: 1 }\n").as_deref(), Some("{ a: 1 }\n"));
    }
}
