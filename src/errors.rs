//! Error Types
//!
//! Two kinds of failure exist in the pipeline:
//!
//! - [`Diagnostic`]: a source-located message pointing at a line of the
//!   original annotated input file. Stages collect these; the driver
//!   renders them in the selected [`ErrorFormat`] and exits non-zero.
//! - [`ShdcError`]: failures that happen before (or outside of) the
//!   pipeline proper, such as argument validation or writing the output
//!   file.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Rendering style for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFormat {
    /// `path:line:0: error: msg` (gcc/clang style)
    #[default]
    Gcc,
    /// `path(line): error: msg` (msvc style, understood by Visual Studio)
    Msvc,
}

impl ErrorFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
        }
    }
}

impl FromStr for ErrorFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "gcc" => Ok(Self::Gcc),
            "msvc" => Ok(Self::Msvc),
            other => Err(format!("unknown error format '{other}' (expected 'gcc' or 'msvc')")),
        }
    }
}

impl fmt::Display for ErrorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source-located error message.
///
/// `line_index` is zero-based and indexes into the lines of the original
/// input file; renderings print it one-based. Diagnostics raised by later
/// pipeline stages are remapped back to original lines before they are
/// stored, so a `Diagnostic` always points at the annotated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub line_index: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic pinned to a zero-based line of `path`.
    pub fn at(path: &str, line_index: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            line_index: Some(line_index),
            message: message.into(),
        }
    }

    /// Diagnostic for a whole file (I/O failures and the like).
    pub fn file(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            line_index: None,
            message: message.into(),
        }
    }

    /// Renders the diagnostic in the requested format.
    pub fn render(&self, format: ErrorFormat) -> String {
        match (format, self.line_index) {
            (ErrorFormat::Gcc, Some(line)) => {
                format!("{}:{}:0: error: {}", self.path, line + 1, self.message)
            }
            (ErrorFormat::Msvc, Some(line)) => {
                format!("{}({}): error: {}", self.path, line + 1, self.message)
            }
            (_, None) => format!("{}: error: {}", self.path, self.message),
        }
    }
}

/// Failures outside the diagnostic-carrying pipeline stages.
#[derive(Error, Debug)]
pub enum ShdcError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Command line argument validation error.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Alias for `Result<T, ShdcError>`.
pub type Result<T> = std::result::Result<T, ShdcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_gcc() {
        let diag = Diagnostic::at("shaders.glsl", 4, "bad things");
        assert_eq!(diag.render(ErrorFormat::Gcc), "shaders.glsl:5:0: error: bad things");
    }

    #[test]
    fn test_render_msvc() {
        let diag = Diagnostic::at("shaders.glsl", 4, "bad things");
        assert_eq!(diag.render(ErrorFormat::Msvc), "shaders.glsl(5): error: bad things");
    }

    #[test]
    fn test_render_without_line() {
        let diag = Diagnostic::file("missing.glsl", "cannot read");
        assert_eq!(diag.render(ErrorFormat::Gcc), "missing.glsl: error: cannot read");
        assert_eq!(diag.render(ErrorFormat::Msvc), "missing.glsl: error: cannot read");
    }

    #[test]
    fn test_error_format_parse() {
        assert_eq!("gcc".parse::<ErrorFormat>(), Ok(ErrorFormat::Gcc));
        assert_eq!("msvc".parse::<ErrorFormat>(), Ok(ErrorFormat::Msvc));
        assert!("vim".parse::<ErrorFormat>().is_err());
    }
}
