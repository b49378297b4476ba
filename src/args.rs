//! Command line arguments.
//!
//! The raw clap surface stays stringly typed; [`Args::dialects`] and
//! [`Args::error_format`] validate the free-form values and report
//! problems through [`ShdcError::InvalidArgs`], which the driver maps to
//! exit code 10.

use clap::Parser;

use crate::dialect::Dialect;
use crate::errors::{ErrorFormat, Result, ShdcError};

/// Annotated-GLSL shader cross-compiler.
///
/// Compiles the shader snippets of one annotated source file to every
/// requested target dialect and writes a C header with the translated
/// sources, optional bytecode and typed reflection.
#[derive(Parser, Debug)]
#[command(name = "shdc", version, about)]
pub struct Args {
    /// Input source file with @vs/@fs/@program annotations
    #[arg(short, long)]
    pub input: String,

    /// Output C header path
    #[arg(short, long)]
    pub output: String,

    /// Colon-separated target dialects (glsl330, glsl100, glsl300es,
    /// hlsl5, metal_macos, metal_ios)
    #[arg(short = 'l', long)]
    pub slang: String,

    /// Compile translated sources to bytecode where the dialect has a
    /// binary form
    #[arg(short, long)]
    pub bytecode: bool,

    /// Log the intermediate representation of every stage
    #[arg(short, long)]
    pub dump: bool,

    /// Don't wrap per-dialect sections in #if defined(...) guards
    #[arg(short = 'n', long = "noifdef")]
    pub no_ifdef: bool,

    /// Generator-version stamp embedded in the output header
    #[arg(short, long, default_value_t = 1)]
    pub genver: i32,

    /// Error message format (gcc or msvc)
    #[arg(short, long, default_value = "gcc")]
    pub errfmt: String,
}

impl Args {
    /// The validated target dialect list, in request order.
    pub fn dialects(&self) -> Result<Vec<Dialect>> {
        Dialect::from_tag_list(&self.slang).map_err(ShdcError::InvalidArgs)
    }

    /// The validated diagnostic rendering format.
    pub fn error_format(&self) -> Result<ErrorFormat> {
        self.errfmt.parse().map_err(ShdcError::InvalidArgs)
    }

    /// Logs the parsed arguments at debug level.
    pub fn dump_debug(&self) {
        log::debug!("args:");
        log::debug!("  input: {}", self.input);
        log::debug!("  output: {}", self.output);
        log::debug!("  slang: {}", self.slang);
        log::debug!("  bytecode: {}", self.bytecode);
        log::debug!("  noifdef: {}", self.no_ifdef);
        log::debug!("  genver: {}", self.genver);
        log::debug!("  errfmt: {}", self.errfmt);
    }
}
