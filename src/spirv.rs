//! GLSL to SPIR-V compilation stage.
//!
//! Every vertex and fragment snippet is assembled into one compilation
//! unit (a `#version` prologue plus the snippet's resolved lines) and
//! compiled to a SPIR-V word blob. Block snippets never compile on their
//! own; they only contribute lines through `@include_block`.
//!
//! The frontend reports line numbers relative to the assembled unit;
//! [`remap_unit_line`] translates them back through the snippet's line
//! vector so every diagnostic points at the original input file.

use crate::errors::Diagnostic;
use crate::input::{Input, Snippet, SnippetKind};

/// One compiled SPIR-V blob with its back-link into [`Input::snippets`].
#[derive(Debug, Clone)]
pub struct SpirvBlob {
    pub snippet_index: usize,
    pub words: Vec<u32>,
}

/// Result of the SPIR-V stage. Downstream stages are skipped when
/// `errors` is non-empty.
#[derive(Debug, Default)]
pub struct Spirv {
    pub errors: Vec<Diagnostic>,
    pub blobs: Vec<SpirvBlob>,
}

impl Spirv {
    /// Logs per-blob stats at debug level.
    pub fn dump_debug(&self, input: &Input) {
        for blob in &self.blobs {
            let snippet = &input.snippets[blob.snippet_index];
            log::debug!(
                "spirv blob for '{}': {} words",
                snippet.name,
                blob.words.len()
            );
        }
    }
}

/// Prologue prepended to every compilation unit.
const UNIT_PROLOGUE: &str = "#version 450\n";
const PROLOGUE_LINES: usize = 1;

/// SPIR-V version written into the blobs.
const SPIRV_LANG_VERSION: (u8, u8) = (1, 1);

/// Scoped handle on the GLSL frontend and validator. Constructed once by
/// the driver and passed to the stage, so tests can run the pipeline with
/// their own instance and the handle is released on every exit path.
pub struct SpirvCompiler {
    frontend: naga::front::glsl::Frontend,
    validator: naga::valid::Validator,
}

impl Default for SpirvCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SpirvCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frontend: naga::front::glsl::Frontend::default(),
            validator: naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::all(),
            ),
        }
    }

    /// Compiles every vertex/fragment snippet of `input` to SPIR-V.
    ///
    /// Failures do not abort the stage; all diagnostics are collected so
    /// one run reports every broken shader.
    pub fn compile(&mut self, input: &Input) -> Spirv {
        let mut result = Spirv::default();
        for (snippet_index, snippet) in input.snippets.iter().enumerate() {
            let stage = match snippet.kind {
                SnippetKind::Vertex => naga::ShaderStage::Vertex,
                SnippetKind::Fragment => naga::ShaderStage::Fragment,
                SnippetKind::Block => continue,
            };
            let unit = assemble_unit(input, snippet);
            log::debug!("compiling '{}' ({} unit lines)", snippet.name, snippet.lines.len());
            match self.compile_unit(&unit, stage) {
                Ok(words) => result.blobs.push(SpirvBlob {
                    snippet_index,
                    words,
                }),
                Err(unit_errors) => {
                    for (unit_line, message) in unit_errors {
                        result.errors.push(remap_diagnostic(
                            input, snippet, unit_line, &message,
                        ));
                    }
                }
            }
        }
        result
    }

    /// Compiles one assembled unit. Errors carry the 1-based line number
    /// inside the unit when the frontend reports one.
    fn compile_unit(
        &mut self,
        unit: &str,
        stage: naga::ShaderStage,
    ) -> Result<Vec<u32>, Vec<(Option<usize>, String)>> {
        let options = naga::front::glsl::Options {
            stage,
            defines: Default::default(),
        };
        let module = self.frontend.parse(&options, unit).map_err(|parse_error| {
            parse_error
                .iter()
                .map(|error| {
                    let location = error.meta.location(unit);
                    (Some(location.line_number as usize), error.kind.to_string())
                })
                .collect::<Vec<_>>()
        })?;
        let info = self
            .validator
            .validate(&module)
            .map_err(|error| vec![(None, format!("validation failed: {}", error.as_inner()))])?;
        let options = naga::back::spv::Options {
            lang_version: SPIRV_LANG_VERSION,
            flags: naga::back::spv::WriterFlags::DEBUG,
            ..Default::default()
        };
        naga::back::spv::write_vec(&module, &info, &options, None)
            .map_err(|error| vec![(None, format!("SPIR-V generation failed: {error}"))])
    }
}

/// Concatenates the snippet's resolved lines behind the unit prologue.
fn assemble_unit(input: &Input, snippet: &Snippet) -> String {
    let mut unit = String::from(UNIT_PROLOGUE);
    for &line_index in &snippet.lines {
        unit.push_str(&input.lines[line_index]);
        unit.push('\n');
    }
    unit
}

/// Maps a 1-based unit line to the zero-based original line index.
///
/// `Err` carries the snippet's first line for out-of-range reports, which
/// would indicate a frontend bug (or an error inside the prologue).
fn remap_unit_line(snippet: &Snippet, unit_line: usize) -> Result<usize, usize> {
    unit_line
        .checked_sub(1 + PROLOGUE_LINES)
        .and_then(|relative| snippet.lines.get(relative).copied())
        .ok_or_else(|| snippet.first_line())
}

fn remap_diagnostic(
    input: &Input,
    snippet: &Snippet,
    unit_line: Option<usize>,
    message: &str,
) -> Diagnostic {
    match unit_line {
        Some(line) => match remap_unit_line(snippet, line) {
            Ok(original) => Diagnostic::at(&input.path, original, message),
            Err(first) => Diagnostic::at(
                &input.path,
                first,
                format!("internal: line {line} out of range in shader '{}': {message}", snippet.name),
            ),
        },
        None => Diagnostic::at(&input.path, snippet.first_line(), message),
    }
}
