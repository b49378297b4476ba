//! Vendor bytecode compilation stage.
//!
//! Optional: only runs when the user asked for bytecode, and only for the
//! dialects that have a binary form (HLSL via `fxc`, Metal via the
//! `xcrun` toolchain). Translated sources are staged in a scratch
//! directory, the vendor compiler runs as a child process, and the
//! resulting binary is read back into memory for the header generator.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::cross::{Cross, CrossSource};
use crate::dialect::Dialect;
use crate::errors::Diagnostic;
use crate::input::Input;
use crate::reflect::ShaderStage;

/// One compiled binary with its (snippet, dialect) key.
#[derive(Debug, Clone)]
pub struct BytecodeBlob {
    pub snippet_index: usize,
    pub dialect: Dialect,
    pub bytes: Vec<u8>,
}

/// Result of the bytecode stage. Empty (and error-free) when bytecode was
/// not requested.
#[derive(Debug, Default)]
pub struct Bytecode {
    pub errors: Vec<Diagnostic>,
    pub blobs: Vec<BytecodeBlob>,
}

impl Bytecode {
    /// Compiles every translated source of every binary-capable dialect.
    #[must_use]
    pub fn compile(input: &Input, cross: &Cross, gen_bytecode: bool) -> Self {
        let mut result = Self::default();
        if !gen_bytecode {
            return result;
        }
        for dialect in Dialect::ALL {
            if !dialect.has_bytecode() {
                continue;
            }
            let Some(sources) = cross.sources_for(dialect) else {
                continue;
            };
            for source in sources {
                let snippet = &input.snippets[source.snippet_index];
                match compile_source(snippet.name.as_str(), source, dialect) {
                    Ok(bytes) => result.blobs.push(BytecodeBlob {
                        snippet_index: source.snippet_index,
                        dialect,
                        bytes,
                    }),
                    Err(message) => result.errors.push(Diagnostic::at(
                        &input.path,
                        snippet.first_line(),
                        format!("bytecode compilation for '{}' ({dialect}) failed: {message}", snippet.name),
                    )),
                }
            }
        }
        result
    }

    /// Finds the binary for one snippet in one dialect.
    #[must_use]
    pub fn find_blob(&self, dialect: Dialect, snippet_index: usize) -> Option<&BytecodeBlob> {
        self.blobs
            .iter()
            .find(|blob| blob.dialect == dialect && blob.snippet_index == snippet_index)
    }

    /// Logs blob sizes at debug level.
    pub fn dump_debug(&self, input: &Input) {
        for blob in &self.blobs {
            let snippet = &input.snippets[blob.snippet_index];
            log::debug!(
                "bytecode for '{}' ({}): {} bytes",
                snippet.name,
                blob.dialect,
                blob.bytes.len()
            );
        }
    }
}

fn compile_source(name: &str, source: &CrossSource, dialect: Dialect) -> Result<Vec<u8>, String> {
    let Some(binary_extension) = dialect.binary_extension() else {
        return Err("dialect has no binary form".to_string());
    };
    let scratch = tempfile::tempdir().map_err(|err| format!("cannot create scratch dir: {err}"))?;
    let source_path = scratch.path().join(format!("{name}{}", dialect.file_extension()));
    let output_path = scratch.path().join(format!("{name}{binary_extension}"));
    fs::write(&source_path, &source.source_code)
        .map_err(|err| format!("cannot stage source: {err}"))?;
    match dialect {
        Dialect::Hlsl5 => run_fxc(&source_path, &output_path, source)?,
        Dialect::MetalMacos => run_metal("macosx", scratch.path(), &source_path, &output_path)?,
        Dialect::MetalIos => run_metal("iphoneos", scratch.path(), &source_path, &output_path)?,
        Dialect::Glsl330 | Dialect::Glsl100 | Dialect::Glsl300Es => {
            return Err("dialect has no binary form".to_string());
        }
    }
    fs::read(&output_path).map_err(|err| format!("cannot read compiled binary: {err}"))
}

fn run_fxc(source_path: &Path, output_path: &Path, source: &CrossSource) -> Result<(), String> {
    let profile = match source.reflection.stage {
        ShaderStage::Vertex => "vs_5_0",
        ShaderStage::Fragment => "ps_5_0",
    };
    let output = Command::new("fxc")
        .arg("/T")
        .arg(profile)
        .arg("/E")
        .arg(&source.reflection.entry_point)
        .arg("/O3")
        .arg("/Fo")
        .arg(output_path)
        .arg(source_path)
        .output()
        .map_err(|err| format!("cannot run fxc: {err}"))?;
    check_exit("fxc", &output)
}

fn run_metal(
    sdk: &str,
    scratch: &Path,
    source_path: &Path,
    output_path: &Path,
) -> Result<(), String> {
    let air_path: PathBuf = scratch.join("shader.air");
    let output = Command::new("xcrun")
        .args(["-sdk", sdk, "metal", "-c"])
        .arg(source_path)
        .arg("-o")
        .arg(&air_path)
        .output()
        .map_err(|err| format!("cannot run xcrun metal: {err}"))?;
    check_exit("xcrun metal", &output)?;
    let output = Command::new("xcrun")
        .args(["-sdk", sdk, "metallib"])
        .arg(&air_path)
        .arg("-o")
        .arg(output_path)
        .output()
        .map_err(|err| format!("cannot run xcrun metallib: {err}"))?;
    check_exit("xcrun metallib", &output)
}

fn check_exit(tool: &str, output: &std::process::Output) -> Result<(), String> {
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            Err(format!("{tool} exited with {}", output.status))
        } else {
            Err(format!("{tool} failed: {stderr}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_stage_is_empty() {
        let input = Input::default();
        let cross = Cross::default();
        let bytecode = Bytecode::compile(&input, &cross, false);
        assert!(bytecode.errors.is_empty());
        assert!(bytecode.blobs.is_empty());
    }
}
