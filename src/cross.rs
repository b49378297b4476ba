//! SPIR-V to target dialect translation stage.
//!
//! For each requested [`Dialect`] and each SPIR-V blob, the blob is parsed
//! back into a module, lowered to target source text and paired with the
//! [`Reflection`] extracted from that module. A failed (snippet, dialect)
//! pair records a diagnostic against the snippet's first original line and
//! emits nothing; the remaining pairs still translate so one run reports
//! as much as possible.

use crate::dialect::Dialect;
use crate::errors::Diagnostic;
use crate::input::Input;
use crate::reflect::Reflection;
use crate::spirv::{Spirv, SpirvBlob};

/// One translated shader: target source plus normalised reflection.
#[derive(Debug, Clone)]
pub struct CrossSource {
    pub snippet_index: usize,
    pub source_code: String,
    pub reflection: Reflection,
}

/// All successful translations for one dialect.
#[derive(Debug, Default)]
pub struct DialectSources {
    pub sources: Vec<CrossSource>,
}

/// Result of the translation stage, keyed by dialect in request order.
#[derive(Debug, Default)]
pub struct Cross {
    pub errors: Vec<Diagnostic>,
    dialects: Vec<(Dialect, DialectSources)>,
}

impl Cross {
    /// Builds a translation set from externally produced sources.
    ///
    /// The pipeline normally fills a `Cross` through [`CrossTranslator`];
    /// this constructor lets tests and alternative translators feed the
    /// header generator directly.
    #[must_use]
    pub fn from_sources(sets: Vec<(Dialect, Vec<CrossSource>)>) -> Self {
        Self {
            errors: Vec::new(),
            dialects: sets
                .into_iter()
                .map(|(dialect, sources)| (dialect, DialectSources { sources }))
                .collect(),
        }
    }

    /// The requested dialects, in request order.
    #[must_use]
    pub fn dialects(&self) -> Vec<Dialect> {
        self.dialects.iter().map(|(dialect, _)| *dialect).collect()
    }

    /// The translations for one dialect, if the dialect was requested.
    #[must_use]
    pub fn sources_for(&self, dialect: Dialect) -> Option<&[CrossSource]> {
        self.dialects
            .iter()
            .find(|(d, _)| *d == dialect)
            .map(|(_, sources)| sources.sources.as_slice())
    }

    /// Finds the translation of one snippet in one dialect. Absence means
    /// the pair failed to translate (and raised a diagnostic).
    #[must_use]
    pub fn find_source(&self, dialect: Dialect, snippet_index: usize) -> Option<&CrossSource> {
        self.sources_for(dialect)?
            .iter()
            .find(|source| source.snippet_index == snippet_index)
    }

    /// Logs every translation at debug level.
    pub fn dump_debug(&self, input: &Input) {
        for (dialect, sources) in &self.dialects {
            for source in &sources.sources {
                let snippet = &input.snippets[source.snippet_index];
                log::debug!("{dialect} source for '{}':\n{}", snippet.name, source.source_code);
                source.reflection.dump_debug();
            }
        }
    }
}

/// Scoped handle on the SPIR-V frontend and validator, the second of the
/// two process-wide toolchains. Stages take it as a parameter so the
/// pipeline can run against a test-owned instance.
pub struct CrossTranslator {
    validator: naga::valid::Validator,
}

impl Default for CrossTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::all(),
            ),
        }
    }

    /// Translates every blob into every requested dialect.
    pub fn translate(&mut self, input: &Input, spirv: &Spirv, dialects: &[Dialect]) -> Cross {
        let mut cross = Cross::default();
        for &dialect in dialects {
            let mut sources = DialectSources::default();
            for blob in &spirv.blobs {
                match self.translate_blob(blob, dialect) {
                    Ok(source) => sources.sources.push(source),
                    Err(message) => {
                        let snippet = &input.snippets[blob.snippet_index];
                        cross.errors.push(Diagnostic::at(
                            &input.path,
                            snippet.first_line(),
                            format!("failed to translate '{}' to {dialect}: {message}", snippet.name),
                        ));
                    }
                }
            }
            cross.dialects.push((dialect, sources));
        }
        cross
    }

    fn translate_blob(&mut self, blob: &SpirvBlob, dialect: Dialect) -> Result<CrossSource, String> {
        let options = naga::front::spv::Options {
            adjust_coordinate_space: false,
            strict_capabilities: false,
            block_ctx_dump_prefix: None,
        };
        let module = naga::front::spv::Frontend::new(blob.words.iter().copied(), &options)
            .parse()
            .map_err(|error| format!("SPIR-V parse failed: {error}"))?;
        let info = self
            .validator
            .validate(&module)
            .map_err(|error| format!("validation failed: {}", error.as_inner()))?;

        let mut reflection = Reflection::from_module(&module, dialect.uses_semantics())?;
        let (source_code, renamed_entry) = match dialect {
            Dialect::Glsl330 => (
                write_glsl(&module, &info, naga::back::glsl::Version::Desktop(330), &reflection)?,
                None,
            ),
            Dialect::Glsl100 => (
                write_glsl(
                    &module,
                    &info,
                    naga::back::glsl::Version::Embedded {
                        version: 100,
                        is_webgl: false,
                    },
                    &reflection,
                )?,
                None,
            ),
            Dialect::Glsl300Es => (
                write_glsl(
                    &module,
                    &info,
                    naga::back::glsl::Version::Embedded {
                        version: 300,
                        is_webgl: false,
                    },
                    &reflection,
                )?,
                None,
            ),
            Dialect::Hlsl5 => write_hlsl(&module, &info)?,
            Dialect::MetalMacos | Dialect::MetalIos => write_msl(&module, &info)?,
        };
        if let Some(entry_point) = renamed_entry {
            reflection.entry_point = entry_point;
        }
        Ok(CrossSource {
            snippet_index: blob.snippet_index,
            source_code,
            reflection,
        })
    }
}

fn write_glsl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    version: naga::back::glsl::Version,
    reflection: &Reflection,
) -> Result<String, String> {
    use naga::back::glsl;
    let options = glsl::Options {
        version,
        ..Default::default()
    };
    let shader_stage = match reflection.stage {
        crate::reflect::ShaderStage::Vertex => naga::ShaderStage::Vertex,
        crate::reflect::ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let pipeline_options = glsl::PipelineOptions {
        shader_stage,
        entry_point: reflection.entry_point.clone(),
        multiview: None,
    };
    let mut output = String::new();
    let mut writer = glsl::Writer::new(
        &mut output,
        module,
        info,
        &options,
        &pipeline_options,
        naga::proc::BoundsCheckPolicies::default(),
    )
    .map_err(|error| error.to_string())?;
    writer.write().map_err(|error| error.to_string())?;
    Ok(output)
}

fn write_hlsl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
) -> Result<(String, Option<String>), String> {
    use naga::back::hlsl;
    let options = hlsl::Options {
        shader_model: hlsl::ShaderModel::V5_0,
        fake_missing_bindings: true,
        ..Default::default()
    };
    let mut output = String::new();
    let mut writer = hlsl::Writer::new(&mut output, &options);
    let reflection_info = writer
        .write(module, info)
        .map_err(|error| error.to_string())?;
    let entry_point = reflection_info
        .entry_point_names
        .into_iter()
        .next()
        .and_then(std::result::Result::ok);
    Ok((output, entry_point))
}

fn write_msl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
) -> Result<(String, Option<String>), String> {
    use naga::back::msl;
    let options = msl::Options {
        lang_version: (1, 2),
        fake_missing_bindings: true,
        ..Default::default()
    };
    let pipeline_options = msl::PipelineOptions::default();
    let (output, translation_info) = msl::write_string(module, info, &options, &pipeline_options)
        .map_err(|error| error.to_string())?;
    let entry_point = translation_info
        .entry_point_names
        .into_iter()
        .next()
        .and_then(std::result::Result::ok);
    Ok((output, entry_point))
}
