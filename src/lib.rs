#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

//! Annotated-GLSL shader cross-compiler.
//!
//! A single input file bundles named shader snippets (`@block`, `@vs`,
//! `@fs`) and pairs them into programs (`@program`). The pipeline compiles
//! every vertex and fragment snippet to SPIR-V, lowers each blob to the
//! requested target dialects (GLSL, HLSL, Metal), optionally runs the
//! vendor bytecode compilers, and emits one C header with the translated
//! sources plus typed reflection for each program.
//!
//! The stages are plain values wired together by the `shdc` binary:
//!
//! ```rust,ignore
//! let input = Input::parse("shaders.glsl")?;
//! let spirv = SpirvCompiler::new().compile(&input);
//! let cross = CrossTranslator::new().translate(&input, &spirv, &dialects);
//! let bytecode = Bytecode::compile(&input, &cross, false);
//! let header = codegen::generate(&args, &input, &cross, &bytecode)?;
//! ```
//!
//! Every derived artifact back-links into the [`Input`] by snippet index
//! and line index, so a diagnostic raised by the last stage still points
//! at a line of the original annotated file.

pub mod args;
pub mod bytecode;
pub mod codegen;
pub mod cross;
pub mod dialect;
pub mod errors;
pub mod input;
pub mod reflect;
pub mod spirv;
pub mod utils;

pub use args::Args;
pub use bytecode::{Bytecode, BytecodeBlob};
pub use cross::{Cross, CrossSource, CrossTranslator};
pub use dialect::Dialect;
pub use errors::{Diagnostic, ErrorFormat, Result, ShdcError};
pub use input::{Input, Program, Snippet, SnippetKind};
pub use reflect::{
    Image, ImageKind, Reflection, ShaderStage, Uniform, UniformBlock, UniformType, VertexAttr,
};
pub use spirv::{Spirv, SpirvBlob, SpirvCompiler};
