//! Pipeline Tests
//!
//! End-to-end runs through the real toolchain:
//! - parse -> SPIR-V -> glsl330 -> generated header
//! - reflection normalisation (attribute slots, uniform block layout)
//! - diagnostic remapping out of shared blocks
//! - deterministic output

use clap::Parser;

use shdc::args::Args;
use shdc::bytecode::Bytecode;
use shdc::codegen;
use shdc::cross::CrossTranslator;
use shdc::dialect::Dialect;
use shdc::input::Input;
use shdc::reflect::{ShaderStage, UniformType};
use shdc::spirv::SpirvCompiler;

const PATH: &str = "pipeline.glsl";

const TRIANGLE: &str = "\
@block uniforms
layout(binding = 0) uniform vs_params { mat4 mvp; };
@end
@vs vs
@include_block uniforms
layout(location = 0) in vec4 position;
layout(location = 1) in vec2 texcoord0;
layout(location = 0) out vec2 uv;
void main() {
    gl_Position = mvp * position;
    uv = texcoord0;
}
@end
@fs fs
layout(location = 0) in vec2 uv;
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(uv, 0.0, 1.0);
}
@end
@program prog vs fs
";

fn args_for(slang: &str) -> Args {
    Args::try_parse_from(["shdc", "-i", PATH, "-o", "out.h", "-l", slang])
        .expect("test args should parse")
}

fn compile_triangle(slang: &str) -> (Input, shdc::Cross) {
    let input = Input::parse_source(PATH, TRIANGLE).expect("triangle source should parse");
    let spirv = SpirvCompiler::new().compile(&input);
    assert!(spirv.errors.is_empty(), "spirv errors: {:?}", spirv.errors);
    assert_eq!(spirv.blobs.len(), 2);
    let dialects = Dialect::from_tag_list(slang).expect("slang list should parse");
    let cross = CrossTranslator::new().translate(&input, &spirv, &dialects);
    assert!(cross.errors.is_empty(), "cross errors: {:?}", cross.errors);
    (input, cross)
}

// ============================================================================
// SPIR-V stage
// ============================================================================

#[test]
fn spirv_blobs_only_for_shader_snippets() {
    let input = Input::parse_source(PATH, TRIANGLE).expect("triangle source should parse");
    let spirv = SpirvCompiler::new().compile(&input);
    assert!(spirv.errors.is_empty());
    // the block snippet (index 0) must not produce a blob
    let indices: Vec<usize> = spirv.blobs.iter().map(|b| b.snippet_index).collect();
    assert_eq!(indices, vec![1, 2]);
    for blob in &spirv.blobs {
        assert!(!blob.words.is_empty());
    }
}

#[test]
fn glsl_error_in_shared_block_maps_to_block_line() {
    let source = "\
@block bad
florp gorp;
@end
@vs vs1
@include_block bad
void main() { gl_Position = vec4(0.0); }
@end
@vs vs2
layout(location = 0) in vec4 pos;
@include_block bad
void main() { gl_Position = pos; }
@end
";
    let input = Input::parse_source(PATH, source).expect("source should parse");
    let spirv = SpirvCompiler::new().compile(&input);
    assert!(spirv.blobs.is_empty());
    assert!(spirv.errors.len() >= 2, "expected one error per shader: {:?}", spirv.errors);
    for error in &spirv.errors {
        // both shaders must report the line inside the block (zero-based 1)
        assert_eq!(error.line_index, Some(1), "bad remap: {error:?}");
        assert_eq!(error.path, PATH);
    }
}

// ============================================================================
// Cross-translate stage
// ============================================================================

#[test]
fn glsl330_reflection_is_normalised() {
    let (input, cross) = compile_triangle("glsl330");
    let vs_index = input.vs_map["vs"];
    let fs_index = input.fs_map["fs"];

    let vs = cross.find_source(Dialect::Glsl330, vs_index).expect("vs should translate");
    assert_eq!(vs.reflection.stage, ShaderStage::Vertex);
    assert!(!vs.source_code.is_empty());
    assert_eq!(vs.reflection.attrs.len(), 2);
    assert_eq!(vs.reflection.attrs[0].slot, 0);
    assert_eq!(vs.reflection.attrs[1].slot, 1);
    for attr in &vs.reflection.attrs {
        assert!(attr.sem_name.is_empty());
        assert_eq!(attr.sem_index, 0);
    }

    assert_eq!(vs.reflection.uniform_blocks.len(), 1);
    let block = &vs.reflection.uniform_blocks[0];
    assert_eq!(block.slot, 0);
    assert_eq!(block.size, 64);
    assert_eq!(block.uniforms.len(), 1);
    assert_eq!(block.uniforms[0].ty, UniformType::Mat4);
    assert_eq!(block.uniforms[0].offset, 0);
    assert_eq!(block.uniforms[0].array_count, 1);

    let fs = cross.find_source(Dialect::Glsl330, fs_index).expect("fs should translate");
    assert_eq!(fs.reflection.stage, ShaderStage::Fragment);
    assert!(fs.reflection.attrs.is_empty());
    assert!(fs.reflection.uniform_blocks.is_empty());
}

#[test]
fn hlsl5_attributes_carry_location_semantics() {
    let (input, cross) = compile_triangle("hlsl5");
    let vs_index = input.vs_map["vs"];
    let vs = cross.find_source(Dialect::Hlsl5, vs_index).expect("vs should translate");
    assert_eq!(vs.reflection.attrs.len(), 2);
    for attr in &vs.reflection.attrs {
        assert_eq!(attr.sem_name, "LOC");
        assert_eq!(attr.sem_index, attr.slot);
    }
}

#[test]
fn metal_translations_exist_for_both_platforms() {
    let (input, cross) = compile_triangle("metal_macos:metal_ios");
    let vs_index = input.vs_map["vs"];
    for dialect in [Dialect::MetalMacos, Dialect::MetalIos] {
        let vs = cross.find_source(dialect, vs_index).expect("vs should translate");
        assert!(!vs.source_code.is_empty());
    }
}

// ============================================================================
// Header generation (scenario: one block, one program, glsl330)
// ============================================================================

#[test]
fn generated_header_contains_sources_reflection_and_accessor() {
    let (input, cross) = compile_triangle("glsl330");
    let args = args_for("glsl330");
    let bytecode = Bytecode::compile(&input, &cross, false);
    assert!(bytecode.errors.is_empty());

    let header = codegen::generate(&args, &input, &cross, &bytecode)
        .expect("header generation should succeed");

    // two shader source constants, gated by the dialect token
    assert!(header.contains("static const char vs_source_glsl330[] ="));
    assert!(header.contains("static const char fs_source_glsl330[] ="));
    assert!(header.contains("#if defined(SOKOL_GLCORE33)"));

    // vertex attribute table and uniform block descriptor
    assert!(header.contains("#define ATTR_vs_"));
    assert!(header.contains("#define SLOT_vs_params (0)"));
    assert!(header.contains("typedef struct vs_params_t {"));
    assert!(header.contains("float mvp[16];"));
    assert!(header.contains("uniform_blocks[0].size = 64;"));
    assert!(header.contains("SG_UNIFORMTYPE_MAT4"));

    // program accessor
    assert!(header.contains("static inline const sg_shader_desc* prog_shader_desc(void)"));
    assert!(header.contains("desc.label = \"prog_shader\";"));
}

#[test]
fn header_generation_is_deterministic() {
    let (input, cross) = compile_triangle("glsl330:glsl300es");
    let args = args_for("glsl330:glsl300es");
    let bytecode = Bytecode::compile(&input, &cross, false);
    let first = codegen::generate(&args, &input, &cross, &bytecode).expect("generate");
    let second = codegen::generate(&args, &input, &cross, &bytecode).expect("generate");
    assert_eq!(first, second);
}
