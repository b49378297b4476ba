//! Header Generator Tests
//!
//! Tests with synthetic translation results, so the generator's output
//! can be checked without running the shader toolchain:
//! - dialect sections, source escaping and comment-token rewriting
//! - bytecode embedding (byte arrays plus byte_code fields)
//! - reflection constants, uniform structs, pad fillers and @type aliases
//! - generator preconditions and the --noifdef switch

use clap::Parser;

use shdc::args::Args;
use shdc::bytecode::{Bytecode, BytecodeBlob};
use shdc::codegen;
use shdc::cross::{Cross, CrossSource};
use shdc::dialect::Dialect;
use shdc::input::Input;
use shdc::reflect::{
    Image, ImageKind, Reflection, ShaderStage, Uniform, UniformBlock, UniformType, VertexAttr,
};

const PATH: &str = "gen.glsl";

const SOURCE: &str = "\
@module demo
@type mat4 hmm_mat4
@vs vs
void main() {}
@end
@fs fs
void main() {}
@end
@program prog vs fs
";

fn demo_input() -> Input {
    Input::parse_source(PATH, SOURCE).expect("source should parse")
}

fn vs_reflection(with_semantics: bool) -> Reflection {
    let (sem_name, sem_index) = if with_semantics {
        ("LOC".to_string(), 0)
    } else {
        (String::new(), 0)
    };
    Reflection {
        stage: ShaderStage::Vertex,
        entry_point: "main".to_string(),
        attrs: vec![VertexAttr {
            slot: 0,
            name: "position".to_string(),
            sem_name,
            sem_index,
        }],
        uniform_blocks: vec![UniformBlock {
            slot: 0,
            size: 80,
            name: "vs_params".to_string(),
            uniforms: vec![
                Uniform {
                    name: "mvp".to_string(),
                    ty: UniformType::Mat4,
                    array_count: 1,
                    offset: 0,
                },
                Uniform {
                    name: "tint".to_string(),
                    ty: UniformType::Float3,
                    array_count: 1,
                    offset: 64,
                },
            ],
        }],
        images: Vec::new(),
    }
}

fn fs_reflection() -> Reflection {
    Reflection {
        stage: ShaderStage::Fragment,
        entry_point: "main".to_string(),
        attrs: Vec::new(),
        uniform_blocks: Vec::new(),
        images: vec![Image {
            slot: 0,
            name: "tex".to_string(),
            kind: ImageKind::ImageCube,
        }],
    }
}

fn sources_for(input: &Input, dialect: Dialect) -> Vec<CrossSource> {
    let with_semantics = dialect == Dialect::Hlsl5;
    vec![
        CrossSource {
            snippet_index: input.vs_map["vs"],
            source_code: "vertex code /* inner */\nsecond line\n".to_string(),
            reflection: vs_reflection(with_semantics),
        },
        CrossSource {
            snippet_index: input.fs_map["fs"],
            source_code: "fragment code\n".to_string(),
            reflection: fs_reflection(),
        },
    ]
}

fn args_for(argv: &[&str]) -> Args {
    let mut full = vec!["shdc", "-i", PATH, "-o", "out.h"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).expect("test args should parse")
}

// ============================================================================
// Full header content
// ============================================================================

#[test]
fn hlsl_header_embeds_bytecode_and_source() {
    let input = demo_input();
    let sources = sources_for(&input, Dialect::Hlsl5);
    let cross = Cross::from_sources(vec![(Dialect::Hlsl5, sources)]);
    let mut bytecode = Bytecode::default();
    bytecode.blobs.push(BytecodeBlob {
        snippet_index: input.vs_map["vs"],
        dialect: Dialect::Hlsl5,
        bytes: vec![0x44, 0x58, 0x42, 0x43],
    });
    bytecode.blobs.push(BytecodeBlob {
        snippet_index: input.fs_map["fs"],
        dialect: Dialect::Hlsl5,
        bytes: vec![1, 2, 3],
    });
    let args = args_for(&["-l", "hlsl5", "--bytecode"]);

    let header = codegen::generate(&args, &input, &cross, &bytecode).expect("generate");

    assert!(header.contains("#if defined(SOKOL_D3D11)"));
    assert!(header.contains("static const uint8_t demo_vs_bytecode_hlsl5[4] = {"));
    assert!(header.contains("0x44,0x58,0x42,0x43"));
    assert!(header.contains("static const uint8_t demo_fs_bytecode_hlsl5[3] = {"));
    // the source constants are still emitted next to the binaries
    assert!(header.contains("static const char demo_vs_source_hlsl5[] ="));
    assert!(header.contains("static const char demo_fs_source_hlsl5[] ="));
    assert!(header.contains("desc.vs.byte_code = demo_vs_bytecode_hlsl5;"));
    assert!(header.contains("desc.vs.byte_code_size = 4;"));
    assert!(header.contains("desc.fs.byte_code = demo_fs_bytecode_hlsl5;"));
    assert!(header.contains("desc.attrs[0].sem_name = \"LOC\";"));
}

#[test]
fn glsl_header_reflection_constants() {
    let input = demo_input();
    let sources = sources_for(&input, Dialect::Glsl330);
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let bytecode = Bytecode::default();
    let args = args_for(&["-l", "glsl330"]);

    let header = codegen::generate(&args, &input, &cross, &bytecode).expect("generate");

    assert!(header.starts_with("#pragma once\n"));
    assert!(header.contains("#version:1# (machine generated, don't edit!)"));
    assert!(header.contains("#define ATTR_demo_vs_position (0)"));
    assert!(header.contains("#define SLOT_demo_vs_params (0)"));
    assert!(header.contains("#define SLOT_demo_tex (0)"));

    // @type alias wins for mat4, default spelling for vec3, tail padding
    assert!(header.contains("SOKOL_SHDC_ALIGN(16) typedef struct demo_vs_params_t {"));
    assert!(header.contains("hmm_mat4 mvp;"));
    assert!(header.contains("float tint[3];"));
    assert!(header.contains("uint8_t _pad_76[4];"));

    assert!(header.contains("SG_IMAGETYPE_CUBE"));
    assert!(header.contains("desc.fs.images[0].name = \"tex\";"));
    assert!(header.contains("desc.attrs[0].sem_name = \"\";"));
    assert!(header.contains("static inline const sg_shader_desc* demo_prog_shader_desc(void)"));
    assert!(header.contains("desc.label = \"demo_prog_shader\";"));
}

#[test]
fn comment_tokens_are_rewritten_in_embedded_source() {
    let input = demo_input();
    let sources = sources_for(&input, Dialect::Glsl330);
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330"]);
    let header = codegen::generate(&args, &input, &cross, &Bytecode::default()).expect("generate");

    // the comment copy is rewritten, the string constant keeps the tokens
    assert!(header.contains("vertex code /_ inner _/"));
    assert!(header.contains("\"vertex code /* inner */\\n\""));
}

#[test]
fn uniform_array_members_use_two_dimensional_spelling() {
    let input = demo_input();
    let mut sources = sources_for(&input, Dialect::Glsl330);
    sources[0].reflection.uniform_blocks[0] = UniformBlock {
        slot: 0,
        size: 64,
        name: "vs_params".to_string(),
        uniforms: vec![Uniform {
            name: "bones".to_string(),
            ty: UniformType::Float4,
            array_count: 4,
            offset: 0,
        }],
    };
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330"]);
    let header = codegen::generate(&args, &input, &cross, &Bytecode::default()).expect("generate");
    assert!(header.contains("float bones[4][4];"));
    assert!(header.contains("uniforms[0].array_count = 4;"));
}

// ============================================================================
// Preconditions and switches
// ============================================================================

#[test]
fn missing_translation_fails_at_program_line() {
    let input = demo_input();
    // only the vertex side translated
    let sources = vec![sources_for(&input, Dialect::Glsl330).remove(0)];
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330"]);

    let err = codegen::generate(&args, &input, &cross, &Bytecode::default())
        .expect_err("generation should fail");
    // @program is the last line of the input
    assert_eq!(err.line_index, Some(8));
    assert!(err.message.contains("no generated 'glsl330' source"));
    assert!(err.message.contains("fragment shader 'fs'"));
    assert!(err.message.contains("program 'prog'"));
}

#[test]
fn noifdef_suppresses_dialect_guards() {
    let input = demo_input();
    let sources = sources_for(&input, Dialect::Glsl330);
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330", "--noifdef"]);
    let header = codegen::generate(&args, &input, &cross, &Bytecode::default()).expect("generate");
    assert!(!header.contains("#if defined(SOKOL_GLCORE33)"));
    assert!(header.contains("static const char demo_vs_source_glsl330[] ="));
}

#[test]
fn genver_is_stamped() {
    let input = demo_input();
    let sources = sources_for(&input, Dialect::Glsl330);
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330", "--genver", "42"]);
    let header = codegen::generate(&args, &input, &cross, &Bytecode::default()).expect("generate");
    assert!(header.contains("#version:42#"));
}

#[test]
fn unprefixed_symbols_without_module() {
    let source = "\
@vs vs
void main() {}
@end
@fs fs
void main() {}
@end
@program prog vs fs
";
    let input = Input::parse_source(PATH, source).expect("source should parse");
    let sources = sources_for(&input, Dialect::Glsl330);
    let cross = Cross::from_sources(vec![(Dialect::Glsl330, sources)]);
    let args = args_for(&["-l", "glsl330"]);
    let header = codegen::generate(&args, &input, &cross, &Bytecode::default()).expect("generate");
    assert!(header.contains("\nstatic const char vs_source_glsl330[] ="));
    assert!(header.contains("static inline const sg_shader_desc* prog_shader_desc(void)"));
}
