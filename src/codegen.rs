//! C header generator.
//!
//! Stitches the translated sources, optional bytecode and reflection into
//! one header usable next to `sokol_gfx.h`. Everything is emitted in a
//! stable order (programs in declaration order, dialects in request
//! order), so re-running the tool on the same input produces an identical
//! file.
//!
//! Layout of the generated header:
//!
//! 1. banner comment with a generator-version stamp and a per-program
//!    overview of slots and bind points
//! 2. alignment macro and standard includes
//! 3. dialect-independent reflection constants: `ATTR_*`/`SLOT_*` defines
//!    and one packed C struct per uniform block
//! 4. per dialect (gated by its `SOKOL_*` token unless suppressed) the
//!    shader sources as string constants, plus byte arrays when bytecode
//!    was compiled
//! 5. per program a `*_shader_desc()` accessor returning an initialised
//!    `sg_shader_desc`

use crate::args::Args;
use crate::bytecode::Bytecode;
use crate::cross::{Cross, CrossSource};
use crate::dialect::Dialect;
use crate::errors::Diagnostic;
use crate::input::{Input, Program};
use crate::reflect::{ShaderStage, Uniform, UniformBlock};
use crate::utils::text::{escape_c_string, replace_c_comment_tokens};

/// Generates the complete header text.
///
/// Fails with a diagnostic at a program's declaration line when that
/// program lacks a translated source in some requested dialect.
pub fn generate(
    args: &Args,
    input: &Input,
    cross: &Cross,
    bytecode: &Bytecode,
) -> Result<String, Diagnostic> {
    check_programs(input, cross)?;
    let dialects = cross.dialects();
    let mut out = String::new();
    write_banner(&mut out, args, input, cross, &dialects);
    write_prelude(&mut out);
    write_reflection_constants(&mut out, input, cross, &dialects);
    for &dialect in &dialects {
        write_dialect_sources(&mut out, args, input, cross, bytecode, dialect);
    }
    for program in &input.programs {
        write_program_desc(&mut out, args, input, cross, bytecode, &dialects, program);
    }
    Ok(out)
}

/// Every program side must have a translated source in every requested
/// dialect before any header text is produced.
fn check_programs(input: &Input, cross: &Cross) -> Result<(), Diagnostic> {
    for dialect in cross.dialects() {
        for program in &input.programs {
            for (stage, name) in [
                (ShaderStage::Vertex, &program.vs_name),
                (ShaderStage::Fragment, &program.fs_name),
            ] {
                let missing = input
                    .snippet_map
                    .get(name)
                    .map_or(true, |&index| cross.find_source(dialect, index).is_none());
                if missing {
                    let stage_word = match stage {
                        ShaderStage::Vertex => "vertex",
                        ShaderStage::Fragment => "fragment",
                    };
                    return Err(Diagnostic::at(
                        &input.path,
                        program.line_index,
                        format!(
                            "no generated '{dialect}' source for {stage_word} shader '{name}' in program '{}'",
                            program.name
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Snippet indices referenced by programs, in declaration order.
fn referenced_snippets(input: &Input) -> Vec<usize> {
    let mut result = Vec::new();
    for program in &input.programs {
        for name in [&program.vs_name, &program.fs_name] {
            if let Some(&index) = input.snippet_map.get(name) {
                if !result.contains(&index) {
                    result.push(index);
                }
            }
        }
    }
    result
}

/// Looks up the vs/fs sources of a program in one dialect.
///
/// Only valid after [`check_programs`] passed.
fn program_sources<'a>(
    input: &Input,
    cross: &'a Cross,
    dialect: Dialect,
    program: &Program,
) -> Option<(&'a CrossSource, &'a CrossSource)> {
    let vs = input
        .snippet_map
        .get(&program.vs_name)
        .and_then(|&index| cross.find_source(dialect, index))?;
    let fs = input
        .snippet_map
        .get(&program.fs_name)
        .and_then(|&index| cross.find_source(dialect, index))?;
    Some((vs, fs))
}

fn write_banner(out: &mut String, args: &Args, input: &Input, cross: &Cross, dialects: &[Dialect]) {
    let prefix = input.module_prefix();
    out.push_str("#pragma once\n");
    out.push_str("/*\n");
    out.push_str(&format!(
        "    #version:{}# (machine generated, don't edit!)\n\n",
        args.genver
    ));
    out.push_str(&format!("    Generated by shdc from {}\n\n", input.path));
    out.push_str("    Overview:\n\n");
    let Some(&first_dialect) = dialects.first() else {
        out.push_str("*/\n");
        return;
    };
    for program in &input.programs {
        let Some((vs, fs)) = program_sources(input, cross, first_dialect, program) else {
            continue;
        };
        out.push_str(&format!("        Shader program '{}':\n", program.name));
        out.push_str(&format!(
            "            Get shader desc: {prefix}{}_shader_desc()\n",
            program.name
        ));
        for (label, name, source) in [
            ("Vertex", &program.vs_name, vs),
            ("Fragment", &program.fs_name, fs),
        ] {
            out.push_str(&format!("            {label} shader: {name}\n"));
            if !source.reflection.attrs.is_empty() {
                out.push_str("                Attribute slots:\n");
                for attr in &source.reflection.attrs {
                    out.push_str(&format!(
                        "                    ATTR_{prefix}{name}_{} = {}\n",
                        attr.name, attr.slot
                    ));
                }
            }
            for block in &source.reflection.uniform_blocks {
                out.push_str(&format!("                Uniform block '{}':\n", block.name));
                out.push_str(&format!(
                    "                    C struct: {prefix}{}_t\n",
                    block.name
                ));
                out.push_str(&format!(
                    "                    Bind slot: SLOT_{prefix}{} = {}\n",
                    block.name, block.slot
                ));
            }
            for image in &source.reflection.images {
                out.push_str(&format!("                Image '{}':\n", image.name));
                out.push_str(&format!(
                    "                    Type: SG_IMAGETYPE_{}\n",
                    image.kind.sg_name()
                ));
                out.push_str(&format!(
                    "                    Bind slot: SLOT_{prefix}{} = {}\n",
                    image.name, image.slot
                ));
            }
        }
    }
    out.push_str("*/\n");
}

fn write_prelude(out: &mut String) {
    out.push_str("#include <stdint.h>\n");
    out.push_str("#include <stdbool.h>\n");
    out.push_str("#include <string.h>\n");
    out.push_str("#if !defined(SOKOL_SHDC_ALIGN)\n");
    out.push_str("  #if defined(_MSC_VER)\n");
    out.push_str("    #define SOKOL_SHDC_ALIGN(a) __declspec(align(a))\n");
    out.push_str("  #else\n");
    out.push_str("    #define SOKOL_SHDC_ALIGN(a) __attribute__((aligned(a)))\n");
    out.push_str("  #endif\n");
    out.push_str("#endif\n");
}

/// Attribute/slot defines and uniform-block structs. The reflection of
/// the first requested dialect is used; the normalised slots and layouts
/// are dialect-independent.
fn write_reflection_constants(
    out: &mut String,
    input: &Input,
    cross: &Cross,
    dialects: &[Dialect],
) {
    let Some(&first_dialect) = dialects.first() else {
        return;
    };
    let prefix = input.module_prefix();
    let mut seen_blocks: Vec<String> = Vec::new();
    let mut seen_images: Vec<String> = Vec::new();
    for snippet_index in referenced_snippets(input) {
        let Some(source) = cross.find_source(first_dialect, snippet_index) else {
            continue;
        };
        let snippet = &input.snippets[snippet_index];
        for attr in &source.reflection.attrs {
            out.push_str(&format!(
                "#define ATTR_{prefix}{}_{} ({})\n",
                snippet.name, attr.name, attr.slot
            ));
        }
        for block in &source.reflection.uniform_blocks {
            if seen_blocks.contains(&block.name) {
                continue;
            }
            seen_blocks.push(block.name.clone());
            out.push_str(&format!(
                "#define SLOT_{prefix}{} ({})\n",
                block.name, block.slot
            ));
            write_uniform_block_struct(out, input, &prefix, block);
        }
        for image in &source.reflection.images {
            if seen_images.contains(&image.name) {
                continue;
            }
            seen_images.push(image.name.clone());
            out.push_str(&format!(
                "#define SLOT_{prefix}{} ({})\n",
                image.name, image.slot
            ));
        }
    }
}

fn write_uniform_block_struct(out: &mut String, input: &Input, prefix: &str, block: &UniformBlock) {
    let mut uniforms: Vec<&Uniform> = block.uniforms.iter().collect();
    uniforms.sort_by_key(|uniform| uniform.offset);
    out.push_str("#pragma pack(push,1)\n");
    out.push_str(&format!(
        "SOKOL_SHDC_ALIGN(16) typedef struct {prefix}{}_t {{\n",
        block.name
    ));
    let mut offset = 0u32;
    for uniform in uniforms {
        if uniform.offset > offset {
            out.push_str(&format!(
                "    uint8_t _pad_{offset}[{}];\n",
                uniform.offset - offset
            ));
        }
        out.push_str(&format!("    {}\n", uniform_member_decl(input, uniform)));
        offset = uniform.offset + uniform.ty.byte_size(uniform.array_count);
    }
    if block.size > offset {
        out.push_str(&format!(
            "    uint8_t _pad_{offset}[{}];\n",
            block.size - offset
        ));
    }
    out.push_str(&format!("}} {prefix}{}_t;\n", block.name));
    out.push_str("#pragma pack(pop)\n");
}

/// C declaration for one uniform block member.
///
/// An `@type` alias for the member's GLSL type wins; otherwise members
/// are spelled as plain float/int arrays matching their element count.
fn uniform_member_decl(input: &Input, uniform: &Uniform) -> String {
    if let Some(c_type) = input.type_map.get(uniform.ty.glsl_name()) {
        return if uniform.array_count > 1 {
            format!("{c_type} {}[{}];", uniform.name, uniform.array_count)
        } else {
            format!("{c_type} {};", uniform.name)
        };
    }
    let c_scalar = if uniform.ty.glsl_name().starts_with('i') {
        "int"
    } else {
        "float"
    };
    let elements = uniform.ty.size() / 4;
    if uniform.array_count > 1 {
        format!(
            "{c_scalar} {}[{}][{elements}];",
            uniform.name, uniform.array_count
        )
    } else if elements > 1 {
        format!("{c_scalar} {}[{elements}];", uniform.name)
    } else {
        format!("{c_scalar} {};", uniform.name)
    }
}

fn write_dialect_sources(
    out: &mut String,
    args: &Args,
    input: &Input,
    cross: &Cross,
    bytecode: &Bytecode,
    dialect: Dialect,
) {
    let prefix = input.module_prefix();
    if !args.no_ifdef {
        out.push_str(&format!("#if defined({})\n", dialect.ifdef_token()));
    }
    for snippet_index in referenced_snippets(input) {
        let Some(source) = cross.find_source(dialect, snippet_index) else {
            continue;
        };
        let snippet = &input.snippets[snippet_index];
        out.push_str("/*\n");
        for line in source.source_code.lines() {
            out.push_str(&format!("    {}\n", replace_c_comment_tokens(line)));
        }
        out.push_str("*/\n");
        if let Some(blob) = bytecode.find_blob(dialect, snippet_index) {
            out.push_str(&format!(
                "static const uint8_t {prefix}{}_bytecode_{}[{}] = {{\n",
                snippet.name,
                dialect.tag(),
                blob.bytes.len()
            ));
            for chunk in blob.bytes.chunks(16) {
                let row: Vec<String> = chunk.iter().map(|byte| format!("0x{byte:02x}")).collect();
                out.push_str(&format!("    {},\n", row.join(",")));
            }
            out.push_str("};\n");
        }
        out.push_str(&format!(
            "static const char {prefix}{}_source_{}[] =\n",
            snippet.name,
            dialect.tag()
        ));
        let mut lines = source.source_code.lines().peekable();
        if lines.peek().is_none() {
            out.push_str("    \"\";\n");
        } else {
            while let Some(line) = lines.next() {
                let terminator = if lines.peek().is_none() { ";" } else { "" };
                out.push_str(&format!("    \"{}\\n\"{terminator}\n", escape_c_string(line)));
            }
        }
    }
    if !args.no_ifdef {
        out.push_str("#endif\n");
    }
}

fn write_program_desc(
    out: &mut String,
    args: &Args,
    input: &Input,
    cross: &Cross,
    bytecode: &Bytecode,
    dialects: &[Dialect],
    program: &Program,
) {
    let prefix = input.module_prefix();
    out.push_str(&format!(
        "static inline const sg_shader_desc* {prefix}{}_shader_desc(void) {{\n",
        program.name
    ));
    for (index, &dialect) in dialects.iter().enumerate() {
        if !args.no_ifdef {
            let keyword = if index == 0 { "#if" } else { "#elif" };
            out.push_str(&format!("{keyword} defined({})\n", dialect.ifdef_token()));
        }
        let Some((vs, fs)) = program_sources(input, cross, dialect, program) else {
            continue;
        };
        out.push_str("    {\n");
        out.push_str("        static sg_shader_desc desc;\n");
        out.push_str("        static bool valid;\n");
        out.push_str("        if (!valid) {\n");
        out.push_str("            valid = true;\n");
        for attr in &vs.reflection.attrs {
            out.push_str(&format!(
                "            desc.attrs[{}].name = \"{}\";\n",
                attr.slot, attr.name
            ));
            out.push_str(&format!(
                "            desc.attrs[{}].sem_name = \"{}\";\n",
                attr.slot, attr.sem_name
            ));
            out.push_str(&format!(
                "            desc.attrs[{}].sem_index = {};\n",
                attr.slot, attr.sem_index
            ));
        }
        for (stage_source, snippet_name) in [(vs, &program.vs_name), (fs, &program.fs_name)] {
            write_stage_desc(
                out,
                &prefix,
                dialect,
                bytecode,
                stage_source,
                snippet_name,
            );
        }
        out.push_str(&format!(
            "            desc.label = \"{prefix}{}_shader\";\n",
            program.name
        ));
        out.push_str("        }\n");
        out.push_str("        return &desc;\n");
        out.push_str("    }\n");
    }
    if !args.no_ifdef {
        out.push_str("#endif\n");
    }
    out.push_str("    return 0;\n");
    out.push_str("}\n");
}

fn write_stage_desc(
    out: &mut String,
    prefix: &str,
    dialect: Dialect,
    bytecode: &Bytecode,
    source: &CrossSource,
    snippet_name: &str,
) {
    let stage = source.reflection.stage.as_str();
    if let Some(blob) = bytecode.find_blob(dialect, source.snippet_index) {
        out.push_str(&format!(
            "            desc.{stage}.byte_code = {prefix}{snippet_name}_bytecode_{};\n",
            dialect.tag()
        ));
        out.push_str(&format!(
            "            desc.{stage}.byte_code_size = {};\n",
            blob.bytes.len()
        ));
    } else {
        out.push_str(&format!(
            "            desc.{stage}.source = {prefix}{snippet_name}_source_{};\n",
            dialect.tag()
        ));
    }
    out.push_str(&format!(
        "            desc.{stage}.entry = \"{}\";\n",
        source.reflection.entry_point
    ));
    for block in &source.reflection.uniform_blocks {
        out.push_str(&format!(
            "            desc.{stage}.uniform_blocks[{}].size = {};\n",
            block.slot, block.size
        ));
        for (uniform_index, uniform) in block.uniforms.iter().enumerate() {
            out.push_str(&format!(
                "            desc.{stage}.uniform_blocks[{}].uniforms[{uniform_index}].name = \"{}.{}\";\n",
                block.slot, block.name, uniform.name
            ));
            out.push_str(&format!(
                "            desc.{stage}.uniform_blocks[{}].uniforms[{uniform_index}].type = SG_UNIFORMTYPE_{};\n",
                block.slot,
                uniform.ty.sg_name()
            ));
            out.push_str(&format!(
                "            desc.{stage}.uniform_blocks[{}].uniforms[{uniform_index}].array_count = {};\n",
                block.slot, uniform.array_count
            ));
        }
    }
    for image in &source.reflection.images {
        out.push_str(&format!(
            "            desc.{stage}.images[{}].name = \"{}\";\n",
            image.slot, image.name
        ));
        out.push_str(&format!(
            "            desc.{stage}.images[{}].type = SG_IMAGETYPE_{};\n",
            image.slot,
            image.kind.sg_name()
        ));
    }
}
