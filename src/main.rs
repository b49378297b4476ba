//! Pipeline driver.
//!
//! Sequencing: parse arguments, construct the two toolchain handles, then
//! input -> SPIR-V -> cross-translate -> bytecode -> header. The first
//! stage that reports diagnostics short-circuits the run: every collected
//! diagnostic is rendered in the selected format and the process exits
//! non-zero. Exit code 10 is reserved for argument errors.

use std::fs;
use std::process::ExitCode;

use clap::Parser;

use shdc::args::Args;
use shdc::bytecode::Bytecode;
use shdc::codegen;
use shdc::cross::CrossTranslator;
use shdc::errors::{Diagnostic, ErrorFormat};
use shdc::input::Input;
use shdc::spirv::SpirvCompiler;

const EXIT_ARGS: u8 = 10;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap renders help/version through the error path as well
            let code = if err.use_stderr() { EXIT_ARGS } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let mut log_builder = env_logger::Builder::from_default_env();
    if args.dump {
        log_builder.filter_level(log::LevelFilter::Debug);
    }
    log_builder.init();

    let error_format = match args.error_format() {
        Ok(format) => format,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(EXIT_ARGS);
        }
    };
    let dialects = match args.dialects() {
        Ok(dialects) => dialects,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(EXIT_ARGS);
        }
    };
    if args.dump {
        args.dump_debug();
    }

    // the two process-wide toolchain handles; dropped on every exit path
    let mut spirv_compiler = SpirvCompiler::new();
    let mut translator = CrossTranslator::new();

    let input = match Input::parse(&args.input) {
        Ok(input) => input,
        Err(diagnostic) => return fail(&[diagnostic], error_format),
    };
    if args.dump {
        input.dump_debug();
    }

    let spirv = spirv_compiler.compile(&input);
    if !spirv.errors.is_empty() {
        return fail(&spirv.errors, error_format);
    }
    if args.dump {
        spirv.dump_debug(&input);
    }

    let cross = translator.translate(&input, &spirv, &dialects);
    if !cross.errors.is_empty() {
        return fail(&cross.errors, error_format);
    }
    if args.dump {
        cross.dump_debug(&input);
    }

    let bytecode = Bytecode::compile(&input, &cross, args.bytecode);
    if !bytecode.errors.is_empty() {
        return fail(&bytecode.errors, error_format);
    }
    if args.dump {
        bytecode.dump_debug(&input);
    }

    let header = match codegen::generate(&args, &input, &cross, &bytecode) {
        Ok(header) => header,
        Err(diagnostic) => return fail(&[diagnostic], error_format),
    };
    if let Err(err) = fs::write(&args.output, header) {
        let diagnostic = Diagnostic::file(&args.output, format!("failed to write output: {err}"));
        return fail(&[diagnostic], error_format);
    }
    log::info!("wrote {}", args.output);
    ExitCode::SUCCESS
}

fn fail(diagnostics: &[Diagnostic], format: ErrorFormat) -> ExitCode {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render(format));
    }
    ExitCode::FAILURE
}
