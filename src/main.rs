use std::io::{self, Read, Write};
use std::path::Path;
use std::{env, fs};

use bfcat::codegen::{BranchCheck, CodegenOptions};
use bfcat::frontend::token_dumper::TokenDumper;
use bfcat::frontend::{Lexer, Parser};
use bfcat::lang::Program;
use bfcat::runtime::{Machine, RuntimeError};

const DEFAULT_OUTPUT: &str = "a.bf";
const DEFAULT_AST_OUTPUT: &str = "a.ast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Compile,
    Run,
    Ast,
}

impl Verb {
    fn parse(arg: &str) -> Option<Verb> {
        match arg {
            "com" | "compile" => Some(Verb::Compile),
            "run" => Some(Verb::Run),
            "ast" => Some(Verb::Ast),
            _ => None,
        }
    }
}

fn main() {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()
    {
        eprintln!("failed to initialise logging: {}", e);
    }

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let tokens_only = args.contains(&"--tokens".to_string());
    let no_color = args.contains(&"--no-color".to_string());
    let ast = args.contains(&"--ast".to_string());

    let mut options = CodegenOptions::default();
    if args.iter().any(|a| a == "-g" || a == "--debug-symbols") {
        options = options.with_debug_symbols();
    }
    if args.contains(&"--no-branch-check".to_string()) {
        options = options.with_branch_check(BranchCheck::Unchecked);
    }

    // positional arguments: verb, source, optional output
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with('-')).collect();

    let (verb, source_path) = match (positional.first(), positional.get(1)) {
        (Some(verb), Some(source)) => match Verb::parse(verb) {
            Some(verb) => (verb, source.as_str()),
            None => {
                eprintln!("unknown command '{}'", verb);
                print_usage();
                std::process::exit(1);
            }
        },
        _ => {
            print_usage();
            std::process::exit(1);
        }
    };

    let output_path = positional.get(2).map(|s| s.as_str()).unwrap_or(match verb {
        Verb::Ast => DEFAULT_AST_OUTPUT,
        Verb::Compile | Verb::Run => DEFAULT_OUTPUT,
    });

    if tokens_only {
        dump_tokens(&read_source(source_path), no_color);
        return;
    }

    let program = load_program(source_path);

    if ast {
        println!("{:#?}", program);
        return;
    }

    match verb {
        Verb::Ast => write_ast(&program, output_path),
        Verb::Compile => {
            write_code(&program, &options, output_path);
        }
        Verb::Run => {
            let code = write_code(&program, &options, output_path);
            run_code(&code);
        }
    }
}

fn print_usage() {
    println!("BFCAT - stack language to tape-machine compiler");
    println!();
    println!("Usage:");
    println!("  bfcat com <source> [output]       Compile to tape code (default output: {})", DEFAULT_OUTPUT);
    println!("  bfcat run <source> [output]       Compile, then interpret the result");
    println!("  bfcat ast <source> [output]       Save the parsed program (default output: {})", DEFAULT_AST_OUTPUT);
    println!();
    println!("A source ending in .ast is loaded as a saved program.");
    println!();
    println!("Flags:");
    println!("  -g, --debug-symbols   Annotate the output with ;; comments");
    println!("  --no-branch-check     Do not require if/else arms to keep the stack depth");
    println!("  --tokens              Show tokens only");
    println!("  --no-color            Plain token listing");
    println!("  --ast                 Print the parsed program and stop");
    println!("  --help, -h            Show this help");
}

fn fail(stage: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{} error: {}", stage, err);
    std::process::exit(1);
}

fn read_source(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => fail("io", format_args!("failed to read '{}': {}", path, e)),
    }
}

fn dump_tokens(source: &str, no_color: bool) {
    let tokens = Lexer::new(source).tokenize();

    let mut dumper = TokenDumper::new();
    if no_color {
        dumper = dumper.no_color();
    }

    if let Err(e) = dumper.dump(&tokens) {
        fail("io", e);
    }
}

fn load_program(path: &str) -> Program {
    if Path::new(path).extension().and_then(|e| e.to_str()) == Some("ast") {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => fail("io", format_args!("failed to read '{}': {}", path, e)),
        };
        return match Program::from_bytes(&bytes) {
            Ok(program) => program,
            Err(e) => fail("decode", format_args!("'{}' is not a saved program: {}", path, e)),
        };
    }

    let source = read_source(path);
    let tokens = Lexer::new(&source).tokenize();
    match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(e) => fail("parse", e),
    }
}

fn write_ast(program: &Program, output_path: &str) {
    let bytes = match program.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => fail("encode", e),
    };
    if let Err(e) = fs::write(output_path, bytes) {
        fail("io", format_args!("failed to write '{}': {}", output_path, e));
    }
}

fn write_code(program: &Program, options: &CodegenOptions, output_path: &str) -> String {
    let code = match bfcat::generate(program, options) {
        Ok(code) => code,
        Err(e) => fail("codegen", e),
    };
    if let Err(e) = fs::write(output_path, &code) {
        fail("io", format_args!("failed to write '{}': {}", output_path, e));
    }
    code
}

fn run_code(code: &str) {
    let stdin = io::stdin();
    let stdout = io::stdout();

    if let Err(e) = run_on(code, &mut stdin.lock(), &mut stdout.lock()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Runs `code`, flushing whatever it printed before a runtime error is
/// reported. The runtime error wins over a failed flush.
fn run_on<R: Read, W: Write>(code: &str, input: &mut R, output: &mut W) -> Result<(), RuntimeError> {
    let result = Machine::new().run(code, input, output);
    if result.is_err() {
        if let Err(flush_err) = output.flush() {
            log::warn!("failed to flush output: {}", flush_err);
        }
    }
    result
}
