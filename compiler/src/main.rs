//! Pebble Compiler CLI
//!
//! Command-line interface for running Pebble programs through any stage of
//! the pipeline, from tokens through a linked native executable.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use pebblec::config::CompilerConfig;

#[derive(ClapParser)]
#[command(name = "pebblec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pebble compiler - compile .pebble programs to executables", long_about = None)]
struct Cli {
    /// Load compiler options from a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize, parse, typecheck and interpret; print the resulting value
    Interpret {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,
    },

    /// Tokenize, parse, typecheck and lower to IR; print one instruction per line
    Ir {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,
    },

    /// Run the full pipeline through assembly generation; print AT&T-syntax text
    Asm {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,
    },

    /// Compile to a native executable
    Compile {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,

        /// Output executable path
        #[arg(short, long, default_value = "compiled_program")]
        output: PathBuf,

        /// Assembler/linker binary to invoke (overrides config)
        #[arg(long)]
        cc: Option<String>,

        /// Keep the intermediate .s file next to the output binary
        #[arg(long)]
        keep_asm: bool,
    },

    /// Run every pipeline stage, printing each intermediate artifact
    TestPrints {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,
    },

    /// Run the bundled test_programs/ suite and print a pass/fail summary
    End {
        /// Directory of test_programs (defaults to ./test_programs)
        #[arg(default_value = "test_programs")]
        dir: PathBuf,
    },

    /// Tokenize, parse and typecheck only; print the inferred type
    Check {
        /// Input .pebble source file (defaults to stdin)
        source_file: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match CompilerConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => CompilerConfig::default(),
    };

    match cli.command {
        Commands::Interpret { source_file } => run_interpret(source_file.as_deref()),
        Commands::Ir { source_file } => run_ir(source_file.as_deref()),
        Commands::Asm { source_file } => run_asm(source_file.as_deref()),
        Commands::Compile {
            source_file,
            output,
            cc,
            keep_asm,
        } => {
            let mut config = config;
            if let Some(cc) = cc {
                config.cc = cc;
            }
            config.keep_asm = config.keep_asm || keep_asm;
            run_compile(source_file.as_deref(), &output, &config);
        }
        Commands::TestPrints { source_file } => run_test_prints(source_file.as_deref()),
        Commands::End { dir } => run_end(&dir, &config),
        Commands::Check { source_file } => run_check(source_file.as_deref()),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn read_source(source_file: Option<&Path>) -> (String, String) {
    match source_file {
        Some(path) => {
            let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error: failed to read {}: {e}", path.display());
                process::exit(1);
            });
            (path.display().to_string(), source)
        }
        None => {
            let mut source = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut source) {
                eprintln!("Error: failed to read stdin: {e}");
                process::exit(1);
            }
            ("<stdin>".to_string(), source)
        }
    }
}

fn run_interpret(source_file: Option<&Path>) {
    let (file, source) = read_source(source_file);
    let expr = match pebblec::parse_program(&file, &source) {
        Ok(e) => e,
        Err(e) => fail(&e),
    };
    if let Err(e) = pebblec::typechecker::TypeChecker::new().check(&expr) {
        fail(&e);
    }
    match pebblec::interpreter::Interpreter::new().run(&expr) {
        Ok(value) => println!("{value}"),
        Err(e) => fail(&e),
    }
}

fn run_ir(source_file: Option<&Path>) {
    let (file, source) = read_source(source_file);
    match pebblec::generate_ir(&file, &source) {
        Ok(instructions) => {
            for instr in &instructions {
                println!("{instr}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_asm(source_file: Option<&Path>) {
    let (file, source) = read_source(source_file);
    match pebblec::generate_asm(&file, &source) {
        Ok(asm) => print!("{asm}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_compile(source_file: Option<&Path>, output: &Path, config: &CompilerConfig) {
    let (file, source) = read_source(source_file);
    match pebblec::compile_to_executable(&file, &source, output, config) {
        Ok(()) => println!("Compiled {} -> {}", file, output.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_test_prints(source_file: Option<&Path>) {
    let (file, source) = read_source(source_file);

    let tokens = pebblec::tokenizer::tokenize(&file, &source);
    println!("--- tokens ---");
    for token in &tokens {
        println!("{token:?}");
    }

    let expr = match pebblec::parse_program(&file, &source) {
        Ok(e) => e,
        Err(e) => fail(&e),
    };
    println!("--- ast ---");
    println!("{expr:#?}");

    let ty = match pebblec::typechecker::TypeChecker::new().check(&expr) {
        Ok(ty) => ty,
        Err(e) => fail(&e),
    };
    println!("--- type ---");
    println!("{ty}");

    println!("--- interpreted value ---");
    match pebblec::interpreter::Interpreter::new().run(&expr) {
        Ok(value) => println!("{value}"),
        Err(e) => fail(&e),
    }

    let instructions = pebblec::ir_generator::IrGenerator::generate_program(&expr);
    println!("--- ir ---");
    for instr in &instructions {
        println!("{instr}");
    }

    println!("--- asm ---");
    match pebblec::asm::generate_assembly(&instructions) {
        Ok(asm) => print!("{asm}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_end(dir: &Path, config: &CompilerConfig) {
    let summary = pebblec::test_runner::run_directory(dir, config);
    pebblec::test_runner::print_summary(&summary);
    if !summary.all_passed() {
        process::exit(1);
    } else if summary.total() == 0 {
        eprintln!("No test cases found in {}", dir.display());
        process::exit(2);
    }
}

fn run_check(source_file: Option<&Path>) {
    let (file, source) = read_source(source_file);
    let expr = match pebblec::parse_program(&file, &source) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    match pebblec::typechecker::TypeChecker::new().check(&expr) {
        Ok(ty) => println!("{ty}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pebblec", &mut io::stdout());
}

fn fail(e: &impl std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}
