use bumpalo::Bump;
use cminus::{compile, CompileError};
use cminus_syntax::{parse, tokenize, SourceFile, Token};
use cminus_typecheck::analyze;
use clap::{Parser, ValueEnum};
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, Level};

const STDIN_NAME: &str = "<stdin>";

#[derive(Parser, Debug)]
#[command(name = "cminus", about = "Compiles a C-minus program to MIPS assembly")]
struct CliArgs {
    /// Source file, or `-` to read standard input
    input: String,

    /// Where to write the assembly, `-` for standard output
    #[arg(short = 'o', long = "output")]
    output_file: Option<String>,

    /// Stop after the given stage and print its result
    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,

    /// Log more, repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    Tokens,
    Ast,
    Symbols,
    Asm,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.diagnostic() {
                Some(diagnostic) => eprintln!("{}", diagnostic.render()),
                None => eprintln!("error: {err}"),
            }
            match err {
                CompileError::Io(..) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs) -> Result<(), CompileError> {
    let file = read_source(&args.input)?;
    let mut stdout = std::io::stdout().lock();

    match args.emit {
        Emit::Tokens => {
            let (tokens, errors) = tokenize(&file);
            write_tokens(&mut stdout, &tokens)?;
            if let Some(err) = errors.into_iter().next() {
                return Err(err.into());
            }
        }
        Emit::Ast => {
            let arena = Bump::new();
            let program = parse(&arena, &file)?;
            write!(stdout, "{program}")?;
        }
        Emit::Symbols => {
            let arena = Bump::new();
            let program = parse(&arena, &file)?;
            let table = analyze(&file, &program)?;
            write!(stdout, "{table}")?;
        }
        Emit::Asm => {
            let asm = compile(&file)?;
            match output_path(args) {
                Some(path) => {
                    std::fs::write(&path, asm)?;
                    debug!(path = %path.display(), "wrote assembly");
                }
                None => stdout.write_all(asm.as_bytes())?,
            }
        }
    }

    Ok(())
}

fn read_source(input: &str) -> Result<SourceFile, std::io::Error> {
    if input == "-" {
        let mut text = String::default();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(SourceFile::new(PathBuf::from(STDIN_NAME), text));
    }
    SourceFile::open(PathBuf::from(input))
}

fn output_path(args: &CliArgs) -> Option<PathBuf> {
    match args.output_file.as_deref() {
        Some("-") => None,
        Some(path) => Some(PathBuf::from(path)),
        None if args.input == "-" => None,
        None => {
            let stem = Path::new(&args.input).file_stem().unwrap_or(OsStr::new("out"));
            Some(PathBuf::from(stem).with_extension("asm"))
        }
    }
}

fn write_tokens<W: Write>(writer: &mut W, tokens: &[Token]) -> std::io::Result<()> {
    writeln!(writer, "{:<6} {:<10} Lexeme", "Line", "Token")?;
    for token in tokens {
        let row = format!("{:<6} {:<10} {}", token.line(), token.kind.name(), token.value);
        writeln!(writer, "{}", row.trim_end())?;
    }
    Ok(())
}
