use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cacheasm::frontend::lexer::Lexer;
use cacheasm::frontend::token_dumper::TokenDumper;
use cacheasm::{CompileResult, CompilerOptions, Status, compile_with, disassemble};

/// Exit code for a compiler bug (as opposed to a bad program).
const EXIT_INTERNAL: u8 = 3;

/// Compile an automaton program and report whether it parses
#[derive(Parser)]
#[command(name = "cacheasm", version)]
#[command(about = "Compiler for the postfix automaton language")]
struct Cli {
    /// Program source file
    path: PathBuf,

    /// Dump the token stream instead of compiling
    #[arg(long)]
    tokens: bool,

    /// Print the disassembly after a successful compile
    #[arg(long)]
    disasm: bool,

    /// Write the compiled program (postcard encoding) to this file
    #[arg(long, value_name = "OUT")]
    emit: Option<PathBuf>,

    /// Disable ANSI colors in the token dump
    #[arg(long)]
    no_color: bool,

    /// Log level or filter directive
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// TOML file with compiler options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Give up after this many errors
    #[arg(long)]
    max_errors: Option<usize>,

    /// Truncate longer tokens to this many characters
    #[arg(long)]
    max_token_len: Option<usize>,

    /// Reject .if/.while nested deeper than this
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            eprintln!("{}", Cli::command().render_usage());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("invalid log level '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let options = load_options(cli)?;
    debug!(?options, "compiler options");

    let source = read_source(&cli.path)?;

    let mut out = io::stdout().lock();
    if cli.tokens {
        let tokens = Lexer::new(&source, options.max_token_len).tokenize();
        let mut dumper = TokenDumper::new();
        if cli.no_color {
            dumper = dumper.no_color();
        }
        dumper.dump(&tokens, &mut out)?;
        return Ok(0);
    }

    let result = compile_with(&source, &options);
    info!(
        path = %cli.path.display(),
        status = %result.status(),
        errors = result.error_count(),
        warnings = result.warning_count(),
        "compiled"
    );
    let code = report(cli, &result, &mut out)?;
    out.flush()?;
    Ok(code)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

/// Prints the outcome of a compile and returns the process exit code.
fn report(cli: &Cli, result: &CompileResult, out: &mut impl Write) -> Result<u8> {
    writeln!(out, "{}", headline(result.status()))?;

    if result.status() != Status::Ok {
        writeln!(out, "{}", result.messages())?;
        return Ok(exit_code(result.status()));
    }

    if !result.diagnostics().is_empty() {
        eprintln!("{}", result.messages());
    }
    let program = result.program();
    if cli.disasm {
        disassemble(&program.instructions, &program.symbols, &program.topics, out)?;
    }
    if let Some(path) = &cli.emit {
        let bytes = program.to_bytes()?;
        fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), "wrote compiled program");
    }
    Ok(exit_code(Status::Ok))
}

fn headline(status: Status) -> &'static str {
    match status {
        Status::Ok => "Successful parse",
        Status::SyntaxError => "Syntax errors",
        Status::InternalError => "Internal error",
    }
}

fn exit_code(status: Status) -> u8 {
    match status {
        Status::Ok => 0,
        Status::SyntaxError => 1,
        Status::InternalError => EXIT_INTERNAL,
    }
}

/// Defaults, then the config file, then command-line overrides.
fn load_options(cli: &Cli) -> Result<CompilerOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            CompilerOptions::from_toml(&text)
                .with_context(|| format!("invalid config '{}'", path.display()))?
        }
        None => CompilerOptions::default(),
    };
    if let Some(n) = cli.max_errors {
        options.max_errors = n;
    }
    if let Some(n) = cli.max_token_len {
        options.max_token_len = n;
    }
    if let Some(n) = cli.max_depth {
        options.max_depth = n;
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacheasm::compile;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["cacheasm"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn report_text(cli: &Cli, source: &str) -> (u8, String) {
        let result = compile(source);
        let mut out = Vec::new();
        let code = report(cli, &result, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_successful_parse() {
        let (code, text) = report_text(&cli(&["prog.aut"]), "add stop");
        assert_eq!(code, 0);
        assert_eq!(text, "Successful parse\n");
    }

    #[test]
    fn test_successful_parse_with_disassembly() {
        let (code, text) = report_text(&cli(&["prog.aut", "--disasm"]), ":var x int\nstop");
        assert_eq!(code, 0);
        assert!(text.starts_with("Successful parse\n=== variables ===\nx: int [slot 0]\n"));
        assert!(text.ends_with("=== end ===\n"));
    }

    #[test]
    fn test_syntax_errors() {
        let (code, text) = report_text(&cli(&["prog.aut"]), "add\n");
        assert_eq!(code, 1);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Syntax errors");
        assert_eq!(lines[1], "2:1: error: expected 'stop', but got end of input");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(exit_code(Status::Ok), 0);
        assert_eq!(exit_code(Status::SyntaxError), 1);
        assert_eq!(exit_code(Status::InternalError), 3);
        assert_eq!(headline(Status::InternalError), "Internal error");
    }

    #[test]
    fn test_emit_writes_program() {
        let path = std::env::temp_dir().join(format!("cacheasm-emit-{}.bin", std::process::id()));
        let path_arg = path.to_string_lossy().into_owned();
        let (code, _) = report_text(&cli(&["prog.aut", "--emit", &path_arg]), "add stop");
        assert_eq!(code, 0);

        let bytes = fs::read(&path).unwrap();
        let program = cacheasm::CompiledProgram::from_bytes(&bytes).unwrap();
        assert_eq!(program, compile("add stop").into_program());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unreadable_file() {
        let err = read_source(Path::new("/nonexistent/prog.aut")).unwrap_err();
        assert!(format!("{:#}", err).starts_with("failed to read '/nonexistent/prog.aut'"));
        assert!(Cli::command().render_usage().to_string().contains("cacheasm"));
    }

    #[test]
    fn test_options_overrides() {
        let options = load_options(&cli(&["prog.aut", "--max-errors", "9", "--max-depth", "3"])).unwrap();
        assert_eq!(options.max_errors, 9);
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.max_token_len, 500);
    }

    #[test]
    fn test_wrong_argument_count_is_usage_error() {
        let err = Cli::try_parse_from(["cacheasm"]).err().unwrap();
        assert!(err.use_stderr());
        let err = Cli::try_parse_from(["cacheasm", "a.aut", "b.aut"]).err().unwrap();
        assert!(err.use_stderr());
    }
}
