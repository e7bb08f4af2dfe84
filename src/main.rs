use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast_printer::AstPrinter;
use treelox::parser::Parser;
use treelox::scanner::{scan_tokens, Scanner};
use treelox::Lox;

/// Invocation error (bad arguments).
const EXIT_USAGE: i32 = 64;
/// Scan, parse or resolve error.
const EXIT_DATA: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to treelox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },

    /// Runs a Lox program; without a file, starts an interactive prompt
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("treelox.log").context("Failed to create treelox.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'treelox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to treelox.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<()> {
    let source = read_file(filename)?;

    if json {
        let (tokens, errors) = scan_tokens(&source);
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        for e in &errors {
            eprintln!("{}", e);
        }
        if !errors.is_empty() {
            process::exit(EXIT_DATA);
        }
        return Ok(());
    }

    let mut tokenized = true;
    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA);
        process::exit(EXIT_DATA);
    }

    Ok(())
}

fn parse(filename: &PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, lex_errors) = scan_tokens(&source);

    for e in &lex_errors {
        eprintln!("{}", e);
    }

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            process::exit(EXIT_DATA);
        }
    }

    if !lex_errors.is_empty() {
        process::exit(EXIT_DATA);
    }

    Ok(())
}

fn run_file(filename: &PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let mut lox = Lox::new();

    if let Err(failure) = lox.run_script(&source) {
        debug!("Run failed: {:?}", failure);
        eprintln!("{}", failure);
        process::exit(failure.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_prompt() -> Result<()> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if let Err(failure) = lox.run_line(&line) {
            eprintln!("{}", failure);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(EXIT_USAGE);
        }
    };

    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename } => parse(filename),
        Commands::Run { filename: Some(filename) } => run_file(filename),
        Commands::Run { filename: None } => run_prompt(),
    }
}
