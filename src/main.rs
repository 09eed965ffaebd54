use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use haw_script::ast_printer::AstPrinter;
use haw_script::parser::Parser;
use haw_script::scanner::Scanner;
use haw_script::token_buffer::TokenBuffer;

/// Exit status for malformed scripts.
const EXIT_SCRIPT_ERROR: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Haw script front end", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to haw.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Splits a script into statements, printing each statement's tokens
    Tokenize { filename: Option<PathBuf> },

    /// Parses a script and prints its syntax tree
    Parse {
        filename: Option<PathBuf>,

        /// Print the tree as JSON instead of prefix form
        #[arg(long)]
        json: bool,
    },
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("haw.log").context("Failed to create haw.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("haw_script::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to haw.log");
    Ok(())
}

fn fail(e: impl std::fmt::Display) -> ! {
    debug!("Exiting with code {}: {}", EXIT_SCRIPT_ERROR, e);
    eprintln!("{}", e);
    std::process::exit(EXIT_SCRIPT_ERROR);
}

fn tokenize(filename: PathBuf) -> Result<()> {
    let buf = read_file(filename)?;
    let mut scanner = Scanner::from_bytes(buf).unwrap_or_else(|e| fail(e));
    let mut tokens = TokenBuffer::new();
    let mut statements: usize = 0;

    loop {
        match scanner.get_statement(&mut tokens) {
            Ok(0) => break,
            Ok(count) => {
                statements += 1;
                debug!("Statement {} has {} token(s)", statements, count);

                for token in tokens.tokens() {
                    println!(
                        "{} {} {}",
                        token.token_type(),
                        tokens.str(token),
                        token.line()
                    );
                }
                println!("EOS");
            }
            Err(e) => fail(e),
        }
    }

    info!("Tokenized {} statement(s)", statements);
    Ok(())
}

fn parse(filename: PathBuf, json: bool) -> Result<()> {
    let buf = read_file(filename)?;
    let source = String::from_utf8(buf).unwrap_or_else(|e| fail(e));
    let mut parser = Parser::new();

    match parser.parse(&source) {
        Ok(script) => {
            info!("Script parsed successfully");

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&script).context("Failed to serialize tree")?
                );
            } else {
                print!("{}", AstPrinter::print_compound(&script));
            }
        }

        Err(e) => fail(e),
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let filename = match &args.commands {
        Commands::Tokenize { filename } | Commands::Parse { filename, .. } => filename.clone(),
    };

    let Some(filename) = filename else {
        info!("No filepath provided");
        println!("No input filepath was provided. Exiting...");
        std::process::exit(0);
    };

    match args.commands {
        Commands::Tokenize { .. } => {
            info!("Running Tokenize subcommand");
            tokenize(filename)?;
        }

        Commands::Parse { json, .. } => {
            info!("Running Parse subcommand");
            parse(filename, json)?;
        }
    }

    Ok(())
}
