use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ini::{Error, Ini};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ini", version, about = "Inspect and edit INI files")]
struct Args {
    /// Log parser activity to stderr (overrides `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the files in order and print the result.
    Show {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the names of all sections, one per line.
    Sections { file: PathBuf },
    /// Print a single value; exits with status 1 when it is missing.
    Get {
        file: PathBuf,
        section: String,
        key: String,
    },
    /// Set a value and print the updated file.
    Set {
        file: PathBuf,
        section: String,
        key: String,
        value: String,
        /// Write the result back to the file instead of printing it.
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<ExitCode, Error> {
    match command {
        Command::Show { files } => {
            let mut ini = Ini::new();
            for file in &files {
                ini.merge_from_file(file)?;
            }
            print!("{ini}");
        }
        Command::Sections { file } => {
            let ini = Ini::from_file(&file)?;
            for name in ini.section_names() {
                println!("{name}");
            }
        }
        Command::Get { file, section, key } => {
            let ini = Ini::from_file(&file)?;
            let Some(value) = ini.get(&section, &key) else {
                error!(section = %section, key = %key, "no such key");
                return Ok(ExitCode::FAILURE);
            };
            println!("{value}");
        }
        Command::Set {
            file,
            section,
            key,
            value,
            write,
        } => {
            let mut ini = Ini::from_file(&file)?;
            ini.set(&section, key, value);

            if write {
                ini.write_to_file(&file)?;
            } else {
                print!("{ini}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report(err: &Error) {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        // Parse errors already render their cause inline.
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }

    eprintln!("error: {message}");
}
