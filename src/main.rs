use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use log::info;

use slatekv::{Command, Config, Result, SlateError, TransactionManager};

fn print_usage() {
    println!("Usage: slatekv [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --data-dir <DIR>         Data directory (default: ./slatekv_data)");
    println!("      --flush-threshold <N>    Log entries buffered before flush (default: 4)");
    println!("  -h, --help                   Print help");
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--data-dir" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: {} requires a value", args[i]);
                    process::exit(1);
                }
                config.data_dir = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--flush-threshold" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --flush-threshold requires a value");
                    process::exit(1);
                }
                match args[i + 1].parse::<usize>() {
                    Ok(n) if n > 0 => config.wal.flush_threshold = n,
                    _ => {
                        eprintln!("Error: invalid flush threshold: {}", args[i + 1]);
                        process::exit(1);
                    }
                }
                i += 2;
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Error: unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
    }

    config
}

/// Soft errors print and let the shell keep reading; anything else is
/// an engine failure worth dying for.
fn report(result: Result<()>) -> Result<()> {
    match result {
        Err(SlateError::Transaction(msg)) | Err(SlateError::Command(msg)) => {
            println!("{}", msg);
            Ok(())
        }
        other => other,
    }
}

fn run(config: Config) -> Result<()> {
    let mut db = TransactionManager::open(config)?;
    info!("engine ready, {} active transactions", db.active_count());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Begin { txn_id } => report(db.begin(&txn_id))?,
            Command::Set { txn_id, key, value } => report(db.set(&txn_id, &key, &value))?,
            Command::Get { key } => match db.get(&key) {
                Some(value) => println!("{}", value),
                None => println!("<nil>"),
            },
            Command::Exists { key } => println!("{}", db.exists(&key)),
            Command::Commit { txn_id } => report(db.commit(&txn_id))?,
            Command::Abort { txn_id } => report(db.abort(&txn_id))?,
            Command::Checkpoint => db.checkpoint()?,
            Command::Exit => break,
        }
        stdout.flush()?;
    }

    db.close()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = parse_args();
    if let Err(e) = run(config) {
        eprintln!("Fatal: {}", e);
        process::exit(1);
    }
}
