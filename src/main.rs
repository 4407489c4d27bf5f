//!
//! clapperboard console
//! --------------------
//! Interactive shell over the production dashboard's session store and role
//! table. Sign in, browse the sections your role allows, and inspect the matrix.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use clapperboard::cli::{parse_command, Command, Console};
use clapperboard::config::AppConfig;
use clapperboard::identity::{SessionOptions, SessionStore};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--data <dir>] [--memory] [--config <file>]\n\nFlags:\n  --data <dir>      Directory for the file-backed store (default: data)\n  --memory          Keep accounts and the session in memory only\n  --config <file>   JSON settings file\n  -h, --help        Show this help\n\nEnvironment:\n  CLAPPERBOARD_DATA_DIR, CLAPPERBOARD_PASSWORD_SCHEME, CLAPPERBOARD_SEED_DEMO,\n  CLAPPERBOARD_PERMISSIONS_FILE, CLAPPERBOARD_LOG, RUST_LOG\n\nType 'help' at the prompt for console commands."
    );
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let mut data_dir: Option<PathBuf> = None;
    let mut memory = false;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--data" => {
                if i + 1 >= args.len() { eprintln!("--data requires a value"); print_usage(&program); std::process::exit(2); }
                data_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--config" => {
                if i + 1 >= args.len() { eprintln!("--config requires a value"); print_usage(&program); std::process::exit(2); }
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--memory" => { memory = true; i += 1; }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => {
                eprintln!("unknown argument: {}", other);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let mut cfg = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = data_dir { cfg.data_dir = Some(dir); }
    if memory { cfg.data_dir = None; }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "clapperboard",
        "clapperboard starting: RUST_LOG='{}', data_dir={:?}, password_scheme={:?}",
        rust_log, cfg.data_dir, cfg.password_scheme
    );

    let table = cfg.permission_table()?;
    let kv = cfg.open_store()?;
    let mut session = SessionStore::new(kv, SessionOptions::from(&cfg));
    run_repl(&mut session, &table)
}

fn run_repl(session: &mut SessionStore, table: &clapperboard::security::PermissionTable) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to start line editor")?;
    let mut console = Console::new(session, table);
    println!("clapperboard console. Type 'help' for commands.");
    loop {
        let line = match rl.readline(&console.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() { continue; }
        let cmd = match parse_command(line) {
            Ok(cmd) => cmd,
            Err(msg) => { eprintln!("{}", msg); continue; }
        };
        // keep passwords out of history
        if !matches!(cmd, Command::Login { .. } | Command::Signup { .. }) {
            let _ = rl.add_history_entry(line);
        }
        if cmd == Command::Quit { break; }
        for out in console.execute(cmd) {
            println!("{}", out);
        }
    }
    Ok(())
}
