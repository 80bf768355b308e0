//! `elyria-cp` entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Dispatch the subcommand and exit with its code

use clap::Parser;
use tracing::info;

use elyria_cp::bootstrap::logger;
use elyria_cp::cli::Cli;
use elyria_cp::commands::{self, Context};
use elyria_cp::config;
use elyria_cp::error::AppError;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    };
    // Exit explicitly: a pending stdin read in `session` would otherwise
    // hold the runtime open after Ctrl-C.
    std::process::exit(code);
}

async fn run() -> Result<i32, AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let cli_level = logger::verbosity_level(cli.verbose);
    let effective_log_level = cli_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, cli_level.is_some())?;

    info!(
        work_dir = %config.work_dir.display(),
        store = %config.store.path.display(),
        entropy_max = config.control.entropy_max,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let ctx = Context::new(config);
    let mut stdout = std::io::stdout().lock();
    commands::dispatch(cli.command, &ctx, &mut stdout).await
}
