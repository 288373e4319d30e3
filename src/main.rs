use anyhow::Context;
use clap::Parser;
use std::process;
use todo::cli::{Cli, Commands};
use todo::cli_handlers;
use todo::config::DbPath;
use todo::db::Database;
use todo::error::TodoError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so list output stays clean
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let path = DbPath::resolve(cli.db)?;

    match cli.command {
        Commands::Path => cli_handlers::handle_path(&path),
        command => {
            let db = Database::open(path.as_path()).with_context(|| {
                format!("failed to open task store at {}", path.as_path().display())
            })?;
            dispatch(&db, &path, command)?;
            db.close()?;
        }
    }
    Ok(())
}

fn dispatch(db: &Database, path: &DbPath, command: Commands) -> Result<(), TodoError> {
    match command {
        Commands::List { filter, json } => cli_handlers::handle_list(db, filter, json),
        Commands::Add { title } => cli_handlers::handle_add(db, &title),
        Commands::Edit { id, title } => cli_handlers::handle_edit(db, &id, &title),
        Commands::Toggle { id } => cli_handlers::handle_toggle(db, &id),
        Commands::Delete { id } => cli_handlers::handle_delete(db, &id),
        Commands::Path => {
            cli_handlers::handle_path(path);
            Ok(())
        }
    }
}
