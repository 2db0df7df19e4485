// src/main.rs

use anyhow::Result;
use clap::Parser;
use polyimport::cli::{Cli, Commands};
use polyimport::commands;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ip {
            contest_id,
            problem_id,
            src_path,
            short_name,
            ejudge_problem_id,
            no_offline,
            submit,
            no_lint,
        } => commands::cmd_import_problem(
            &cli.contests_root,
            contest_id,
            problem_id,
            src_path,
            short_name,
            ejudge_problem_id,
            no_offline,
            submit,
            no_lint,
        )?,
        Commands::Ic {
            ejudge_id,
            polygon_id,
            descriptor,
            src_dir,
            no_offline,
        } => commands::cmd_import_contest(
            &cli.contests_root,
            ejudge_id,
            polygon_id,
            descriptor,
            src_dir,
            no_offline,
        )?,
        Commands::Logout => commands::cmd_logout()?,
    }
    Ok(())
}
