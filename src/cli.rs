// src/cli.rs
//! CLI definitions for polyimport
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polyimport")]
#[command(version)]
#[command(about = "Import Codeforces Polygon problem packages into ejudge contests", long_about = None)]
pub struct Cli {
    /// Root directory holding the ejudge contest directories
    #[arg(long, default_value = crate::config::contest::DEFAULT_EJUDGE_CONTESTS_ROOT)]
    pub contests_root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a single problem
    Ip {
        /// Destination ejudge contest id
        contest_id: u32,

        /// Polygon id of the problem to download
        #[arg(short = 'p', long = "problem-id")]
        problem_id: Option<u32>,

        /// Path to a full package zip instead of downloading
        #[arg(short = 's', long = "src-path")]
        src_path: Option<PathBuf>,

        /// Short name for the problem (allocated when absent or taken)
        #[arg(long = "short")]
        short_name: Option<String>,

        /// Destination ejudge problem id (next free when absent)
        #[arg(long = "ej-id")]
        ejudge_problem_id: Option<i64>,

        /// Ignore offline scoring groups in the valuer
        #[arg(short = 'n', long = "no-offline")]
        no_offline: bool,

        /// Submit the imported solutions to the judge afterwards
        #[arg(long)]
        submit: bool,

        /// Tag submitted C++ sources to suppress the judge linter
        #[arg(long = "no-lint")]
        no_lint: bool,
    },

    /// Import a whole contest
    Ic {
        /// Destination ejudge contest id
        ejudge_id: u32,

        /// Polygon contest id to download packages from
        #[arg(short = 'p', long = "polygon-id")]
        polygon_id: Option<u32>,

        /// Path to a contest descriptor (contest.xml)
        #[arg(short = 'd', long)]
        descriptor: Option<PathBuf>,

        /// Directory with full package zips named after their problems
        #[arg(short = 's', long = "src-dir")]
        src_dir: Option<PathBuf>,

        /// Ignore offline scoring groups in the valuer
        #[arg(short = 'n', long = "no-offline")]
        no_offline: bool,
    },

    /// Clear cached Polygon and ejudge credentials
    Logout,
}
