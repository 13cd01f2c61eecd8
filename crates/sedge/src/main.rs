use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "sedge")]
#[command(about = "QML code intelligence CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the default lint passes over QML files
    Lint {
        files: Vec<PathBuf>,

        /// Don't fall back to qmlplugindump for unresolved modules
        #[arg(long)]
        no_plugin_dump: bool,
    },

    /// Apply a refactor manifest to QML files
    Refactor {
        /// Manifest in catalogue syntax (@PreferredAlias, @ReplaceUses,
        /// @ReplaceVarWithLetAndConst)
        manifest: PathBuf,

        files: Vec<PathBuf>,

        /// Write the rewritten files back instead of printing them
        #[arg(long)]
        write: bool,
    },

    /// Dump the control-flow graph of every script region as Graphviz dot
    Cfg { file: PathBuf },

    /// List importable modules discovered under the search paths
    Imports,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Lint {
            files,
            no_plugin_dump,
        } => commands::lint::cmd_lint(&files, no_plugin_dump, cli.json),
        Commands::Refactor {
            manifest,
            files,
            write,
        } => commands::refactor::cmd_refactor(&manifest, &files, write),
        Commands::Cfg { file } => commands::cfg::cmd_cfg(&file),
        Commands::Imports => commands::imports::cmd_imports(cli.json),
    };

    std::process::exit(code);
}
