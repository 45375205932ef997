//! modlint CLI - lint Helm module templates against their values schema

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;

use commands::{RenderArgs, SynthesisArgs};

#[derive(Parser)]
#[command(name = "modlint")]
#[command(version)]
#[command(about = "Lint Helm module templates against every values branch of their OpenAPI schema", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render module templates with every synthesized values document
    Lint {
        /// Module path
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        synthesis: SynthesisArgs,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the synthesized values documents
    Values {
        /// Module path
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        synthesis: SynthesisArgs,

        /// Output a JSON array instead of a YAML stream
        #[arg(long)]
        json: bool,
    },

    /// Print the effective values schema after transforms
    Schema {
        /// Module path
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Lint {
            path,
            synthesis,
            render,
        } => commands::lint::run(&path, &synthesis, &render),

        Commands::Values {
            path,
            synthesis,
            json,
        } => commands::values::run(&path, &synthesis, json),

        Commands::Schema { path } => commands::schema::run(&path),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
