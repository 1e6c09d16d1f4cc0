mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, SelectionArgs};
use pipegen_core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pipegen",
    about = "Generate and iteratively refine CI/CD pipeline files with an LLM",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./pipegen.yaml if present)
    #[arg(long, global = true, env = "PIPEGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selectable CI tools, languages, build tools and targets
    Options,

    /// Generate a new pipeline
    Generate {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Directory to write pipeline<ext> into
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Refine an existing pipeline file with feedback
    Refine {
        /// CI tool the pipeline targets
        #[arg(long)]
        ci_tool: pipegen_core::types::CiTool,

        /// Pipeline file to refine
        #[arg(long)]
        input: PathBuf,

        /// What to change
        #[arg(long)]
        feedback: String,

        /// Directory to write pipeline<ext> into
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate a pipeline, then refine it with feedback read from stdin
    Interactive {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Directory `/save` writes into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long, env = "PIPEGEN_PORT")]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match &cli.command {
        // Neither reads configuration; `config init` may be creating the file.
        Commands::Options
        | Commands::Config {
            subcommand: ConfigSubcommand::Init { .. },
        } => Config::default(),
        _ => Config::load(cli.config.as_deref(), &cwd).context("failed to load configuration")?,
    };
    let json = cli.json;

    match cli.command {
        Commands::Options => cmd::options::run(json),
        Commands::Config { subcommand } => {
            cmd::config::run(&config, cli.config.as_deref(), &cwd, subcommand, json)
        }
        // Everything below talks to the backend, so the credential is checked
        // before any work starts.
        Commands::Generate { selection, out } => {
            let backend = cmd::connect(&config)?;
            cmd::generate::run(&config, backend, selection.into(), out.as_deref(), json)
        }
        Commands::Refine {
            ci_tool,
            input,
            feedback,
            out,
        } => {
            let backend = cmd::connect(&config)?;
            cmd::refine::run(
                &config,
                backend,
                cmd::refine::RefineArgs {
                    ci_tool,
                    input,
                    feedback,
                    out,
                },
                json,
            )
        }
        Commands::Interactive { selection, out } => {
            let backend = cmd::connect(&config)?;
            cmd::interactive::run(&config, backend, selection.into(), &out)
        }
        Commands::Serve { port, bind } => {
            let backend = cmd::connect(&config)?;
            cmd::serve::run(&config, backend, &bind, port)
        }
    }
}
