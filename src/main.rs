//! # Arshidni CLI (`arshidni`)
//!
//! ## Usage
//!
//! ```bash
//! arshidni --config ./config/arshidni.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `arshidni init` | Create the SQLite database and catalog tables |
//! | `arshidni import <file>` | Load a catalog TOML file into the database |
//! | `arshidni ask "<query>"` | Answer one question |
//! | `arshidni context "<query>"` | Show the retrieval for a question, no generation |
//! | `arshidni classify "<query>"` | Label a question as service query or general chat |
//! | `arshidni chat` | Line-oriented console session |
//! | `arshidni serve` | Start the HTTP server |
//! | `arshidni completions <shell>` | Print shell completions |

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use arshidni::{ask, config, import, migrate, server};

/// Arshidni — a retrieval-grounded guide to government services.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/arshidni.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "arshidni",
    about = "Arshidni — a retrieval-grounded guide to government services and journeys",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/arshidni.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Import a catalog file (entities, services, journeys, steps, requirements).
    ///
    /// Records are upserted by id, so re-importing a file is safe.
    Import {
        /// Path to the catalog TOML file.
        path: PathBuf,
    },

    /// Answer a single question.
    Ask {
        /// The question, in free text.
        query: String,
    },

    /// Show the term, target, mode and context for a question without
    /// calling the generation service.
    Context {
        /// The question, in free text.
        query: String,

        /// Print the retrieval as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Classify a question as SERVICE_QUERY or GENERAL_CHAT.
    Classify {
        /// The question, in free text.
        query: String,
    },

    /// Start an interactive console session.
    ///
    /// Type `خروج`, `إنهاء` or `exit` to leave.
    Chat,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Print shell completions to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: u8, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "arshidni=warn,arshidni_core=warn",
        1 => "arshidni=debug,arshidni_core=debug",
        _ => "arshidni=trace,arshidni_core=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "arshidni", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path } => {
            import::run_import(&cfg, &path).await?;
        }
        Commands::Ask { query } => {
            ask::run_ask(&cfg, &query).await?;
        }
        Commands::Context { query, json } => {
            ask::run_context(&cfg, &query, json).await?;
        }
        Commands::Classify { query } => {
            ask::run_classify(&cfg, &query).await?;
        }
        Commands::Chat => {
            ask::run_chat(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
