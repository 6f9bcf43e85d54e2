//! irtcat CLI: simulate, inspect, and drive adaptive-testing sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "irtcat", version, about = "Computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run simulated examinees through adaptive sessions
    Simulate {
        /// Path to .toml item bank or directory
        #[arg(long)]
        bank: PathBuf,

        /// Number of simulated examinees
        #[arg(long, default_value = "100")]
        examinees: usize,

        /// Selection strategy: standard, mission_aligned, goal_aligned,
        /// progressive, fatigue_aware, confidence_aware
        #[arg(long)]
        strategy: Option<String>,

        /// Target bands for mission_aligned (comma-separated)
        #[arg(long)]
        target_bands: Option<String>,

        /// Subjects for goal_aligned (comma-separated)
        #[arg(long)]
        subjects: Option<String>,

        /// Hard cap on session length
        #[arg(long)]
        max_questions: Option<usize>,

        /// Standard error at which a session stops
        #[arg(long)]
        target_se: Option<f64>,

        /// Max concurrent sessions
        #[arg(long)]
        parallelism: Option<usize>,

        /// Base seed for examinees
        #[arg(long)]
        seed: Option<u64>,

        /// Lowest true ability
        #[arg(long, default_value = "-2.0", allow_hyphen_values = true)]
        min_ability: f64,

        /// Highest true ability
        #[arg(long, default_value = "2.0", allow_hyphen_values = true)]
        max_ability: f64,

        /// Multiplier on every item's expected response time
        #[arg(long, allow_hyphen_values = true)]
        pace: Option<f64>,

        /// Extra pace added per answered item
        #[arg(long, allow_hyphen_values = true)]
        fatigue: Option<f64>,

        /// Examinees report a confidence with every answer
        #[arg(long)]
        confidence: bool,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all, none
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Estimate ability and decide whether to stop
    Estimate {
        /// Request JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,

        /// Item bank that supplies the request's items
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Select the next item for a response history
    NextItem {
        /// Request JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,

        /// Item bank that supplies the request's items
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Compute session diagnostics
    Metrics {
        /// Request JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,

        /// Item bank that supplies the request's items
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Output format: table, json
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example item bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("irtcat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            examinees,
            strategy,
            target_bands,
            subjects,
            max_questions,
            target_se,
            parallelism,
            seed,
            min_ability,
            max_ability,
            pace,
            fatigue,
            confidence,
            output,
            format,
            config,
        } => {
            commands::simulate::execute(commands::simulate::SimulateArgs {
                bank,
                examinees,
                strategy: commands::StrategyArgs {
                    name: strategy,
                    target_bands,
                    subjects,
                },
                max_questions,
                target_se,
                parallelism,
                seed,
                ability_range: (min_ability, max_ability),
                pace,
                fatigue,
                confidence,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Estimate { input, bank } => commands::estimate::execute(input, bank),
        Commands::NextItem { input, bank } => commands::next_item::execute(input, bank),
        Commands::Metrics {
            input,
            bank,
            format,
        } => commands::metrics::execute(input, bank, format),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
