use clap::{Args, Parser, Subcommand};
use fanin::cli::run::RunOverrides;
use fanin::config::resolve_config_path;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fanin")]
#[command(about = "Bounded fan-in pipeline over a shared channel", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fan-in pipeline and print every value
    Run(RunArgs),
    /// Increment a shared counter from many tasks and print the total
    Count {
        #[arg(long)]
        tasks: Option<usize>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Number of concurrent producers
    #[arg(long)]
    producers: Option<usize>,
    /// Values emitted per producer
    #[arg(long)]
    items: Option<usize>,
    /// Shared channel capacity
    #[arg(long)]
    capacity: Option<usize>,
}

impl From<RunArgs> for RunOverrides {
    fn from(args: RunArgs) -> Self {
        Self {
            producers: args.producers,
            items: args.items,
            capacity: args.capacity,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the values.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fanin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run(args)) => {
            fanin::cli::run::run(config_path, args.into()).await?;
        }
        None => {
            // Default behavior is to run
            fanin::cli::run::run(config_path, RunOverrides::default()).await?;
        }
        Some(Commands::Count { tasks }) => {
            fanin::cli::run::count(config_path, tasks).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                fanin::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                fanin::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
