//! Point d'entrée CLI pour tpa-annotator

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Annoter les TPA : pondérations d'experts, export et import GeoJSON
#[derive(Parser)]
#[command(name = "tpa-annotator")]
#[command(author, version)]
#[command(about = "Annotate TPA areas with expert weights and export them as GeoJSON")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Reproject {
            input,
            output,
            from,
            to,
            config,
        } => {
            info!(input = %input.display(), output = %output.display(), "Reprojection");
            cli::cmd_reproject(&input, &output, from, to, &config)?;
        }
        Commands::Inspect { input } => {
            cli::cmd_inspect(&input)?;
        }
        Commands::Annotate(args) => {
            info!(name = %args.name, specialty = %args.specialty, "Annotation session");
            cli::cmd_annotate(args, cli.quiet).await?;
        }
        Commands::Criteria { config } => {
            cli::cmd_criteria(&config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
