//! tagtune - command-line entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tagtune::config::TuningConfig;
use tagtune::tuner::TuneSession;

#[derive(Parser)]
#[command(name = "tagtune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-validated hyperparameter tuning for complementary taggers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune hyperparameters by cross-validation and write the report
    Tune {
        /// Properties file with option overrides (name = value lines)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Evaluate the final models on the test corpus as well
        #[arg(long)]
        eval_on_test: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagtune=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tune {
            config,
            folds,
            eval_on_test,
        } => {
            let mut config = match config {
                Some(path) => TuningConfig::from_properties_file(path)?,
                None => TuningConfig::default(),
            };
            if let Some(k) = folds {
                config = config.with_folds(k);
            }
            if eval_on_test {
                config = config.with_evaluate_on_test(true);
            }
            let outcome = TuneSession::new(config)?.run()?;
            println!(
                "known: [{}] over {} rounds (metric {:.5})",
                outcome.known.params, outcome.known.rounds, outcome.known.metric
            );
            println!(
                "unknown: [{}] over {} rounds (metric {:.5})",
                outcome.unknown.params, outcome.unknown.rounds, outcome.unknown.metric
            );
        }
    }

    Ok(())
}
