//! pypi-publisher CLI
//!
//! Builds and checks a Python package, then prints the upload commands

use anyhow::Result;
use clap::Parser;
use pypi_publisher::{ConfigLoader, PackagePublisher, PublishError};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Prepare a Python package for upload to TestPyPI / PyPI
#[derive(Parser)]
#[command(name = "pypi-publisher")]
#[command(version)]
#[command(about = "Prepare a Python package for upload to TestPyPI / PyPI", long_about = None)]
struct Cli {
    /// Project path (defaults to current directory)
    #[arg(value_name = "PROJECT_PATH")]
    project_path: Option<PathBuf>,

    /// Configuration file (defaults to PROJECT_PATH/.publish-config.yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the run report as JSON after the instructions
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pypi_publisher={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(cli: Cli) -> Result<i32> {
    let project_path = cli.project_path.unwrap_or_else(|| PathBuf::from("."));

    let publisher = match ConfigLoader::load(&project_path, cli.config.as_deref()).await {
        Ok(config) => PackagePublisher::new(&project_path, config),
        Err(e) => Err(e),
    };
    let publisher = match publisher {
        Ok(publisher) => publisher,
        Err(e) => return Ok(report_failure(&e)),
    };

    let mut stdout = std::io::stdout();
    match publisher.publish(&mut stdout).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            let exit_code = report.exit_code();
            if exit_code != 0 {
                eprintln!("\n⚠️  Artifact check failed (exit code {})", exit_code);
            }
            Ok(exit_code)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

/// Print the error with its suggested actions and return the exit code
fn report_failure(error: &PublishError) -> i32 {
    eprintln!("\n❌ {}", error);
    for action in error.suggested_actions() {
        eprintln!("  💡 {}", action);
    }
    error.exit_code()
}
