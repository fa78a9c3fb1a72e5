//! Harbor chart resource - publish Helm charts to a Harbor chart repository

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use harbor_publish::PublishConfig;

mod commands;
mod error;
mod exit_codes;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "harbor-chart-resource")]
#[command(version)]
#[command(about = "Publish Helm charts to a Harbor chart repository", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Helm executable
    #[arg(long, global = true, env = "HARBOR_RESOURCE_HELM", default_value = "helm")]
    helm_bin: String,

    /// GnuPG executable
    #[arg(long, global = true, env = "HARBOR_RESOURCE_GPG", default_value = "gpg")]
    gpg_bin: String,

    /// GnuPG control executable, used to stop the agent of the temporary keyring
    #[arg(long, global = true, env = "HARBOR_RESOURCE_GPGCONF", default_value = "gpgconf")]
    gpgconf_bin: String,

    /// Bound on every subprocess and HTTP request, in seconds
    #[arg(long, global = true, env = "HARBOR_RESOURCE_TIMEOUT", value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Package, sign and upload a chart, then verify it on Harbor
    Out {
        /// Build root that relative paths in params resolve against
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Download a published chart version
    In {
        /// Directory the chart files are written to
        destination: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout is reserved for the response document
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<String> {
    let timeout = cli.timeout.map(Duration::from_secs);
    let stdin = std::io::stdin();

    let response = match cli.command {
        Commands::Out { root } => {
            let config = PublishConfig {
                root: std::path::absolute(&root)?,
                helm_bin: cli.helm_bin,
                gpg_bin: cli.gpg_bin,
                gpgconf_bin: cli.gpgconf_bin,
                timeout,
            };
            commands::out::run(stdin, config).await?
        }
        Commands::In { destination } => {
            commands::fetch::run(stdin, &std::path::absolute(&destination)?, timeout).await?
        }
    };

    serde_json::to_string_pretty(&response).map_err(|e| CliError::internal(e.to_string()))
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(json) => println!("{}", json),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}
