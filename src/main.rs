use clap::Parser;
use local2public::common::config::{apply_overrides, load_config, ConfigOverrides};
use local2public::common::RunError;
use local2public::runtime;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

// Clap reads this struct and creates CLI
#[derive(Parser)]
#[command(name = "local2public")]
#[command(version, about = "Share a local directory through a Cloudflare quick tunnel")]
struct Cli {
    #[arg(help = "Directory to serve (default: toupload)")]
    dir: Option<PathBuf>,

    /// Local port the tunnel forwards to the file server
    #[arg(short, long)]
    port: Option<u16>,

    /// Local port for the tunnel's metrics endpoint
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Where to write the public links
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tunnel binary name or path
    #[arg(long)]
    binary: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            binary: self.binary.clone(),
            tunnel_port: self.port,
            metrics_port: self.metrics_port,
            serve_dir: self.dir.clone(),
            manifest_path: self.output.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// top-level message followed by each source
fn error_chain(err: &RunError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config().and_then(|config| apply_overrides(config, &cli.overrides())) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime::run(config).await {
        match &err {
            RunError::BinaryMissing { .. } | RunError::ResolutionTimeout { .. } => {
                println!("{err}");
            }
            _ => println!("Error: {}", error_chain(&err)),
        }
        std::process::exit(err.exit_code());
    }
}
