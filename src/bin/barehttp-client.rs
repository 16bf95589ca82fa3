use barehttp::config::ClientConfig;
use barehttp::http::client;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "barehttp-client")]
#[command(about = "Sends one pared down HTTP/1.1 request and prints the response", long_about = None)]
struct Cli {
    /// IP address or name of the host
    host: String,

    /// Port number of the host
    port: u16,

    /// Http method (GET/POST)
    method: String,

    /// File name to be requested or to be sent
    filename: String,

    /// Directory POST uploads are read from
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// Give up waiting for the response after this many seconds
    #[arg(long)]
    read_timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barehttp=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.host, cli.port);
    config.work_dir = cli.work_dir;
    config.read_timeout = cli.read_timeout_secs.map(Duration::from_secs);

    match client::run(&config, &cli.method, &cli.filename, io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
