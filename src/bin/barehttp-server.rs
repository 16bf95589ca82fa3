use barehttp::config::{port_or_default, ServerConfig};
use barehttp::net::Server;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "barehttp-server")]
#[command(about = "Multithreaded file server speaking a pared down HTTP/1.1", long_about = None)]
struct Cli {
    /// Port to listen on (invalid values fall back to 5000)
    port: Option<String>,

    /// Directory served by GET and written by POST
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Document served when a request targets "/"
    #[arg(short, long, default_value = barehttp::http::DEFAULT_DOCUMENT)]
    default_document: String,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Give up on a silent client after this many seconds
    #[arg(long)]
    read_timeout_secs: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barehttp=info,barehttp_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ServerConfig {
        bind_address: cli.bind,
        port: port_or_default(cli.port.as_deref()),
        root: cli.root,
        default_document: cli.default_document,
        read_timeout: cli.read_timeout_secs.map(Duration::from_secs),
    };

    let server = Server::bind(config)?;
    server.run()?;

    Ok(())
}
