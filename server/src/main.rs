use anyhow::Result;
use clap::Parser;
use server::build_app;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(about = "Recipe search HTTP API")]
struct Args {
    /// Directory holding index.bin and meta.json
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let app = build_app(&args.index)?;
    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index.display(), "serving recipe search");
    axum::serve(listener, app).await?;
    Ok(())
}
