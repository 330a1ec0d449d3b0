use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use temu_server::{build_app_with_state, index_status};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "temu-server")]
#[command(about = "Serve search queries over a persisted temu index", long_about = None)]
struct Args {
    /// Directory written by `temu build`
    #[arg(long, default_value = "./indexdir")]
    index: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Token required in X-ADMIN-TOKEN for POST /index/reload; reload is disabled when unset
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let reload_enabled = args.admin_token.is_some();
    let (app, state) = build_app_with_state(args.index.clone(), args.admin_token)?;

    match index_status(&state) {
        Some(num_docs) => tracing::info!(index = %args.index, num_docs, reload_enabled, "serving index"),
        None => tracing::warn!(
            index = %args.index,
            reload_enabled,
            "no index loaded; /search answers 503 until `temu build` runs and /index/reload is called"
        ),
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
