// GNSS bridge daemon: peer link supervisor, command loop, event feed.

mod config;
mod download;
mod feed;
mod link;
mod supervisor;

use std::sync::Arc;

use gnss_core::Status;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("gnss-bridge {}", VERSION);
            return Ok(());
        }
    }

    init_tracing();
    let cfg = config::load();
    debug!(socket = %cfg.socket_path.display(), data_dir = %cfg.data_dir.display(), "loaded config");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if let Err(e) = tokio::fs::create_dir_all(&cfg.data_dir).await {
            warn!(error = %e, dir = %cfg.data_dir.display(), "could not create data directory");
        }

        let link = Arc::new(link::Link::new());
        let status = Arc::new(tokio::sync::Mutex::new(Status::new(link.clone())));
        let supervisor = Arc::new(supervisor::Supervisor::new(
            link.clone(),
            status.clone(),
            &cfg,
        ));

        let initial = supervisor.clone();
        tokio::spawn(async move {
            initial.run().await;
        });

        let event_feed = feed::EventFeed::new(status, supervisor);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        tokio::spawn(event_feed.run(stdin));

        shutdown_signal().await?;
        link.close();
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Wait for Ctrl+C or SIGTERM (Unix). On shutdown, runtime and tasks exit; systemd may restart if configured.
async fn shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
