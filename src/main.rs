use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use coastwatch::api::{router, AppState};
use coastwatch::config::Config;
use coastwatch::feed::run_consumer;
use coastwatch::feed::simulate::{run_producer, PostGenerator};
use coastwatch::logging::{log, obj, v_str, Domain, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let state = AppState::from_config(&config)?;

    if config.feed_simulate {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(run_consumer(state.feed.clone(), rx));
        tokio::spawn(run_producer(
            PostGenerator::new(),
            Duration::from_secs(config.feed_interval_secs.max(1)),
            tx,
        ));
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("addr", v_str(&addr)),
            ("db", v_str(&config.sqlite_path)),
            ("simulate", json!(config.feed_simulate)),
        ]),
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log(Level::Error, Domain::System, "signal_error", obj(&[("error", v_str(&err.to_string()))]));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log(Level::Error, Domain::System, "signal_error", obj(&[("error", v_str(&err.to_string()))]));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log(Level::Info, Domain::System, "shutdown_signal", obj(&[]));
}
