use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use convo_relay::api::{ApiState, relay_routes};
use convo_relay::config::RelayConfig;
use convo_relay::tasks::Controller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export RELAY_ENDPOINT_TEMPLATE=https://chat.example.com/api/conversations/{{target}}/messages");
        std::process::exit(1);
    });

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("📨 Convo Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}:{}/api/tasks", config.bind, config.port);
    eprintln!("   Endpoint: {}", config.endpoint_template);
    eprintln!(
        "   Tick: {:?}, log capacity: {}",
        config.worker.tick, config.worker.log_capacity
    );

    let controller =
        Arc::new(Controller::from_config(&config).context("failed to build task controller")?);

    let app = relay_routes(ApiState {
        controller: Arc::clone(&controller),
        default_interval_secs: config.default_interval_secs,
    });

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Relay API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let stopped = controller.stop_all().await;
    // Give workers one tick to run their finalizers.
    tokio::time::sleep(config.worker.tick).await;
    tracing::info!(stopped, "Relay shut down");

    Ok(())
}

fn init_tracing(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "convo-relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
