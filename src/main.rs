use anyhow::{bail, Context, Result};
use axum::serve;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use torrentinfo::core::config::Config;
use torrentinfo::core::routes::build_router;
use torrentinfo::core::state::AppState;
use torrentinfo::core::tracing_init::init_tracing;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        fetch_timeout = config.resolver.fetch_timeout,
        max_hops = config.resolver.max_hops,
        proxies = config.fetch.socks5_proxies.len(),
        metadata_source = ?config.fetch.metadata_source,
        log_level = %config.logging.level,
        "Torrent info service starting"
    );

    let state = AppState::new(config.clone()).context("Failed to create application state")?;

    let app = build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let tcp_handle = if let Some(port) = config.server.port {
        let addr = format!("0.0.0.0:{}", port);
        info!(address = %addr, "Starting TCP listener");

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind TCP listener to {}", addr))?;

        let app_clone = app.clone();
        Some(tokio::spawn(async move {
            serve(
                listener,
                app_clone.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
        }))
    } else {
        None
    };

    let unix_handle = if let Some(unix_socket) = &config.server.unix_socket {
        info!(path = %unix_socket.display(), "Starting Unix socket listener");

        if unix_socket.exists() {
            std::fs::remove_file(unix_socket).context(format!(
                "Failed to remove existing Unix socket: {}",
                unix_socket.display()
            ))?;
        }

        let listener = UnixListener::bind(unix_socket).context(format!(
            "Failed to bind Unix socket listener to {}",
            unix_socket.display()
        ))?;

        let mut make_service = app.into_make_service();
        Some(tokio::spawn(async move {
            use tower::Service;

            loop {
                let (socket, _remote_addr) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(error = %e, "Failed to accept Unix socket connection");
                        continue;
                    }
                };

                let tower_service = match make_service.call(&socket).await {
                    Ok(svc) => svc,
                    Err(infallible) => match infallible {},
                };

                tokio::spawn(async move {
                    let socket = hyper_util::rt::TokioIo::new(socket);

                    let hyper_service = hyper::service::service_fn(
                        move |request: hyper::Request<hyper::body::Incoming>| {
                            tower_service.clone().call(request)
                        },
                    );

                    if let Err(err) = hyper_util::server::conn::auto::Builder::new(
                        hyper_util::rt::TokioExecutor::new(),
                    )
                    .serve_connection_with_upgrades(socket, hyper_service)
                    .await
                    {
                        error!(error = %err, "Error serving Unix socket connection");
                    }
                });
            }
        }))
    } else {
        None
    };

    info!("HTTP server(s) started, waiting for shutdown signal");

    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => {
                    if let Err(e) = result {
                        error!(error = %e, "TCP server task failed");
                    }
                }
                result = unix => {
                    if let Err(e) = result {
                        error!(error = %e, "Unix socket server task failed");
                    }
                }
            }
        }
        (Some(tcp), None) => match tcp.await {
            Ok(Err(e)) => error!(error = %e, "TCP server failed"),
            Err(e) => error!(error = %e, "TCP server task failed"),
            Ok(Ok(())) => {}
        },
        (None, Some(unix)) => {
            if let Err(e) = unix.await {
                error!(error = %e, "Unix socket server task failed");
            }
        }
        (None, None) => {
            bail!("No listeners configured");
        }
    }

    info!("Shutting down gracefully");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
