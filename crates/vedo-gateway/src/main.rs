use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vedo_config::Config;
use vedo_core::Vedo;
use vedo_gateway::StartupError;
use vedo_gateway::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let path = cli.config.unwrap_or_else(vedo_config::config_path);
    let mut cfg = vedo_config::load_config(Some(&path))?;

    if cli.init_config {
        let template = Config { key: None, ..cfg };
        vedo_config::save_config(&template, &path)?;
        println!("Wrote {}", path.display());
        println!("Set VEDO_KEY in the environment to supply the panel key.");
        return Ok(());
    }

    if let Some(listen) = cli.listen {
        cfg.listen = listen;
    }
    let addr = cfg.listen_addr()?;
    let panel = cfg.to_panel_config()?;

    let vedo = Vedo::new(&panel)?;
    vedo.connect().await?;
    info!(panel = %panel.url, "panel session open");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, "gateway listening");

    let served = axum::serve(listener, vedo_gateway::router(vedo.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    vedo.shutdown().await;
    info!("gateway stopped");
    served.map_err(StartupError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown requested, draining requests");
}
