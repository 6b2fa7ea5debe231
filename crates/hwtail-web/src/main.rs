mod access_log;
mod handlers;
mod openapi;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use hwtail_core::collector::hardware::{GENERIC_CPU, GENERIC_GPU};
use hwtail_core::collector::{FixedProbe, HardwareInfo, HardwareProbe, Monitor, RealFs, SystemProbe};
use hwtail_core::config::{DEFAULT_EXTENSION, DEFAULT_LOG_DIR};
use hwtail_core::{LogSource, MonitorConfig, SnapshotStore};

use access_log::AccessLogLayer;
use openapi::ApiDoc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(name = "hwtail-web", about = "hwtail web API server", version = hwtail_core::VERSION)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8000", env = "HWTAIL_LISTEN")]
    listen: String,

    /// Directory searched for the newest log file.
    #[arg(long, default_value = DEFAULT_LOG_DIR, env = "HWTAIL_LOG_DIR")]
    log_dir: PathBuf,

    /// Fixed log file. Takes precedence over --log-dir.
    #[arg(long, env = "HWTAIL_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Extension of log files in --log-dir (case-insensitive).
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Delay between tail ticks in milliseconds.
    #[arg(long, default_value = "1500", env = "HWTAIL_INTERVAL_MS")]
    interval_ms: u64,

    /// Bytes read from the end of the log on every tick.
    #[arg(long, default_value = "4096")]
    tail_window: u64,

    /// CPU name shown instead of the detected one.
    #[arg(long)]
    cpu_name: Option<String>,

    /// GPU name shown instead of the detected one.
    #[arg(long)]
    gpu_name: Option<String>,

    /// Skip hardware name detection.
    #[arg(long)]
    no_detect: bool,
}

impl Args {
    fn monitor_config(&self) -> MonitorConfig {
        let source = match &self.log_file {
            Some(path) => LogSource::File(path.clone()),
            None => LogSource::Directory {
                dir: self.log_dir.clone(),
                extension: self.extension.clone(),
            },
        };
        MonitorConfig::new(source)
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_tail_window(self.tail_window)
    }

    fn hardware_probe(&self) -> Box<dyn HardwareProbe> {
        if self.no_detect || (self.cpu_name.is_some() && self.gpu_name.is_some()) {
            Box::new(FixedProbe(HardwareInfo {
                cpu_name: self.cpu_name.clone().unwrap_or_else(|| GENERIC_CPU.into()),
                gpu_name: self.gpu_name.clone().unwrap_or_else(|| GENERIC_GPU.into()),
            }))
        } else {
            Box::new(SystemProbe)
        }
    }
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("hwtail_web=info,hwtail_core=info")
            }),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let config = args.monitor_config();
    info!(
        version = hwtail_core::VERSION,
        source = %config.source.location().display(),
        interval_ms = config.interval.as_millis() as u64,
        "starting"
    );

    let store = SnapshotStore::new();

    // Name detection may shell out and take seconds; it never delays the monitor.
    let probe = args.hardware_probe();
    let (cpu_override, gpu_override) = (args.cpu_name.clone(), args.gpu_name.clone());
    {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            let mut info = probe.detect();
            if let Some(cpu) = cpu_override {
                info.cpu_name = cpu;
            }
            if let Some(gpu) = gpu_override {
                info.gpu_name = gpu;
            }
            info!(cpu = %info.cpu_name, gpu = %info.gpu_name, "hardware names");
            store.set_hardware(&info);
        });
    }

    let monitor = match Monitor::new(RealFs::new(), config, store.clone()).spawn() {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "failed to start monitor thread");
            process::exit(1);
        }
    };

    let app = router(store).into_make_service_with_connect_info::<SocketAddr>();

    info!(%addr, "listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
    }

    info!("shutting down");
    if tokio::task::spawn_blocking(move || monitor.shutdown())
        .await
        .is_err()
    {
        warn!("monitor shutdown task failed");
    }
    info!("shutdown complete");
}

fn router(store: SnapshotStore) -> Router {
    Router::new()
        .route("/stats", get(handlers::handle_stats))
        .route("/api/v1/health", get(handlers::handle_health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(get(handlers::serve_frontend))
        .with_state(store)
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn routes() {
        let store = SnapshotStore::new();

        let (status, body) = fetch(router(store.clone()), "/stats").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["raw"]["status"], "starting");

        let (status, body) = fetch(router(store.clone()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["monitor"], "starting");

        let (status, body) = fetch(router(store.clone()), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"]["/stats"].is_object());

        let (status, _) = fetch(router(store), "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn log_file_wins_over_directory() {
        let args = Args::parse_from(["hwtail-web", "--log-dir", "logs", "--log-file", "a.csv"]);
        assert_eq!(args.monitor_config().source, LogSource::File("a.csv".into()));

        let args = Args::parse_from(["hwtail-web", "--extension", "log", "--interval-ms", "250"]);
        let config = args.monitor_config();
        assert_eq!(
            config.source,
            LogSource::Directory {
                dir: PathBuf::from("log-here"),
                extension: "log".into()
            }
        );
        assert_eq!(config.interval, Duration::from_millis(250));
    }

    #[test]
    fn fixed_names_skip_detection() {
        let args = Args::parse_from(["hwtail-web", "--no-detect", "--cpu-name", "Ryzen 7"]);
        let info = args.hardware_probe().detect();
        assert_eq!(info.cpu_name, "Ryzen 7");
        assert_eq!(info.gpu_name, "Generic GPU");
    }
}
