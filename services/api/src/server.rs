use crate::cli::ServeArgs;
use crate::infra::{build_engine, session_config, AppState};
use crate::routes::with_trial_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fate_trials::config::AppConfig;
use fate_trials::error::AppError;
use fate_trials::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let manager = build_engine(session_config(&config.trials), None)?;
    manager.spawn_sweeper();

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        sessions: manager.clone(),
    };

    let app = with_trial_routes(manager.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fate trials service ready");

    let served = axum::serve(listener, app).await;
    manager.dispose();
    served?;
    Ok(())
}
