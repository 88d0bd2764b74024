use crate::cli::{DatasetArgs, ServeArgs};
use crate::infra::{load_config, AppState, EngineState};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use movie_expert::error::AppError;
use movie_expert::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(dataset: DatasetArgs, mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = load_config(&dataset)?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let engine = EngineState::load(&config.dataset);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = router(engine.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Only a loaded dataset makes the service ready; errors are still served.
    readiness_flag.store(engine.is_ready(), Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.dataset.data_dir.display(),
        ready = engine.is_ready(),
        "movie expert listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
