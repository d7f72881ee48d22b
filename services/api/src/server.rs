use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_eligibility::config::{parse_endpoint, AppConfig};
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{HttpPredictionTransport, PredictionOrchestrator};
use loan_eligibility::telemetry;
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
    if let Some(endpoint) = args.endpoint.take() {
        config.predictor.endpoint = parse_endpoint(&endpoint)?;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let transport =
        HttpPredictionTransport::new(config.predictor.endpoint.clone(), config.predictor.timeout)?;
    let orchestrator = Arc::new(PredictionOrchestrator::new(
        transport,
        config.predictor.credit_history,
    ));

    let app = with_prediction_routes(orchestrator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        endpoint = %config.predictor.endpoint,
        credit_history = %config.predictor.credit_history,
        "loan eligibility service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
