use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use utforsk_waitlist::config::AppConfig;
use utforsk_waitlist::error::AppError;
use utforsk_waitlist::telemetry;
use utforsk_waitlist::waitlist::{gateway_from_config, SessionRegistry};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let gateway = gateway_from_config(&config.waitlist)?;
    let gateway_kind = gateway.kind();
    let sessions = Arc::new(
        SessionRegistry::new(gateway, config.waitlist.session_ttl)
            .with_max_sessions(config.waitlist.max_sessions),
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        gateway: gateway_kind,
    };

    let app = with_service_routes(sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        gateway = gateway_kind.label(),
        "utforsk waitlist ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
