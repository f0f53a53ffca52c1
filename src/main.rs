use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::{routing::get, Router};
use crate::config::AppConfig;
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::instrument;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod app_state;
mod config;
mod consts;
mod error;
mod middleware;
mod storage;
#[cfg(test)]
mod test_support;
mod videogen;

use app_state::AppState;

fn build_router(shared_state: Arc<AppState>) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        tags(
            (name = "VideoGen", description = "Reference-image video generation"),
        )
    )]
    struct ApiDoc;

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(videogen::videogen_router(shared_state))
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .route("/healthz", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(
            crate::middleware::http_logging_middleware,
        ))
}

async fn main_impl(conf: AppConfig) -> Result<()> {
    log::info!(
        "delivery mode: {}, api key set: {}, storage configured: {}",
        conf.delivery.mode,
        conf.veo.api_key.is_some(),
        conf.storage.is_complete()
    );

    let bind_address = conf.server.bind_address.clone();
    let shared_state = Arc::new(AppState::new(conf).await);

    let sentry_tower_layer = ServiceBuilder::new()
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::with_transaction());

    let http = build_router(shared_state).layer(sentry_tower_layer);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    log::info!("listening on {bind_address}");

    axum::serve(listener, http)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("server stopped");
    Ok(())
}

fn main() -> Result<()> {
    let conf = AppConfig::load()?;

    let _guard = sentry::init((
        conf.sentry_dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            traces_sample_rate: std::env::var("SENTRY_TRACES_SAMPLE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.5),
            attach_stacktrace: true,
            before_send: Some(crate::middleware::sentry_scrub::create_before_send()),
            ..Default::default()
        },
    ));

    // Only errors become Sentry events, warnings ride along as breadcrumbs
    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,tower_http=warn,axum::rejection=warn,hyper=warn,reqwest=warn",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(main_impl(conf))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received");
}

#[instrument]
async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeGenerator;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::with_clients(
            AppConfig::default(),
            Arc::new(FakeGenerator::completing_after(1)),
            None,
        );
        build_router(Arc::new(state))
    }

    #[tokio::test]
    async fn test_healthz() {
        let res = app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_openapi_documents_both_routes() {
        let res = app()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/generate-video"]["post"].is_object());
        assert!(doc["paths"]["/get-videos"]["get"].is_object());
    }
}
