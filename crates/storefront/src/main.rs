//! Printloom storefront server.
//!
//! Serves [`routes::app`] on the configured address. The schema is managed
//! with `pl-cli migrate` and is never touched at startup.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::net::SocketAddr;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use printloom_storefront::config::StorefrontConfig;
use printloom_storefront::state::AppState;
use printloom_storefront::{db, routes};

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("invalid storefront configuration");

    // Sentry before the subscriber, so its tracing layer has a client.
    let _sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    });
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("printloom_storefront=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("cannot reach the database");
    let addr = config.socket_addr();
    let app = routes::app(AppState::new(config, pool));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("cannot bind the storefront address");
    tracing::info!(%addr, "storefront listening");

    // Connect info backs the rate limiter when no forwarding header is sent.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
        }
        tracing::info!("shutting down");
    })
    .await
    .expect("server error");
}
