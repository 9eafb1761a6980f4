use std::{net::SocketAddr, sync::Arc};

use tokio::signal;
use tracing::{error, info};
use tunelink::{
    common::{self, types::AnyResult},
    configs::Config,
    engine::StreamingEngineFactory,
    pins::PinStore,
    player::{ManagerDeps, PlayerManager},
    presenter::EventPresenter,
    render::TextCardRenderer,
    server::AppState,
    sources::{JioSaavnSource, SourceManager},
    transport,
    voice::UdpConnector,
};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    common::logger::init(config.logging.as_ref());

    let catalog = Arc::new(JioSaavnSource::new(&config.catalog)?);
    let sources = Arc::new(SourceManager::new(
        catalog,
        config.catalog.preferred_quality.clone(),
    ));

    let pins = Arc::new(PinStore::from_config(&config.pins));
    info!(
        "{} pinned guilds on record in {}",
        pins.load().await.len(),
        pins.path().display()
    );

    let events = Arc::new(EventPresenter::new());
    let (players, engine_events) = PlayerManager::new(
        ManagerDeps {
            connector: Arc::new(UdpConnector::from_config(&config.voice)),
            engines: Arc::new(StreamingEngineFactory::new(config.voice.frame_duration_ms)?),
            presenter: events.clone(),
            renderer: Arc::new(TextCardRenderer::default()),
            pins,
        },
        config.player.clone(),
        config.voice.join_timeout(),
    );
    players.run_events(engine_events);

    let restoring = players.clone();
    tokio::spawn(async move {
        restoring.restore().await;
    });

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState {
        players,
        sources,
        events,
        config,
    });

    let app = transport::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Tunelink listening on {}", address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
