use tokio::signal::unix::{self, SignalKind};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use pi_minion::api::{self, AppState};
use pi_minion::capability::Capabilities;
use pi_minion::config::Config;
use pi_minion::service::Service;
use pi_minion::tracing::{self, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::init_journald_or_stdout(tracing::parse_level(&config.daemon.log_level));

    let mut caps = Capabilities::detect(&config);
    let service = Service::for_host(&config, &mut caps);
    let state = AppState::new(service, caps, config.i2c.default_address);

    let running = CancellationToken::new();
    let tracker = TaskTracker::new();
    {
        let listen = config.api.listen.clone();
        let running = running.clone();
        tracker.spawn(async move {
            if let Err(e) = api::serve(&listen, state, running.clone()).await {
                error!(error = %e, "API server failed.");
                running.cancel();
            }
        });
    }
    tracker.close();
    info!("Started.");

    let mut sigint = unix::signal(SignalKind::interrupt())?;
    let mut sigterm = unix::signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = running.cancelled() => {},
    }

    trace!("Shutting down.");
    running.cancel();

    tracker.wait().await;
    info!("Exiting.");
    Ok(())
}
