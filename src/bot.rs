use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::Config;
use crate::dispatcher;
use crate::error::FatalError;
use crate::poller;
use crate::responder::Responder;
use crate::telegram::Update;

/// How many updates the poller can run ahead of the dispatcher. Capacity 1
/// couples the poll rate directly to the dispatch rate.
const CHANNEL_CAPACITY: usize = 1;

/// Run the bot until a termination signal arrives or a fatal condition
/// surfaces from one of the stages.
///
/// On SIGINT/SIGTERM this returns `Ok(())` without cancelling the in-flight
/// stages; process exit reclaims them.
pub async fn run(config: Config, responder: Arc<dyn Responder>) -> Result<(), FatalError> {
    if config.api_key.is_empty() {
        return Err(FatalError::ApiKeyMissing);
    }
    if config.bot_name.is_empty() {
        return Err(FatalError::BotNameMissing);
    }

    info!("Working as: {}", config.bot_name);

    let config = Arc::new(config);
    let (tx, rx) = mpsc::channel::<Update>(CHANNEL_CAPACITY);

    let mut poll_task = tokio::spawn(poller::run(config.clone(), tx));
    let mut dispatch_task = tokio::spawn(dispatcher::run(config, responder, rx));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Exiting...");
            Ok(())
        }
        result = &mut poll_task => {
            let err = match result {
                Ok(Err(err)) => err,
                Ok(Ok(never)) => match never {},
                Err(e) => {
                    error!("Poller task failed: {e}");
                    FatalError::StageStopped("poller")
                }
            };
            error!("{err}");
            Err(err)
        }
        result = &mut dispatch_task => {
            if let Err(e) = result {
                error!("Dispatcher task failed: {e}");
            }
            Err(FatalError::StageStopped("dispatcher"))
        }
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
