//! Long-polling runner: pulls updates through a teloxide dispatcher and feeds
//! them to [`InboundDispatch`]. Start/stop lifecycle with a bounded-wait
//! shutdown so process exit is never blocked on Telegram.

use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    dispatching::{Dispatcher, ShutdownToken, UpdateFilterExt},
    dptree,
    prelude::*,
    types::{CallbackQuery, Message as TgMessage, Update},
};
use tracing::{debug, info, warn};

use crate::dispatch::InboundDispatch;

/// How long a graceful stop may take before the polling task is aborted.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

/// Supervised background polling task.
pub struct Poller {
    handle: tokio::task::JoinHandle<()>,
    shutdown: ShutdownToken,
}

impl Poller {
    /// Spawns the polling loop. Messages and callback queries are routed to
    /// `dispatch`; every other update kind is skipped.
    pub fn start(bot: Bot, dispatch: Arc<InboundDispatch>) -> Self {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(
                |message: TgMessage, dispatch: Arc<InboundDispatch>| async move {
                    dispatch.handle_message(&message).await;
                    respond(())
                },
            ))
            .branch(Update::filter_callback_query().endpoint(
                |query: CallbackQuery, dispatch: Arc<InboundDispatch>| async move {
                    dispatch.handle_callback(&query).await;
                    respond(())
                },
            ));

        let mut dispatcher = Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![dispatch])
            .default_handler(|update| async move {
                debug!(update_id = ?update.id, "skipping unsupported update kind");
            })
            .build();

        let shutdown = dispatcher.shutdown_token();
        let handle = tokio::spawn(async move {
            dispatcher.dispatch().await;
        });

        info!("polling started");
        Self { handle, shutdown }
    }

    /// Requests a graceful stop and waits up to [`SHUTDOWN_WAIT`]; if the loop
    /// does not wind down in time it is aborted and we move on.
    pub async fn stop(self) {
        match self.shutdown.shutdown() {
            Ok(wait) => {
                if tokio::time::timeout(SHUTDOWN_WAIT, wait).await.is_err() {
                    warn!("polling did not stop in time, aborting the task");
                    self.handle.abort();
                }
            }
            Err(e) => {
                debug!(error = %e, "dispatcher was not running, aborting the task");
                self.handle.abort();
            }
        }
        info!("polling stopped");
    }
}
