//! Background consumer of the event bus.

use std::sync::Arc;

use orgnotify_core::event::NotificationEvent;
use tokio::sync::broadcast;

use crate::dispatcher::Dispatcher;

/// Feeds every published [`NotificationEvent`] to the [`Dispatcher`].
///
/// Events are handled one at a time; deliveries within an event run
/// concurrently inside the dispatcher.
pub struct NotificationWorker {
    dispatcher: Arc<Dispatcher>,
}

impl NotificationWorker {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run the dispatch loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<NotificationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.dispatcher.dispatch(&event).await {
                        tracing::error!(
                            error = %e,
                            organization_id = %event.organization_id,
                            datarequest_id = %event.datarequest_id,
                            kind = %event.kind,
                            "Failed to dispatch notifications",
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification worker lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification worker shutting down");
                    break;
                }
            }
        }
    }
}
