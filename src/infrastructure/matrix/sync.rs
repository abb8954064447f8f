//! Long-poll sync loop feeding room messages to the OCR pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::client::MatrixClient;
use super::dto::{RoomEvent, SyncResponse};
use crate::application::use_cases::OcrEventHandler;
use crate::domain::entities::{EventId, IncomingEvent, MessageContent, RoomId};
use crate::domain::errors::ProtocolError;

const ROOM_MESSAGE: &str = "m.room.message";
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Sync loop settings.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// The bot's own user id, whose messages are ignored.
    pub user_id: String,
    /// Join rooms on invite.
    pub autojoin: bool,
    /// Server-side long-poll timeout.
    pub timeout: Duration,
}

/// Drives `/sync` and dispatches each room message to the handler.
pub struct SyncLoop {
    client: Arc<MatrixClient>,
    handler: OcrEventHandler,
    settings: SyncSettings,
}

impl SyncLoop {
    /// Creates a sync loop.
    #[must_use]
    pub const fn new(
        client: Arc<MatrixClient>,
        handler: OcrEventHandler,
        settings: SyncSettings,
    ) -> Self {
        Self {
            client,
            handler,
            settings,
        }
    }

    /// Runs until `shutdown` resolves, then waits for in-flight events.
    ///
    /// The first successful sync only establishes the starting position, so
    /// history from before startup is never processed.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        let mut since: Option<String> = None;
        let mut tasks = JoinSet::new();

        info!(user_id = %self.settings.user_id, "Starting sync loop");

        loop {
            let result = tokio::select! {
                () = &mut shutdown => break,
                result = self.client.sync(since.as_deref(), self.settings.timeout) => result,
            };

            while tasks.try_join_next().is_some() {}

            let sync = match result {
                Ok(sync) => sync,
                Err(e) => {
                    let delay = backoff(&e);
                    warn!(
                        error = %e,
                        transient = e.is_transient(),
                        delay = ?delay,
                        "Sync failed"
                    );
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let initial = since.is_none();
            since = Some(sync.next_batch.clone());

            if self.settings.autojoin {
                self.join_invites(&sync).await;
            }

            if initial {
                info!(since = ?since, "Initial sync complete, skipping history");
                continue;
            }

            for event in collect_events(sync, &self.settings.user_id) {
                let handler = self.handler.clone();
                tasks.spawn(async move { handler.handle(&event).await });
            }
        }

        info!(pending = tasks.len(), "Shutting down sync loop");
        while tasks.join_next().await.is_some() {}
    }

    async fn join_invites(&self, sync: &SyncResponse) {
        let Some(rooms) = &sync.rooms else {
            return;
        };

        for room_id in rooms.invite.keys() {
            let room_id = RoomId::new(room_id.clone());
            match self.client.join_room(&room_id).await {
                Ok(()) => info!(room_id = %room_id, "Accepted invite"),
                Err(e) => warn!(room_id = %room_id, error = %e, "Failed to join room"),
            }
        }
    }
}

fn backoff(error: &ProtocolError) -> Duration {
    match error {
        ProtocolError::RateLimited { retry_after_ms } => Duration::from_millis(*retry_after_ms),
        _ => ERROR_BACKOFF,
    }
}

/// Extracts room messages from a sync response, skipping the bot's own.
fn collect_events(sync: SyncResponse, own_user_id: &str) -> Vec<IncomingEvent> {
    let Some(rooms) = sync.rooms else {
        return Vec::new();
    };

    rooms
        .join
        .into_iter()
        .flat_map(|(room_id, room)| {
            let events = room.timeline.map(|t| t.events).unwrap_or_default();
            events.into_iter().map(move |event| (room_id.clone(), event))
        })
        .filter_map(|(room_id, event)| to_incoming(&room_id, event, own_user_id))
        .collect()
}

fn to_incoming(room_id: &str, event: RoomEvent, own_user_id: &str) -> Option<IncomingEvent> {
    if event.event_type != ROOM_MESSAGE {
        return None;
    }

    let sender = event.sender?;
    if sender == own_user_id {
        return None;
    }
    let event_id = event.event_id?;

    let content: MessageContent = match serde_json::from_value(event.content) {
        Ok(content) => content,
        Err(e) => {
            debug!(room_id, event_id = %event_id, error = %e, "Skipping malformed message content");
            return None;
        }
    };

    Some(IncomingEvent::new(
        RoomId::new(room_id),
        EventId::new(event_id),
        sender,
        content,
    ))
}
