//! Image message OCR pipeline.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::application::services::{MediaResolver, ResponseFormatter};
use crate::domain::entities::{EventId, IncomingEvent};
use crate::domain::errors::PipelineError;
use crate::domain::ports::{MessagingPort, OcrPort, Reply};

/// Reaction posted once processing of an image has started.
pub const ACKNOWLEDGEMENT_REACTION: &str = "👌";

/// Notice posted when an image arrives without attachment encryption.
pub const UNENCRYPTED_ROOM_WARNING: &str = "Note: You are sending message in an unencrypted room. \
     Please consider enabling end-to-end encryption in this room.";

/// The only notice users see when a pipeline fails.
pub const INTERNAL_ERROR_REPLY: &str = "Mathpix ocr bot encountered an internal error.";

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The event was not an image message.
    FilteredOut,
    /// The recognition result was posted.
    Completed,
    /// A stage failed and the error notice was posted (or attempted).
    Failed,
}

/// Runs OCR on image messages and replies with the result.
#[derive(Clone)]
pub struct OcrEventHandler {
    messaging: Arc<dyn MessagingPort>,
    ocr: Arc<dyn OcrPort>,
    resolver: MediaResolver,
    formatter: ResponseFormatter,
}

impl OcrEventHandler {
    /// Creates new handler.
    #[must_use]
    pub fn new(
        messaging: Arc<dyn MessagingPort>,
        ocr: Arc<dyn OcrPort>,
        formatter: ResponseFormatter,
    ) -> Self {
        Self {
            resolver: MediaResolver::new(messaging.clone()),
            messaging,
            ocr,
            formatter,
        }
    }

    /// Handles one room message. Never fails; failures are reported in the room.
    pub async fn handle(&self, event: &IncomingEvent) -> PipelineOutcome {
        if !event.content.is_image() {
            debug!(msgtype = %event.content.msgtype, "Ignoring non-image message");
            return PipelineOutcome::FilteredOut;
        }

        info!(
            room_id = %event.room_id,
            event_id = %event.event_id,
            sender = %event.sender,
            "Image message received"
        );

        if let Err(e) = self.messaging.mark_read(&event.room_id, &event.event_id).await {
            warn!(error = %e, event_id = %event.event_id, "Failed to mark event as read");
        }

        match self.run(event).await {
            Ok(()) => {
                info!(event_id = %event.event_id, "OCR result posted");
                PipelineOutcome::Completed
            }
            Err(e) => {
                error!(
                    error = %e,
                    stage = e.stage(),
                    event_id = %event.event_id,
                    "OCR pipeline failed"
                );
                self.report_failure(event).await;
                PipelineOutcome::Failed
            }
        }
    }

    async fn run(&self, event: &IncomingEvent) -> Result<(), PipelineError> {
        let media = self.resolver.resolve(&event.content).await?;

        if !media.encrypted {
            self.reply(event, Reply::text(UNENCRYPTED_ROOM_WARNING)).await?;
        }

        self.messaging
            .react(&event.room_id, &event.event_id, ACKNOWLEDGEMENT_REACTION)
            .await
            .map_err(PipelineError::Acknowledgement)?;

        debug!(size = media.bytes.len(), "Submitting image to OCR service");
        let result = self.ocr.post_image(media.bytes).await?;

        let mut posted = Vec::new();
        for body in self.formatter.format(&result) {
            match self.messaging.respond(&event.room_id, &Reply::html(body)).await {
                Ok(event_id) => posted.push(event_id),
                Err(e) => {
                    self.retract(event, &posted).await;
                    return Err(PipelineError::ReplyDelivery(e));
                }
            }
        }

        Ok(())
    }

    /// Redacts result messages already posted by this run.
    async fn retract(&self, event: &IncomingEvent, posted: &[EventId]) {
        for event_id in posted {
            if let Err(e) = self.messaging.redact(&event.room_id, event_id).await {
                warn!(error = %e, event_id = %event_id, "Failed to redact partial result");
            }
        }
    }

    async fn reply(&self, event: &IncomingEvent, reply: Reply) -> Result<(), PipelineError> {
        self.messaging
            .respond(&event.room_id, &reply)
            .await
            .map(|_| ())
            .map_err(PipelineError::ReplyDelivery)
    }

    async fn report_failure(&self, event: &IncomingEvent) {
        if let Err(e) = self
            .messaging
            .respond(&event.room_id, &Reply::text(INTERNAL_ERROR_REPLY))
            .await
        {
            error!(error = %e, event_id = %event.event_id, "Failed to deliver error notice");
        }
    }
}
