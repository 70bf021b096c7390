//! Event classification: pulls a plain-text payload out of each inbound
//! event (directly, or through download + transcription for voice) and
//! hands it to the bridge.

use tracing::{debug, warn};

use {
    liaison_common::{EventOutcome, ReplyMessage},
    liaison_platform::InboundEvent,
    liaison_voice::{AudioFormat, TranscribeRequest},
};

use crate::state::AppState;

/// Canned reply for image attachments, the one user-visible error surface.
const IMAGE_REPLY: &str =
    "An image was received, but we are currently not prepared to process it.";

/// Process one inbound event to a terminal outcome. Never errors: anything
/// unexpected becomes a logged `Dropped` or `Ignored` outcome.
pub async fn dispatch_event(state: &AppState, event: &InboundEvent) -> EventOutcome {
    let Some(user_id) = event.user_id() else {
        warn!(kind = %event.kind, "event without a user id");
        return EventOutcome::Ignored;
    };
    let Some(reply_token) = event.reply_token.as_deref() else {
        warn!(user_id, kind = %event.kind, "event without a reply token");
        return EventOutcome::Ignored;
    };

    match event.kind.as_str() {
        "postback" => match &event.postback {
            Some(postback) => state.bridge.handle(user_id, &postback.data, reply_token).await,
            None => EventOutcome::Ignored,
        },
        "message" => {
            let Some(message) = &event.message else {
                return EventOutcome::Ignored;
            };
            match message.kind.as_str() {
                "text" => match message.text.as_deref() {
                    Some(text) => state.bridge.handle(user_id, text, reply_token).await,
                    None => EventOutcome::Ignored,
                },
                "image" => send_image_reply(state, reply_token).await,
                "audio" => handle_audio(state, user_id, &message.id, reply_token).await,
                other => {
                    debug!(user_id, message_type = other, "unsupported message type");
                    EventOutcome::Ignored
                },
            }
        },
        other => {
            debug!(user_id, event_type = other, "unsupported event type");
            EventOutcome::Ignored
        },
    }
}

async fn send_image_reply(state: &AppState, reply_token: &str) -> EventOutcome {
    let messages = [ReplyMessage::text(IMAGE_REPLY)];
    if let Err(err) = state.replies.send(reply_token, &messages).await {
        warn!(reply_token, error = %err, "failed to send image notice");
    }
    EventOutcome::Delivered { fragments: 1 }
}

/// Voice path: download the audio content, transcribe it, then treat the
/// transcript exactly like a typed text message.
async fn handle_audio(
    state: &AppState,
    user_id: &str,
    message_id: &str,
    reply_token: &str,
) -> EventOutcome {
    let Some(stt) = &state.stt else {
        warn!(user_id, "voice message received but transcription is not configured");
        return EventOutcome::dropped("transcription not configured");
    };

    let content = match state.platform.fetch_message_content(message_id).await {
        Ok(content) => content,
        Err(err) => {
            warn!(user_id, message_id, error = %err, "audio download failed");
            return EventOutcome::dropped("audio download failed");
        },
    };

    let format = AudioFormat::from_mime(content.content_type.as_deref().unwrap_or_default());
    let transcript = match stt
        .transcribe(TranscribeRequest {
            audio: content.bytes,
            format,
            language: None,
        })
        .await
    {
        Ok(transcript) => transcript,
        Err(err) => {
            warn!(user_id, message_id, error = %err, "transcription failed");
            return EventOutcome::dropped("transcription failed");
        },
    };

    debug!(user_id, text_len = transcript.text.len(), "voice message transcribed");
    state.bridge.handle(user_id, &transcript.text, reply_token).await
}
