use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::responder::Responder;
use crate::telegram::{TelegramClient, Update};

/// Reply sent when the responder itself fails. The responder's error stays
/// local; the user only ever sees this text.
const FALLBACK_REPLY: &str = "I'm not able to answer :(";

/// Strip the first `@BotName` mention so `/cmd@BotName` and `/cmd` read the
/// same to the responder.
fn strip_mention(text: &str, bot_name: &str) -> String {
    text.replacen(&format!("@{bot_name}"), "", 1)
}

/// Produce the reply for one inbound text: strip the mention, ask the
/// responder, fall back when it fails.
async fn build_reply(responder: &dyn Responder, text: &str, bot_name: &str) -> String {
    let cleaned = strip_mention(text, bot_name);
    match responder.respond(&cleaned).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Responder failed: {e:#}");
            FALLBACK_REPLY.to_string()
        }
    }
}

/// Drain the update channel forever, posting one reply per update.
///
/// Returns only when the channel closes, which happens at teardown once the
/// poller is gone.
pub async fn run(config: Arc<Config>, responder: Arc<dyn Responder>, mut rx: mpsc::Receiver<Update>) {
    let client = TelegramClient::for_sending(&config);

    info!("Message handler is ready to answer");

    while let Some(update) = rx.recv().await {
        let message = update.message;
        info!(
            "Message: '{}' from: '{}'",
            message.text, message.chat.username
        );

        let answer = build_reply(responder.as_ref(), &message.text, &config.bot_name).await;

        // A failed send drops this reply and moves on: replies are delivered
        // at most once, never retried or re-queued.
        if let Err(e) = client.send_message(message.chat.id, &answer).await {
            warn!("Could not send reply: {e:#}");
            continue;
        }

        info!("Answer: '{}' to: '{}'", answer, message.from.username);
    }
}
