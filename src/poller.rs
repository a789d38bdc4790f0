use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::FatalError;
use crate::telegram::{PollResponse, TelegramClient, Update};

/// Prefix of the HTML error page Telegram serves instead of a JSON envelope
/// when the bot token is rejected outright.
const HTML_ERROR_PREFIX: &str = "<!DOCTYPE html>";

/// How long to wait after a server-side (5xx) error before polling again.
const SERVER_ERROR_BACKOFF: Duration = Duration::from_secs(30);

/// What one poll response asks the loop to do next.
#[derive(Debug)]
enum PollOutcome {
    /// Updates to enqueue, in the order the server returned them.
    Deliver(Vec<Update>),
    /// Recoverable problem; poll again with the same offset.
    Retry,
    /// Server-side outage; wait before polling again.
    Backoff(Duration),
    /// No recovery defined; hand the error to the supervisor for shutdown.
    Fatal(FatalError),
}

/// Classify one raw `getUpdates` body.
fn classify_body(body: &str) -> PollOutcome {
    let response: PollResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            if body.starts_with(HTML_ERROR_PREFIX) {
                return PollOutcome::Fatal(FatalError::BadCredential);
            }
            warn!("Telegram JSON error: {e}");
            return PollOutcome::Retry;
        }
    };

    if !response.ok {
        return match response.error_code {
            401 | 403 => PollOutcome::Fatal(FatalError::BadCredential),
            400 | 404 => PollOutcome::Fatal(FatalError::ApiMismatch(response.error_code)),
            code if code >= 500 => {
                warn!("Telegram server error ({code})");
                PollOutcome::Backoff(SERVER_ERROR_BACKOFF)
            }
            code => {
                // No escalation defined for these; log and poll again.
                warn!("Unhandled Telegram error code {code}");
                PollOutcome::Retry
            }
        };
    }

    PollOutcome::Deliver(response.result)
}

/// Push every not-yet-seen update downstream and advance the cursor.
///
/// The cursor is the highest update id ever enqueued; anything at or below
/// it has been seen and is dropped. The send blocks while the dispatcher is
/// behind (the channel is bounded), which couples the poll rate to the
/// dispatch rate.
async fn enqueue_updates(
    updates: Vec<Update>,
    cursor: &mut i64,
    tx: &mpsc::Sender<Update>,
) -> Result<(), FatalError> {
    for update in updates {
        if update.update_id <= *cursor {
            debug!("Skipping already-seen update {}", update.update_id);
            continue;
        }
        let id = update.update_id;
        tx.send(update).await.map_err(|_| FatalError::ChannelClosed)?;
        *cursor = id;
    }
    Ok(())
}

/// Long-poll `getUpdates` forever, feeding new updates into the channel.
///
/// The loop never returns normally; every return value is a fatal condition
/// for the supervisor to act on. Transport and decode failures are retried
/// with the same offset, so nothing is enqueued twice for them.
pub async fn run(config: Arc<Config>, tx: mpsc::Sender<Update>) -> Result<Infallible, FatalError> {
    let client = TelegramClient::for_polling(&config);
    let timeout = config.poll_timeout();
    let mut cursor: i64 = 0;

    loop {
        let url = client.poll_url(cursor + 1, timeout)?;

        let response = match client.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not send poll request: {e}");
                continue;
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Malformed body from Telegram: {e}");
                continue;
            }
        };

        match classify_body(&body) {
            PollOutcome::Deliver(updates) => {
                if updates.is_empty() {
                    debug!("Poll returned no new updates");
                } else {
                    info!("Received {} update(s)", updates.len());
                }
                enqueue_updates(updates, &mut cursor, &tx).await?;
            }
            PollOutcome::Retry => {}
            PollOutcome::Backoff(delay) => tokio::time::sleep(delay).await,
            PollOutcome::Fatal(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::Message;

    fn update(id: i64) -> Update {
        Update {
            update_id: id,
            message: Message::default(),
        }
    }

    fn error_body(code: i64) -> String {
        format!(r#"{{"ok": false, "error_code": {code}}}"#)
    }

    #[test]
    fn test_classify_ok_batch() {
        let body = r#"{"ok": true, "result": [{"update_id": 5}, {"update_id": 7}]}"#;

        match classify_body(body) {
            PollOutcome::Deliver(updates) => {
                assert_eq!(updates.len(), 2);
                assert_eq!(updates[0].update_id, 5);
                assert_eq!(updates[1].update_id, 7);
            }
            other => panic!("expected Deliver, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_bad_credential() {
        for code in [401, 403] {
            assert!(matches!(
                classify_body(&error_body(code)),
                PollOutcome::Fatal(FatalError::BadCredential)
            ));
        }
    }

    #[test]
    fn test_classify_api_mismatch() {
        for code in [400, 404] {
            assert!(matches!(
                classify_body(&error_body(code)),
                PollOutcome::Fatal(FatalError::ApiMismatch(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_classify_server_error_backs_off() {
        assert!(matches!(
            classify_body(&error_body(503)),
            PollOutcome::Backoff(delay) if delay == SERVER_ERROR_BACKOFF
        ));
    }

    #[test]
    fn test_classify_unknown_code_retries() {
        assert!(matches!(
            classify_body(&error_body(420)),
            PollOutcome::Retry
        ));
    }

    #[test]
    fn test_classify_html_body_is_fatal() {
        let body = "<!DOCTYPE html><html><head><title>404</title></head></html>";

        assert!(matches!(
            classify_body(body),
            PollOutcome::Fatal(FatalError::BadCredential)
        ));
    }

    #[test]
    fn test_classify_garbage_retries() {
        assert!(matches!(classify_body("not json"), PollOutcome::Retry));
    }

    #[tokio::test]
    async fn test_enqueue_advances_cursor_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut cursor = 3;

        enqueue_updates(vec![update(5), update(7)], &mut cursor, &tx)
            .await
            .unwrap();

        assert_eq!(cursor, 7);
        assert_eq!(rx.recv().await.unwrap().update_id, 5);
        assert_eq!(rx.recv().await.unwrap().update_id, 7);
    }

    #[tokio::test]
    async fn test_enqueue_drops_already_seen() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut cursor = 10;

        enqueue_updates(vec![update(8), update(10), update(11)], &mut cursor, &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(cursor, 11);
        assert_eq!(rx.recv().await.unwrap().update_id, 11);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_repeated_batch_is_idempotent() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut cursor = 0;

        let batch = vec![update(1), update(2)];
        enqueue_updates(batch.clone(), &mut cursor, &tx).await.unwrap();
        enqueue_updates(batch, &mut cursor, &tx).await.unwrap();
        drop(tx);

        assert_eq!(cursor, 2);
        assert_eq!(rx.recv().await.unwrap().update_id, 1);
        assert_eq!(rx.recv().await.unwrap().update_id, 2);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_closed_channel_is_fatal() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut cursor = 0;

        let result = enqueue_updates(vec![update(1)], &mut cursor, &tx).await;

        assert!(matches!(result, Err(FatalError::ChannelClosed)));
        assert_eq!(cursor, 0);
    }
}
