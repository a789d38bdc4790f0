use anyhow::Result;
use async_trait::async_trait;

/// The bot's actual logic: turn one inbound message text into a reply.
///
/// Implementations are supplied by the embedding application and invoked at
/// most once per update, after mention stripping. A returned error is
/// absorbed by the dispatcher, which substitutes a generic fallback reply;
/// it never stops the bot.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, text: &str) -> Result<String>;
}

/// Adapter for bots whose logic is a plain function.
pub struct FnResponder<F>(pub F);

#[async_trait]
impl<F> Responder for FnResponder<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn respond(&self, text: &str) -> Result<String> {
        (self.0)(text)
    }
}
