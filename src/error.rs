use thiserror::Error;

/// Conditions whose only defined handling is stopping the whole bot.
///
/// These are returned as values from the poller or dispatcher task up to the
/// supervisor, which performs the actual shutdown. Everything recoverable
/// (network hiccups, malformed bodies, server-side outages, responder or
/// send failures) is logged where it happens and never leaves its loop.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("API Key not set, check your configuration")]
    ApiKeyMissing,

    #[error("Bot Name not set, check your configuration")]
    BotNameMissing,

    #[error("could not build poll request: {0}")]
    InvalidPollUrl(String),

    #[error("Telegram rejected the API Key, ask @BotFather for a new one")]
    BadCredential,

    #[error("unexpected Telegram API error {0}; the Bot API client may be out of date")]
    ApiMismatch(i64),

    #[error("update channel closed")]
    ChannelClosed,

    #[error("{0} stage stopped unexpectedly")]
    StageStopped(&'static str),
}
