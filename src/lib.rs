//! A small long-polling Telegram bot. It keeps fetching new messages with
//! `getUpdates`, hands each one to a caller-supplied [`Responder`], and posts
//! the reply back with `sendMessage`.
//!
//! The bot is two concurrent stages joined by a bounded channel: a poller
//! that tracks the update cursor and classifies Telegram's answers, and a
//! dispatcher that invokes the responder and delivers replies. [`bot::run`]
//! wires them together and blocks until SIGINT/SIGTERM.

pub mod bot;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod poller;
pub mod responder;
pub mod telegram;

pub use bot::run;
pub use config::Config;
pub use error::FatalError;
pub use responder::{FnResponder, Responder};
